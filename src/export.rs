//! Match export
//!
//! Ties the pipeline together: build the [`Roster`], replay the cycles,
//! then assemble and serialize the QBJ [`Match`] document.

use crate::model::MatchSnapshot;
use crate::qbj::{
    AnswerType, BuzzPosition, Lineup, Match, MatchPlayer, MatchQuestion, MatchQuestionBonus,
    MatchQuestionBonusPart, MatchQuestionBuzz, MatchTeam, Player, PlayerAnswerCount, Team,
};
use crate::reducer::{reduce_cycles, Reduction};
use crate::roster::{PlayerId, Roster, TeamId};
use std::fmt;
use thiserror::Error;

/// Number of parts in a bonus unless configured otherwise
pub const DEFAULT_BONUS_PARTS: u32 = 3;

/// Configuration for an export
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Fail instead of skipping references to unknown teams or players
    pub strict: bool,
    /// Pretty-print the serialized document
    pub pretty: bool,
    /// Parts per bonus
    pub bonus_parts: u32,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            strict: false,
            pretty: false,
            bonus_parts: DEFAULT_BONUS_PARTS,
        }
    }
}

impl ExportOptions {
    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    pub fn pretty(mut self) -> Self {
        self.pretty = true;
        self
    }

    pub fn with_bonus_parts(mut self, parts: u32) -> Self {
        self.bonus_parts = parts;
        self
    }
}

/// What kind of event carried a reference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    Leave,
    Join,
    Substitution,
    Buzz,
    Bonus,
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ReferenceKind::Leave => "leave",
            ReferenceKind::Join => "join",
            ReferenceKind::Substitution => "substitution",
            ReferenceKind::Buzz => "buzz",
            ReferenceKind::Bonus => "bonus",
        };
        f.write_str(label)
    }
}

/// A reference in the snapshot that could not be applied.
///
/// `question` is the 1-based cycle number the reference appeared in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportWarning {
    UnrosteredPlayer {
        team: String,
        player: String,
    },
    UnknownTeam {
        question: usize,
        team: String,
        kind: ReferenceKind,
    },
    UnknownPlayer {
        question: usize,
        team: String,
        player: String,
        kind: ReferenceKind,
    },
    PlayerNotInLineup {
        question: usize,
        team: String,
        player: String,
    },
    BonusWithoutCorrectBuzz {
        question: usize,
    },
}

impl fmt::Display for ExportWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportWarning::UnrosteredPlayer { team, player } => {
                write!(f, "Player '{player}' is on team '{team}', which is not in the match")
            }
            ExportWarning::UnknownTeam { question, team, kind } => {
                write!(f, "Question {question}: {kind} references unknown team '{team}'")
            }
            ExportWarning::UnknownPlayer {
                question,
                team,
                player,
                kind,
            } => write!(
                f,
                "Question {question}: {kind} references unknown player '{player}' on team '{team}'"
            ),
            ExportWarning::PlayerNotInLineup {
                question,
                team,
                player,
            } => write!(
                f,
                "Question {question}: '{player}' left team '{team}' but was not in its lineup"
            ),
            ExportWarning::BonusWithoutCorrectBuzz { question } => {
                write!(f, "Question {question}: bonus answer without a correct buzz ignored")
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to serialize match: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("{} malformed reference(s) in match, first: {}", .0.len(), first_warning(.0))]
    MalformedReferences(Vec<ExportWarning>),
}

fn first_warning(warnings: &[ExportWarning]) -> String {
    warnings.first().map(ToString::to_string).unwrap_or_default()
}

/// An assembled document plus anything that was skipped building it
#[derive(Debug, Clone)]
pub struct MatchExport {
    pub document: Match,
    pub warnings: Vec<ExportWarning>,
}

impl MatchExport {
    pub fn to_json(&self, pretty: bool) -> Result<String, ExportError> {
        serialize_match(&self.document, pretty)
    }
}

/// Convert a match to a compact QBJ document with default options.
pub fn to_qbj(snapshot: &MatchSnapshot) -> Result<String, ExportError> {
    export_to_string(snapshot, &ExportOptions::default())
}

/// Convert a match to a QBJ document, honoring `options.pretty`.
pub fn export_to_string(snapshot: &MatchSnapshot, options: &ExportOptions) -> Result<String, ExportError> {
    export_match(snapshot, options)?.to_json(options.pretty)
}

/// Build the QBJ document for a match.
///
/// In strict mode any malformed reference fails the export; otherwise each
/// one is logged and returned alongside the document.
pub fn export_match(snapshot: &MatchSnapshot, options: &ExportOptions) -> Result<MatchExport, ExportError> {
    let (mut roster, mut warnings) = Roster::from_snapshot(snapshot);
    let mut reduction = reduce_cycles(&mut roster, &snapshot.cycles, options);
    warnings.append(&mut reduction.warnings);

    if options.strict && !warnings.is_empty() {
        return Err(ExportError::MalformedReferences(warnings));
    }
    for warning in &warnings {
        log::warn!("{}", warning);
    }

    Ok(MatchExport {
        document: assemble(&roster, reduction),
        warnings,
    })
}

pub fn serialize_match(document: &Match, pretty: bool) -> Result<String, ExportError> {
    let json = if pretty {
        serde_json::to_string_pretty(document)?
    } else {
        serde_json::to_string(document)?
    };
    Ok(json)
}

/// Package the final roster aggregates and question records as a `Match`.
pub fn assemble(roster: &Roster, reduction: Reduction) -> Match {
    let teams: Vec<Team> = roster.team_ids().map(|id| qbj_team(roster, id)).collect();

    let match_teams = roster
        .teams()
        .zip(&teams)
        .map(|((_, entry), team)| MatchTeam {
            team: team.clone(),
            bonus_points: entry.bonus_points,
            match_players: entry
                .players
                .iter()
                .map(|id| qbj_match_player(roster, *id))
                .collect(),
            lineups: entry
                .lineups
                .entries()
                .iter()
                .map(|lineup| Lineup {
                    first_question: lineup.first_question,
                    players: lineup.players.iter().map(|id| qbj_player(roster, *id)).collect(),
                })
                .collect(),
        })
        .collect();

    let tossups_read = reduction.tossups_read();
    let match_questions = reduction
        .questions
        .into_iter()
        .map(|question| MatchQuestion {
            question_number: question.question_number,
            tossup_question: question.tossup,
            replacement_tossup_question: question.replacement_tossup,
            buzzes: question
                .buzzes
                .into_iter()
                .map(|buzz| MatchQuestionBuzz {
                    team: teams[buzz.team.index()].clone(),
                    player: Player {
                        name: buzz.player_name,
                    },
                    buzz_position: BuzzPosition {
                        word_index: buzz.word_index,
                    },
                    result: AnswerType { value: buzz.points },
                })
                .collect(),
            bonus: question.bonus.map(|bonus| MatchQuestionBonus {
                question: Some(bonus.question),
                parts: bonus
                    .parts
                    .into_iter()
                    .map(|points| MatchQuestionBonusPart {
                        controlled_points: points,
                        bounceback_points: None,
                    })
                    .collect(),
            }),
            replacement_bonus: None,
        })
        .collect();

    let notes = if reduction.notes.is_empty() {
        None
    } else {
        Some(reduction.notes.join("\n"))
    };

    Match {
        tossups_read,
        overtime_tossups_read: None,
        match_teams,
        match_questions,
        notes,
    }
}

fn qbj_team(roster: &Roster, id: TeamId) -> Team {
    let entry = roster.team(id);
    Team {
        name: entry.name.clone(),
        players: entry.players.iter().map(|p| qbj_player(roster, *p)).collect(),
    }
}

fn qbj_player(roster: &Roster, id: PlayerId) -> Player {
    Player {
        name: roster.player(id).name.clone(),
    }
}

fn qbj_match_player(roster: &Roster, id: PlayerId) -> MatchPlayer {
    let player = roster.player(id);
    MatchPlayer {
        player: qbj_player(roster, id),
        tossups_heard: player.tossups_heard,
        answer_counts: player
            .answer_counts
            .iter()
            .map(|count| PlayerAnswerCount {
                number: count.number,
                answer: AnswerType { value: count.value },
            })
            .collect(),
    }
}
