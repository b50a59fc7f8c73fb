//! Cycle replay
//!
//! Walks the match one cycle at a time, in question order, updating lineups,
//! tossups heard, answer counts and bonus points on the [`Roster`], and
//! producing one [`QuestionRecord`] per cycle plus the notes log.
//!
//! Within a cycle the steps run in a fixed order:
//! 1. roster changes (leaves, joins, substitutions)
//! 2. tossups heard for the lineup now in effect
//! 3. thrown out tossups, then thrown out bonuses
//! 4. wrong buzzes, then the correct buzz and its bonus
//! 5. tossup protests, then bonus protests

use crate::export::{ExportOptions, ExportWarning, ReferenceKind};
use crate::model::{BonusAnswer, Buzz, Cycle};
use crate::qbj::Question;
use crate::roster::{PlayerId, Roster, TeamId};
use std::collections::BTreeMap;

/// A buzz resolved against the roster
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuzzRecord {
    pub team: TeamId,
    pub player_name: String,
    pub word_index: u32,
    pub points: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BonusRecord {
    pub question: Question,
    /// Controlled points per part, indexed by part
    pub parts: Vec<i32>,
}

impl BonusRecord {
    pub fn total(&self) -> i32 {
        self.parts.iter().sum()
    }
}

/// Everything recorded for one cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionRecord {
    /// 1-based cycle number
    pub question_number: usize,
    pub tossup: Question,
    pub replacement_tossup: Option<Question>,
    pub buzzes: Vec<BuzzRecord>,
    pub bonus: Option<BonusRecord>,
}

/// Result of replaying every cycle
#[derive(Debug, Clone, Default)]
pub struct Reduction {
    pub questions: Vec<QuestionRecord>,
    pub notes: Vec<String>,
    pub warnings: Vec<ExportWarning>,
}

impl Reduction {
    pub fn tossups_read(&self) -> usize {
        self.questions.len()
    }
}

/// Replay `cycles` in order against `roster`.
pub fn reduce_cycles(roster: &mut Roster, cycles: &[Cycle], options: &ExportOptions) -> Reduction {
    let mut reduction = Reduction::default();
    let mut tossup_number = 1;

    for (index, cycle) in cycles.iter().enumerate() {
        let (question, next_tossup_number) =
            reduce_cycle(roster, &mut reduction, index, cycle, tossup_number, options);
        log::debug!(
            "Question {}: tossup {}, {} buzzes, bonus {}",
            question.question_number,
            question.tossup.question_number,
            question.buzzes.len(),
            question.bonus.as_ref().map_or(0, BonusRecord::total)
        );
        reduction.questions.push(question);
        tossup_number = next_tossup_number;
    }

    reduction
}

/// Apply one cycle. Takes the tossup number the cycle starts from and
/// returns the cycle's record together with the number the next cycle
/// starts from.
pub fn reduce_cycle(
    roster: &mut Roster,
    reduction: &mut Reduction,
    index: usize,
    cycle: &Cycle,
    tossup_number: u32,
    options: &ExportOptions,
) -> (QuestionRecord, u32) {
    let question_number = index + 1;

    if cycle.has_roster_changes() {
        apply_roster_changes(roster, cycle, question_number, &mut reduction.warnings);
    }
    credit_tossups_heard(roster);

    let (tossup_number, replacement_tossup) =
        throw_out_tossups(cycle, tossup_number, &mut reduction.notes);
    throw_out_bonuses(cycle, &mut reduction.notes);

    let mut question = QuestionRecord {
        question_number,
        tossup: Question::tossup(tossup_number),
        replacement_tossup,
        buzzes: Vec::new(),
        bonus: None,
    };

    for buzz in &cycle.wrong_buzzes {
        if let Some(record) = record_buzz(roster, buzz, question_number, &mut reduction.warnings) {
            question.buzzes.push(record);
        }
    }

    match &cycle.correct_buzz {
        Some(buzz) => {
            if let Some(record) = record_buzz(roster, buzz, question_number, &mut reduction.warnings) {
                question.buzzes.push(record);
                if let Some(answer) = &cycle.bonus_answer {
                    question.bonus = Some(score_bonus(
                        roster,
                        answer,
                        options.bonus_parts,
                        question_number,
                        &mut reduction.warnings,
                    ));
                }
            }
        }
        None => {
            if cycle.bonus_answer.is_some() {
                reduction
                    .warnings
                    .push(ExportWarning::BonusWithoutCorrectBuzz { question: question_number });
            }
        }
    }

    record_protests(cycle, &mut reduction.notes);

    (question, tossup_number + 1)
}

/// Apply every leave, join and substitution in the cycle, then record one
/// new lineup per team that changed.
///
/// Changes to the same team accumulate on a working copy of its current
/// lineup so only the final state is recorded.
pub fn apply_roster_changes(
    roster: &mut Roster,
    cycle: &Cycle,
    question_number: usize,
    warnings: &mut Vec<ExportWarning>,
) {
    let mut working: BTreeMap<TeamId, Vec<PlayerId>> = BTreeMap::new();

    for leave in &cycle.player_leaves {
        let player = &leave.out_player;
        let Some(team) = resolve_team(roster, &player.team_name, ReferenceKind::Leave, question_number, warnings)
        else {
            continue;
        };
        let lineup = working
            .entry(team)
            .or_insert_with(|| roster.team(team).lineups.current().players.clone());
        if !remove_from_lineup(roster, lineup, team, &player.name) {
            warnings.push(ExportWarning::PlayerNotInLineup {
                question: question_number,
                team: player.team_name.clone(),
                player: player.name.clone(),
            });
        }
    }

    for join in &cycle.player_joins {
        let player = &join.in_player;
        let Some(team) = resolve_team(roster, &player.team_name, ReferenceKind::Join, question_number, warnings)
        else {
            continue;
        };
        let id = roster.register_player(team, &player.name);
        let lineup = working
            .entry(team)
            .or_insert_with(|| roster.team(team).lineups.current().players.clone());
        if !lineup.contains(&id) {
            lineup.push(id);
        }
    }

    for sub in &cycle.subs {
        let Some(team) = resolve_team(
            roster,
            &sub.in_player.team_name,
            ReferenceKind::Substitution,
            question_number,
            warnings,
        ) else {
            continue;
        };
        let id = roster.register_player(team, &sub.in_player.name);
        let lineup = working
            .entry(team)
            .or_insert_with(|| roster.team(team).lineups.current().players.clone());
        if !remove_from_lineup(roster, lineup, team, &sub.out_player.name) {
            warnings.push(ExportWarning::PlayerNotInLineup {
                question: question_number,
                team: sub.in_player.team_name.clone(),
                player: sub.out_player.name.clone(),
            });
        }
        if !lineup.contains(&id) {
            lineup.push(id);
        }
    }

    for (team, players) in working {
        log::debug!(
            "Question {}: new lineup for '{}' ({} players)",
            question_number,
            roster.team(team).name,
            players.len()
        );
        roster.team_mut(team).lineups.record(question_number, players);
    }
}

/// Credit a tossup heard to everyone in the lineup now in effect.
///
/// Runs after [`apply_roster_changes`], so a player who left this cycle is
/// not credited and one who entered is.
pub fn credit_tossups_heard(roster: &mut Roster) {
    roster.credit_current_lineups();
}

/// Log each thrown out tossup and advance the tossup number past it.
///
/// Returns the advanced number and the replacement tossup; with several
/// throw-outs in one cycle only the last replacement is kept.
pub fn throw_out_tossups(
    cycle: &Cycle,
    mut tossup_number: u32,
    notes: &mut Vec<String>,
) -> (u32, Option<Question>) {
    let mut replacement = None;
    for thrown_out in &cycle.thrown_out_tossups {
        notes.push(format!(
            "Tossup thrown out on question {}",
            thrown_out.question_index + 1
        ));
        tossup_number += 1;
        replacement = Some(Question::tossup(tossup_number));
    }
    (tossup_number, replacement)
}

/// Log each thrown out bonus. Replacement bonuses are not tracked.
pub fn throw_out_bonuses(cycle: &Cycle, notes: &mut Vec<String>) {
    for thrown_out in &cycle.thrown_out_bonuses {
        notes.push(format!(
            "Bonus thrown out on question {}",
            thrown_out.question_index + 1
        ));
    }
}

/// Resolve a buzz and count it in the player's answer buckets.
///
/// Returns `None` when the buzzing team is not in the match. An unknown
/// player on a known team still produces a record, but nothing is counted.
pub fn record_buzz(
    roster: &mut Roster,
    buzz: &Buzz,
    question_number: usize,
    warnings: &mut Vec<ExportWarning>,
) -> Option<BuzzRecord> {
    let player = &buzz.player;
    let team = resolve_team(roster, &player.team_name, ReferenceKind::Buzz, question_number, warnings)?;

    match roster.player_id(team, &player.name) {
        Some(id) => roster.player_mut(id).record_answer(buzz.points),
        None => warnings.push(ExportWarning::UnknownPlayer {
            question: question_number,
            team: player.team_name.clone(),
            player: player.name.clone(),
            kind: ReferenceKind::Buzz,
        }),
    }

    Some(BuzzRecord {
        team,
        player_name: player.name.clone(),
        word_index: buzz.position,
        points: buzz.points,
    })
}

/// Score a bonus part by part and credit the total to the receiving team.
pub fn score_bonus(
    roster: &mut Roster,
    answer: &BonusAnswer,
    part_count: u32,
    question_number: usize,
    warnings: &mut Vec<ExportWarning>,
) -> BonusRecord {
    let parts: Vec<i32> = (0..part_count)
        .map(|index| {
            answer
                .correct_parts
                .iter()
                .find(|part| part.index == index)
                .map_or(0, |part| part.points)
        })
        .collect();

    let record = BonusRecord {
        question: Question::bonus(answer.bonus_index + 1, part_count),
        parts,
    };

    if let Some(team) = resolve_team(
        roster,
        &answer.receiving_team_name,
        ReferenceKind::Bonus,
        question_number,
        warnings,
    ) {
        roster.team_mut(team).bonus_points += record.total();
    }

    record
}

/// Log tossup protests, then bonus protests.
pub fn record_protests(cycle: &Cycle, notes: &mut Vec<String>) {
    for protest in &cycle.tossup_protests {
        notes.push(format!(
            "Tossup protest on question {}. Team \"{}\" protested because of this reason: \"{}\".",
            protest.question_index + 1,
            protest.team_name,
            protest.reason
        ));
    }

    for protest in &cycle.bonus_protests {
        notes.push(format!(
            "Bonus protest on question {}. Team \"{}\" protested part {} because of this reason: \"{}\".",
            protest.question_index + 1,
            protest.team_name,
            protest.part_index + 1,
            protest.reason
        ));
    }
}

fn resolve_team(
    roster: &Roster,
    name: &str,
    kind: ReferenceKind,
    question_number: usize,
    warnings: &mut Vec<ExportWarning>,
) -> Option<TeamId> {
    let team = roster.team_id(name);
    if team.is_none() {
        warnings.push(ExportWarning::UnknownTeam {
            question: question_number,
            team: name.to_string(),
            kind,
        });
    }
    team
}

/// Remove the named team member from `lineup`. False if they were not in it.
fn remove_from_lineup(roster: &Roster, lineup: &mut Vec<PlayerId>, team: TeamId, name: &str) -> bool {
    let Some(id) = roster.player_id(team, name) else {
        return false;
    };
    let before = lineup.len();
    lineup.retain(|p| *p != id);
    lineup.len() != before
}
