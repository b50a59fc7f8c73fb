//! Box score computed from an exported match
//!
//! Works on the QBJ document rather than on the snapshot, so any file
//! following the schema can be summarized.

use crate::qbj::{Match, MatchQuestion, MatchQuestionBonus};
use std::collections::{BTreeMap, HashMap};

/// One player's line in the box score
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerLine {
    pub team: String,
    pub name: String,
    pub tossups_heard: u32,
    /// Number of answers per point value
    pub answers: BTreeMap<i32, u32>,
}

impl PlayerLine {
    pub fn tossup_points(&self) -> i32 {
        self.answers
            .iter()
            .map(|(value, number)| value * *number as i32)
            .sum()
    }

    /// Answers worth points
    pub fn gets(&self) -> u32 {
        self.answers.iter().filter(|(v, _)| **v > 0).map(|(_, n)| n).sum()
    }

    /// Answers that lost points
    pub fn negs(&self) -> u32 {
        self.answers.iter().filter(|(v, _)| **v < 0).map(|(_, n)| n).sum()
    }
}

/// One team's line in the box score
#[derive(Debug, Clone, PartialEq)]
pub struct TeamLine {
    pub name: String,
    pub tossup_points: i32,
    pub bonus_points: i32,
    pub bonuses_heard: u32,
}

impl TeamLine {
    pub fn total(&self) -> i32 {
        self.tossup_points + self.bonus_points
    }

    /// Points per bonus heard, 0 when no bonuses were heard
    pub fn points_per_bonus(&self) -> f64 {
        if self.bonuses_heard == 0 {
            0.0
        } else {
            self.bonus_points as f64 / self.bonuses_heard as f64
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoxScore {
    pub tossups_read: usize,
    pub teams: Vec<TeamLine>,
    pub players: Vec<PlayerLine>,
}

impl BoxScore {
    /// Every point value that appears in any player's answers, ascending
    pub fn answer_values(&self) -> Vec<i32> {
        let mut values: Vec<i32> = self
            .players
            .iter()
            .flat_map(|p| p.answers.keys().copied())
            .collect();
        values.sort_unstable();
        values.dedup();
        values
    }
}

/// Tally a box score for a match.
///
/// A bonus is credited, points and heard alike, to the team whose player
/// answered the tossup. The document's per-team `bonus_points` is not read,
/// so a bonus recorded for some other team cannot split its points from its
/// heard count. A bonus with no correct buzz on its question is not counted.
pub fn box_score(document: &Match) -> BoxScore {
    let mut bonuses: HashMap<&str, (u32, i32)> = HashMap::new();
    for question in &document.match_questions {
        if let Some((team, bonus)) = controlled_bonus(question) {
            let entry = bonuses.entry(team).or_insert((0, 0));
            entry.0 += 1;
            entry.1 += bonus.total_points();
        }
    }

    let mut teams = Vec::new();
    let mut players = Vec::new();
    for match_team in &document.match_teams {
        let name = &match_team.team.name;
        let mut tossup_points = 0;

        for match_player in &match_team.match_players {
            let mut answers = BTreeMap::new();
            for count in &match_player.answer_counts {
                *answers.entry(count.answer.value).or_insert(0) += count.number;
            }
            let line = PlayerLine {
                team: name.clone(),
                name: match_player.player.name.clone(),
                tossups_heard: match_player.tossups_heard,
                answers,
            };
            tossup_points += line.tossup_points();
            players.push(line);
        }

        let (bonuses_heard, bonus_points) = bonuses.get(name.as_str()).copied().unwrap_or((0, 0));
        teams.push(TeamLine {
            name: name.clone(),
            tossup_points,
            bonus_points,
            bonuses_heard,
        });
    }

    BoxScore {
        tossups_read: document.tossups_read,
        teams,
        players,
    }
}

/// A question's bonus with the team that earned it: whoever answered the tossup.
fn controlled_bonus(question: &MatchQuestion) -> Option<(&str, &MatchQuestionBonus)> {
    let bonus = question.bonus.as_ref()?;
    question
        .buzzes
        .iter()
        .rev()
        .find(|buzz| buzz.result.value > 0)
        .map(|buzz| (buzz.team.name.as_str(), bonus))
}
