//! Input snapshot of a recorded match
//!
//! These types are a read-only view of what the scorekeeping application
//! recorded: the teams, the players, and one [`Cycle`] per question slot.
//! Every per-cycle list is optional in the source data and defaults to
//! empty when loading from JSON.

use serde::Deserialize;

/// A frozen view of one match, ready for export.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchSnapshot {
    /// Team names, in display order (unique within the match)
    pub team_names: Vec<String>,
    /// Every player known before the match started
    #[serde(default)]
    pub players: Vec<Player>,
    /// One cycle per question slot, in question order
    #[serde(default)]
    pub cycles: Vec<Cycle>,
}

/// A player as recorded by the scorekeeper.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub name: String,
    pub team_name: String,
    #[serde(default)]
    pub is_starter: bool,
}

impl Player {
    pub fn new(name: &str, team_name: &str, is_starter: bool) -> Self {
        Self {
            name: name.to_string(),
            team_name: team_name.to_string(),
            is_starter,
        }
    }
}

/// Everything that happened during one question slot.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Cycle {
    pub player_leaves: Vec<PlayerLeave>,
    pub player_joins: Vec<PlayerJoin>,
    pub subs: Vec<Substitution>,
    pub thrown_out_tossups: Vec<ThrownOutQuestion>,
    pub thrown_out_bonuses: Vec<ThrownOutQuestion>,
    pub wrong_buzzes: Vec<Buzz>,
    pub correct_buzz: Option<Buzz>,
    pub bonus_answer: Option<BonusAnswer>,
    pub tossup_protests: Vec<TossupProtest>,
    pub bonus_protests: Vec<BonusProtest>,
}

impl Cycle {
    /// True if this cycle changes any team's lineup.
    pub fn has_roster_changes(&self) -> bool {
        !self.player_leaves.is_empty() || !self.player_joins.is_empty() || !self.subs.is_empty()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerLeave {
    pub out_player: Player,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerJoin {
    pub in_player: Player,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Substitution {
    pub in_player: Player,
    pub out_player: Player,
}

/// A question excluded from scoring. `question_index` is 0-based.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThrownOutQuestion {
    pub question_index: usize,
}

/// A player's buzz on a tossup.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Buzz {
    pub player: Player,
    /// Word index in the tossup where the buzz happened (0-based)
    pub position: u32,
    /// Points awarded: positive for a get, negative for a neg, 0 for no penalty
    pub points: i32,
}

/// Parts of a bonus the receiving team answered correctly.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BonusAnswer {
    pub receiving_team_name: String,
    /// 0-based index of the bonus in the packet
    pub bonus_index: u32,
    #[serde(default)]
    pub correct_parts: Vec<CorrectBonusPart>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrectBonusPart {
    pub index: u32,
    pub points: i32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TossupProtest {
    pub question_index: usize,
    pub team_name: String,
    pub reason: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BonusProtest {
    pub question_index: usize,
    pub team_name: String,
    pub part_index: u32,
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_fields_default_to_empty() {
        let cycle: Cycle = serde_json::from_str("{}").unwrap();
        assert!(cycle.wrong_buzzes.is_empty());
        assert!(cycle.correct_buzz.is_none());
        assert!(cycle.bonus_answer.is_none());
        assert!(!cycle.has_roster_changes());
    }

    #[test]
    fn test_parse_snapshot() {
        let json = r#"{
            "teamNames": ["Alpha", "Beta"],
            "players": [
                {"name": "Ann", "teamName": "Alpha", "isStarter": true},
                {"name": "Bob", "teamName": "Beta"}
            ],
            "cycles": [
                {"correctBuzz": {"player": {"name": "Ann", "teamName": "Alpha"}, "position": 12, "points": 10}}
            ]
        }"#;
        let snapshot: MatchSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.team_names, vec!["Alpha", "Beta"]);
        assert!(snapshot.players[0].is_starter);
        assert!(!snapshot.players[1].is_starter);

        let buzz = snapshot.cycles[0].correct_buzz.as_ref().unwrap();
        assert_eq!(buzz.player.name, "Ann");
        assert_eq!(buzz.position, 12);
        assert_eq!(buzz.points, 10);
    }
}
