//! QBJ Match document
//!
//! Mirrors the `Match` object of the quiz bowl schema
//! (https://schema.quizbowl.technology/match). Field names are part of the
//! interchange format and must not change.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub tossups_read: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overtime_tossups_read: Option<usize>,
    pub match_teams: Vec<MatchTeam>,
    pub match_questions: Vec<MatchQuestion>,
    /// Thrown out questions and protests, one per line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub name: String,
    pub players: Vec<Player>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchTeam {
    pub team: Team,
    pub bonus_points: i32,
    pub match_players: Vec<MatchPlayer>,
    /// Every lineup the team fielded, oldest first
    pub lineups: Vec<Lineup>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchPlayer {
    pub player: Player,
    pub tossups_heard: u32,
    pub answer_counts: Vec<PlayerAnswerCount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerAnswerCount {
    pub number: u32,
    pub answer: AnswerType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lineup {
    /// First question number this lineup heard
    pub first_question: usize,
    pub players: Vec<Player>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerType {
    /// Point value of the answer
    pub value: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchQuestion {
    /// The cycle number, starting at 1
    pub question_number: usize,
    pub tossup_question: Question,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replacement_tossup_question: Option<Question>,
    pub buzzes: Vec<MatchQuestionBuzz>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bonus: Option<MatchQuestionBonus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replacement_bonus: Option<MatchQuestionBonus>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    Tossup,
    Bonus,
    Lightning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// Number of the question in the packet
    pub question_number: u32,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    /// 1 for tossups, the part count for bonuses
    pub parts: u32,
}

impl Question {
    pub fn tossup(question_number: u32) -> Self {
        Self {
            question_number,
            question_type: QuestionType::Tossup,
            parts: 1,
        }
    }

    pub fn bonus(question_number: u32, parts: u32) -> Self {
        Self {
            question_number,
            question_type: QuestionType::Bonus,
            parts,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchQuestionBuzz {
    pub team: Team,
    pub player: Player,
    pub buzz_position: BuzzPosition,
    pub result: AnswerType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuzzPosition {
    /// 0-based word index
    pub word_index: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchQuestionBonus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<Question>,
    pub parts: Vec<MatchQuestionBonusPart>,
}

impl MatchQuestionBonus {
    pub fn total_points(&self) -> i32 {
        self.parts.iter().map(|p| p.controlled_points).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchQuestionBonusPart {
    pub controlled_points: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounceback_points: Option<i32>,
}
