//! Roster initialization and the player/team arena
//!
//! Teams and players are stored in index-addressed tables and referred to
//! by [`TeamId`] / [`PlayerId`]. Names are only used once, to resolve the
//! references that appear in the snapshot.

use crate::export::ExportWarning;
use crate::model::MatchSnapshot;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TeamId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlayerId(usize);

impl TeamId {
    /// Position of the team in match order
    pub fn index(self) -> usize {
        self.0
    }
}

/// Number of times a player gave an answer worth `value` points
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerCount {
    pub value: i32,
    pub number: u32,
}

/// Per-player aggregates accumulated while replaying cycles
#[derive(Debug, Clone)]
pub struct PlayerEntry {
    pub name: String,
    pub team: TeamId,
    pub tossups_heard: u32,
    /// Buckets in the order each point value was first seen
    pub answer_counts: Vec<AnswerCount>,
}

impl PlayerEntry {
    fn new(name: &str, team: TeamId) -> Self {
        Self {
            name: name.to_string(),
            team,
            tossups_heard: 0,
            answer_counts: Vec::new(),
        }
    }

    /// Count one answer worth `value` points.
    pub fn record_answer(&mut self, value: i32) {
        match self.answer_counts.iter_mut().find(|c| c.value == value) {
            Some(count) => count.number += 1,
            None => self.answer_counts.push(AnswerCount { value, number: 1 }),
        }
    }
}

/// The players on the floor for a team, starting at `first_question`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineupSnapshot {
    pub first_question: usize,
    pub players: Vec<PlayerId>,
}

/// Append-only record of every lineup a team fielded.
///
/// Entries are strictly ordered by `first_question` and the first entry
/// always starts at question 1.
#[derive(Debug, Clone)]
pub struct LineupHistory {
    entries: Vec<LineupSnapshot>,
}

impl LineupHistory {
    fn new(starters: Vec<PlayerId>) -> Self {
        Self {
            entries: vec![LineupSnapshot {
                first_question: 1,
                players: starters,
            }],
        }
    }

    /// The lineup currently in effect.
    pub fn current(&self) -> &LineupSnapshot {
        // never empty: created with the starting lineup
        &self.entries[self.entries.len() - 1]
    }

    /// Record the lineup that takes effect at `first_question`.
    ///
    /// A lineup that never heard a question (same `first_question` as the
    /// new one) is superseded instead of kept alongside it.
    pub fn record(&mut self, first_question: usize, players: Vec<PlayerId>) {
        if self.current().first_question >= first_question {
            self.entries.pop();
        }
        self.entries.push(LineupSnapshot {
            first_question,
            players,
        });
    }

    pub fn entries(&self) -> &[LineupSnapshot] {
        &self.entries
    }
}

#[derive(Debug, Clone)]
pub struct TeamEntry {
    pub name: String,
    /// Everyone on the team, in the order they were registered
    pub players: Vec<PlayerId>,
    pub bonus_points: i32,
    pub lineups: LineupHistory,
}

/// Teams, players and their running aggregates for one export.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    teams: Vec<TeamEntry>,
    players: Vec<PlayerEntry>,
    team_index: HashMap<String, TeamId>,
    player_index: HashMap<(TeamId, String), PlayerId>,
}

impl Roster {
    /// Build teams, players and starting lineups from the snapshot.
    ///
    /// Every player gets an entry, starters or not. Starters make up the
    /// first lineup of their team in the order they appear in the snapshot.
    /// Players naming a team that is not in the match are left out and
    /// reported.
    pub fn from_snapshot(snapshot: &MatchSnapshot) -> (Self, Vec<ExportWarning>) {
        let mut roster = Roster::default();
        let mut warnings = Vec::new();
        let mut starters: HashMap<TeamId, Vec<PlayerId>> = HashMap::new();

        for name in &snapshot.team_names {
            if roster.team_index.contains_key(name) {
                log::warn!("Duplicate team name '{}' ignored", name);
                continue;
            }
            let id = TeamId(roster.teams.len());
            roster.team_index.insert(name.clone(), id);
            roster.teams.push(TeamEntry {
                name: name.clone(),
                players: Vec::new(),
                bonus_points: 0,
                lineups: LineupHistory::new(Vec::new()),
            });
        }

        for player in &snapshot.players {
            let Some(team) = roster.team_id(&player.team_name) else {
                warnings.push(ExportWarning::UnrosteredPlayer {
                    team: player.team_name.clone(),
                    player: player.name.clone(),
                });
                continue;
            };
            let id = roster.register_player(team, &player.name);
            if player.is_starter {
                let lineup = starters.entry(team).or_default();
                if !lineup.contains(&id) {
                    lineup.push(id);
                }
            }
        }

        for (team, players) in starters {
            roster.teams[team.0].lineups = LineupHistory::new(players);
        }

        log::debug!(
            "Roster initialized: {} teams, {} players",
            roster.teams.len(),
            roster.players.len()
        );
        (roster, warnings)
    }

    pub fn team_id(&self, name: &str) -> Option<TeamId> {
        self.team_index.get(name).copied()
    }

    pub fn player_id(&self, team: TeamId, name: &str) -> Option<PlayerId> {
        self.player_index.get(&(team, name.to_string())).copied()
    }

    /// Look up a player on a team, adding them with empty stats if new.
    pub fn register_player(&mut self, team: TeamId, name: &str) -> PlayerId {
        if let Some(id) = self.player_id(team, name) {
            return id;
        }
        let id = PlayerId(self.players.len());
        self.players.push(PlayerEntry::new(name, team));
        self.player_index.insert((team, name.to_string()), id);
        self.teams[team.0].players.push(id);
        id
    }

    pub fn team(&self, id: TeamId) -> &TeamEntry {
        &self.teams[id.0]
    }

    pub fn team_mut(&mut self, id: TeamId) -> &mut TeamEntry {
        &mut self.teams[id.0]
    }

    pub fn player(&self, id: PlayerId) -> &PlayerEntry {
        &self.players[id.0]
    }

    pub fn player_mut(&mut self, id: PlayerId) -> &mut PlayerEntry {
        &mut self.players[id.0]
    }

    pub fn team_ids(&self) -> impl Iterator<Item = TeamId> {
        (0..self.teams.len()).map(TeamId)
    }

    pub fn teams(&self) -> impl Iterator<Item = (TeamId, &TeamEntry)> {
        self.teams.iter().enumerate().map(|(i, t)| (TeamId(i), t))
    }

    /// Give one tossup heard to every player in each team's current lineup.
    pub fn credit_current_lineups(&mut self) {
        for team in &self.teams {
            for id in &team.lineups.current().players {
                self.players[id.0].tossups_heard += 1;
            }
        }
    }
}
