use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use strum_macros::{Display, EnumString};

use crate::roster::models::PlayerId;
use crate::stats::StatLine;

pub type NightId = String;
pub type GameId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Side {
    A,
    B,
}

/// Result of one game from one player's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GameOutcome {
    Win,
    Loss,
    Undecided,
}

/// Two-sided team assignment. Both sides empty means the game is stats-only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Teams {
    #[serde(default)]
    pub a: Vec<PlayerId>,
    #[serde(default)]
    pub b: Vec<PlayerId>,
}

impl Teams {
    pub fn new(a: Vec<PlayerId>, b: Vec<PlayerId>) -> Self {
        Self { a, b }
    }

    pub fn is_assigned(&self) -> bool {
        !self.a.is_empty() || !self.b.is_empty()
    }

    pub fn side_of(&self, player_id: &str) -> Option<Side> {
        if self.a.iter().any(|p| p == player_id) {
            Some(Side::A)
        } else if self.b.iter().any(|p| p == player_id) {
            Some(Side::B)
        } else {
            None
        }
    }

    pub fn contains(&self, player_id: &str) -> bool {
        self.side_of(player_id).is_some()
    }

    pub fn is_disjoint(&self) -> bool {
        !self.a.iter().any(|p| self.b.contains(p))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    pub id: GameId,
    /// 1-based and contiguous within the parent night
    pub number: u32,
    pub winner: Option<Side>,
    pub teams: Teams,
    pub stats: HashMap<PlayerId, StatLine>,
}

impl Game {
    /// A fresh game with a zeroed stat line for every attendee of the night
    pub fn new(id: impl Into<GameId>, number: u32, teams: Teams, roster: &[PlayerId]) -> Self {
        Self {
            id: id.into(),
            number,
            winner: None,
            teams,
            stats: roster
                .iter()
                .map(|pid| (pid.clone(), StatLine::zero()))
                .collect(),
        }
    }

    pub fn has_teams(&self) -> bool {
        self.teams.is_assigned()
    }

    /// Whether this game's line for `player_id` folds into night and season totals.
    /// In a stats-only game everyone with a line counts; otherwise only team members.
    pub fn counts_toward(&self, player_id: &str) -> bool {
        !self.has_teams() || self.teams.contains(player_id)
    }

    pub fn outcome_for(&self, player_id: &str) -> GameOutcome {
        match (self.winner, self.teams.side_of(player_id)) {
            (Some(winner), Some(side)) if winner == side => GameOutcome::Win,
            (Some(_), Some(_)) => GameOutcome::Loss,
            _ => GameOutcome::Undecided,
        }
    }

    /// The lineup shown while tracking: team members, or every attendee when no teams were picked
    pub fn participants(&self, roster: &[PlayerId]) -> Vec<PlayerId> {
        roster
            .iter()
            .filter(|pid| self.counts_toward(pid))
            .cloned()
            .collect()
    }

    pub fn stat_line(&self, player_id: &str) -> StatLine {
        self.stats.get(player_id).copied().unwrap_or_default()
    }

    /// Picking the current winner again clears it
    pub fn toggled_winner(&self, side: Side) -> Option<Side> {
        if self.winner == Some(side) {
            None
        } else {
            Some(side)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Night {
    pub id: NightId,
    pub date: NaiveDate,
    pub youtube_url: Option<String>,
    /// Attendance, fixed when the night begins
    pub players: Vec<PlayerId>,
    pub games: Vec<Game>,
}

impl Night {
    pub fn new(
        id: impl Into<NightId>,
        date: NaiveDate,
        youtube_url: Option<String>,
        players: Vec<PlayerId>,
    ) -> Self {
        Self {
            id: id.into(),
            date,
            youtube_url,
            players,
            games: Vec::new(),
        }
    }

    pub fn has_player(&self, player_id: &str) -> bool {
        self.players.iter().any(|p| p == player_id)
    }

    pub fn game(&self, game_id: &str) -> Option<&Game> {
        self.games.iter().find(|g| g.id == game_id)
    }

    pub fn game_mut(&mut self, game_id: &str) -> Option<&mut Game> {
        self.games.iter_mut().find(|g| g.id == game_id)
    }

    pub fn next_game_number(&self) -> u32 {
        self.games.len() as u32 + 1
    }

    /// Removes a game and closes the gap in numbering.
    /// Returns the removed game, or `None` when the id is unknown.
    pub fn remove_game(&mut self, game_id: &str) -> Option<Game> {
        let index = self.games.iter().position(|g| g.id == game_id)?;
        let removed = self.games.remove(index);
        for (i, game) in self.games.iter_mut().enumerate() {
            game.number = i as u32 + 1;
        }
        Some(removed)
    }

    pub fn decided_games(&self) -> usize {
        self.games.iter().filter(|g| g.winner.is_some()).count()
    }
}
