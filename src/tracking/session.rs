use chrono::{DateTime, Utc};

use crate::night::models::{Game, Night, Side};
use crate::shared::AppError;
use crate::stats::{StatKey, StatLine};

/// The night currently open for tracking.
///
/// Built fresh from a copy of a night when editing starts and handed back
/// whole on save. Mutations here never touch the store.
#[derive(Debug, Clone)]
pub struct EditingSession {
    night: Night,
    opened_at: DateTime<Utc>,
}

impl EditingSession {
    pub fn new(night: Night) -> Self {
        Self {
            night,
            opened_at: Utc::now(),
        }
    }

    pub fn night(&self) -> &Night {
        &self.night
    }

    pub fn night_id(&self) -> &str {
        &self.night.id
    }

    pub fn opened_at(&self) -> DateTime<Utc> {
        self.opened_at
    }

    pub fn into_night(self) -> Night {
        self.night
    }

    fn game_mut(&mut self, game_id: &str) -> Result<&mut Game, AppError> {
        self.night
            .game_mut(game_id)
            .ok_or_else(|| AppError::NotFound(format!("game {}", game_id)))
    }

    /// Replaces the player's line with `line.with_delta(key, delta)` and returns it
    pub fn apply_delta(
        &mut self,
        game_id: &str,
        player_id: &str,
        key: StatKey,
        delta: i32,
    ) -> Result<StatLine, AppError> {
        if !self.night.has_player(player_id) {
            return Err(AppError::NotFound(format!("player {}", player_id)));
        }
        let game = self.game_mut(game_id)?;
        let updated = game.stat_line(player_id).with_delta(key, delta);
        game.stats.insert(player_id.to_string(), updated);
        Ok(updated)
    }

    pub fn set_winner(&mut self, game_id: &str, winner: Option<Side>) -> Result<(), AppError> {
        self.game_mut(game_id)?.winner = winner;
        Ok(())
    }

    pub fn push_game(&mut self, game: Game) {
        self.night.games.push(game);
    }

    /// Drops the game and renumbers the rest 1..n
    pub fn remove_game(&mut self, game_id: &str) -> Option<Game> {
        self.night.remove_game(game_id)
    }
}
