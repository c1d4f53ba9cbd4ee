use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use super::{
    rows::{assemble_nights, AttendanceRow, GamePlayerRow, GameRow, NightRow, StatRow},
    StatStore, StoreError,
};
use crate::night::models::{Game, Night, Side, Teams};
use crate::roster::models::{Player, PlayerId};
use crate::stats::StatLine;

#[derive(Default)]
struct Tables {
    players: Vec<Player>,
    nights: Vec<NightRow>,
    attendance: Vec<AttendanceRow>,
    games: Vec<GameRow>,
    game_players: Vec<GamePlayerRow>,
    stats: HashMap<(String, String), StatRow>,
}

impl Tables {
    fn game_mut(&mut self, game_id: &str) -> Result<&mut GameRow, StoreError> {
        self.games
            .iter_mut()
            .find(|g| g.id == game_id)
            .ok_or_else(|| StoreError::NotFound(format!("game {}", game_id)))
    }
}

/// In-memory store for development and testing.
///
/// Keeps the same relational layout and cascade rules as the database:
/// deleting a night drops its games, membership and stat rows; deleting a
/// player drops their memberships but leaves their stat rows in place.
#[derive(Default)]
pub struct InMemoryStatStore {
    tables: Mutex<Tables>,
}

impl InMemoryStatStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        self.tables
            .lock()
            .map_err(|_| StoreError::Unavailable("in-memory store lock poisoned".to_string()))
    }

    /// Persisted line for a cell, including rows orphaned by player deletion
    pub fn stored_line(&self, game_id: &str, player_id: &str) -> Option<StatLine> {
        let tables = self.tables().ok()?;
        tables
            .stats
            .get(&(game_id.to_string(), player_id.to_string()))
            .map(StatRow::line)
    }

    pub fn stored_game_number(&self, game_id: &str) -> Option<u32> {
        let tables = self.tables().ok()?;
        tables
            .games
            .iter()
            .find(|g| g.id == game_id)
            .map(|g| g.number as u32)
    }
}

#[async_trait]
impl StatStore for InMemoryStatStore {
    #[instrument(skip(self))]
    async fn list_players(&self) -> Result<Vec<Player>, StoreError> {
        let tables = self.tables()?;
        debug!(count = tables.players.len(), "Listing players from memory");
        Ok(tables.players.clone())
    }

    #[instrument(skip(self))]
    async fn create_player(&self, name: &str) -> Result<Player, StoreError> {
        let mut tables = self.tables()?;
        if tables.players.iter().any(|p| p.has_name(name)) {
            warn!(name = %name, "Player name already taken in memory");
            return Err(StoreError::Conflict(format!("player {} exists", name)));
        }
        let player = Player::new(Uuid::new_v4().to_string(), name);
        tables.players.push(player.clone());

        debug!(player_id = %player.id, "Player created in memory");
        Ok(player)
    }

    #[instrument(skip(self))]
    async fn delete_player(&self, player_id: &str) -> Result<(), StoreError> {
        let mut tables = self.tables()?;
        let before = tables.players.len();
        tables.players.retain(|p| p.id != player_id);
        if tables.players.len() == before {
            return Err(StoreError::NotFound(format!("player {}", player_id)));
        }
        tables.attendance.retain(|a| a.player_id != player_id);
        tables.game_players.retain(|m| m.player_id != player_id);

        debug!(player_id = %player_id, "Player deleted from memory, stat rows kept");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_nights(&self) -> Result<Vec<Night>, StoreError> {
        let tables = self.tables()?;
        let mut nights = tables.nights.clone();
        nights.sort_by(|a, b| b.date.cmp(&a.date));
        let stats: Vec<StatRow> = tables.stats.values().cloned().collect();

        Ok(assemble_nights(
            nights,
            &tables.attendance,
            &tables.games,
            &tables.game_players,
            &stats,
        ))
    }

    #[instrument(skip(self, players))]
    async fn create_night(
        &self,
        date: NaiveDate,
        youtube_url: Option<&str>,
        players: &[PlayerId],
    ) -> Result<Night, StoreError> {
        let mut tables = self.tables()?;
        let id = Uuid::new_v4().to_string();
        tables.nights.push(NightRow {
            id: id.clone(),
            date,
            youtube_url: youtube_url.map(str::to_string),
        });
        for player_id in players {
            tables.attendance.push(AttendanceRow {
                night_id: id.clone(),
                player_id: player_id.clone(),
            });
        }

        debug!(night_id = %id, attendees = players.len(), "Night created in memory");
        Ok(Night::new(
            id,
            date,
            youtube_url.map(str::to_string),
            players.to_vec(),
        ))
    }

    #[instrument(skip(self))]
    async fn delete_night(&self, night_id: &str) -> Result<(), StoreError> {
        let mut tables = self.tables()?;
        let before = tables.nights.len();
        tables.nights.retain(|n| n.id != night_id);
        if tables.nights.len() == before {
            return Err(StoreError::NotFound(format!("night {}", night_id)));
        }

        let game_ids: Vec<String> = tables
            .games
            .iter()
            .filter(|g| g.night_id == night_id)
            .map(|g| g.id.clone())
            .collect();
        tables.attendance.retain(|a| a.night_id != night_id);
        tables.games.retain(|g| g.night_id != night_id);
        tables
            .game_players
            .retain(|m| !game_ids.contains(&m.game_id));
        tables.stats.retain(|(game_id, _), _| !game_ids.contains(game_id));

        debug!(night_id = %night_id, games = game_ids.len(), "Night deleted from memory with its games");
        Ok(())
    }

    #[instrument(skip(self, teams, players))]
    async fn create_game(
        &self,
        night_id: &str,
        number: u32,
        teams: &Teams,
        players: &[PlayerId],
    ) -> Result<Game, StoreError> {
        let mut tables = self.tables()?;
        if !tables.nights.iter().any(|n| n.id == night_id) {
            return Err(StoreError::NotFound(format!("night {}", night_id)));
        }

        let id = Uuid::new_v4().to_string();
        tables.games.push(GameRow {
            id: id.clone(),
            night_id: night_id.to_string(),
            number: number as i32,
            winner: None,
        });
        for player_id in players {
            tables.game_players.push(GamePlayerRow {
                game_id: id.clone(),
                player_id: player_id.clone(),
                team: teams.side_of(player_id).map(|side| side.to_string()),
            });
            tables.stats.insert(
                (id.clone(), player_id.clone()),
                StatRow::new(&id, player_id, &StatLine::zero()),
            );
        }

        debug!(game_id = %id, night_id = %night_id, number, "Game created in memory");
        Ok(Game::new(id, number, teams.clone(), players))
    }

    #[instrument(skip(self))]
    async fn delete_game(&self, game_id: &str) -> Result<(), StoreError> {
        let mut tables = self.tables()?;
        let before = tables.games.len();
        tables.games.retain(|g| g.id != game_id);
        if tables.games.len() == before {
            return Err(StoreError::NotFound(format!("game {}", game_id)));
        }
        tables.game_players.retain(|m| m.game_id != game_id);
        tables.stats.retain(|(id, _), _| id != game_id);

        debug!(game_id = %game_id, "Game deleted from memory");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn update_game_number(&self, game_id: &str, number: u32) -> Result<(), StoreError> {
        let mut tables = self.tables()?;
        tables.game_mut(game_id)?.number = number as i32;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn set_winner(&self, game_id: &str, winner: Option<Side>) -> Result<(), StoreError> {
        let mut tables = self.tables()?;
        tables.game_mut(game_id)?.winner = winner.map(|side| side.to_string());
        Ok(())
    }

    #[instrument(skip(self, line))]
    async fn upsert_stat_line(
        &self,
        game_id: &str,
        player_id: &str,
        line: &StatLine,
    ) -> Result<(), StoreError> {
        let mut tables = self.tables()?;
        tables.game_mut(game_id)?;
        tables.stats.insert(
            (game_id.to_string(), player_id.to_string()),
            StatRow::new(game_id, player_id, line),
        );
        Ok(())
    }
}
