// Storage collaborator: create / list / update / delete keyed by opaque ids.

pub use errors::StoreError;
pub use memory::InMemoryStatStore;
pub use postgres::PostgresStatStore;

mod errors;
mod memory;
mod postgres;
pub mod rows;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::night::models::{Game, Night, Side, Teams};
use crate::roster::models::{Player, PlayerId};
use crate::stats::StatLine;

/// Backing store for the roster and the night tree.
///
/// Required semantics:
/// - `list_players` returns players in registration order
/// - `list_nights` returns nights newest first, games ordered by number
/// - deleting a night removes its games and their stat lines
/// - deleting a player removes memberships but keeps persisted stat lines
/// - `upsert_stat_line` is idempotent per `(game_id, player_id)`
#[async_trait]
pub trait StatStore: Send + Sync {
    async fn list_players(&self) -> Result<Vec<Player>, StoreError>;
    async fn create_player(&self, name: &str) -> Result<Player, StoreError>;
    async fn delete_player(&self, player_id: &str) -> Result<(), StoreError>;

    async fn list_nights(&self) -> Result<Vec<Night>, StoreError>;
    async fn create_night(
        &self,
        date: NaiveDate,
        youtube_url: Option<&str>,
        players: &[PlayerId],
    ) -> Result<Night, StoreError>;
    async fn delete_night(&self, night_id: &str) -> Result<(), StoreError>;

    /// Creates a game with a zero line for every player in `players`
    async fn create_game(
        &self,
        night_id: &str,
        number: u32,
        teams: &Teams,
        players: &[PlayerId],
    ) -> Result<Game, StoreError>;
    async fn delete_game(&self, game_id: &str) -> Result<(), StoreError>;
    async fn update_game_number(&self, game_id: &str, number: u32) -> Result<(), StoreError>;
    async fn set_winner(&self, game_id: &str, winner: Option<Side>) -> Result<(), StoreError>;
    async fn upsert_stat_line(
        &self,
        game_id: &str,
        player_id: &str,
        line: &StatLine,
    ) -> Result<(), StoreError>;
}
