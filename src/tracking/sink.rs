use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::night::models::Side;
use crate::stats::StatLine;
use crate::store::{StatStore, StoreError};

/// Where tracking writes go once the in-memory state has changed
#[async_trait]
pub trait PersistenceSink: Send + Sync {
    /// Full-state write of one `(game_id, player_id)` cell
    async fn upsert_stat_line(
        &self,
        game_id: &str,
        player_id: &str,
        line: StatLine,
    ) -> Result<(), StoreError>;

    async fn set_winner(&self, game_id: &str, winner: Option<Side>) -> Result<(), StoreError>;

    async fn renumber_game(&self, game_id: &str, number: u32) -> Result<(), StoreError>;
}

/// Sink that writes straight through to a [`StatStore`]
pub struct StoreSink {
    store: Arc<dyn StatStore>,
}

impl StoreSink {
    pub fn new(store: Arc<dyn StatStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl PersistenceSink for StoreSink {
    #[instrument(skip(self, line))]
    async fn upsert_stat_line(
        &self,
        game_id: &str,
        player_id: &str,
        line: StatLine,
    ) -> Result<(), StoreError> {
        self.store.upsert_stat_line(game_id, player_id, &line).await?;
        debug!("Stat line persisted");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn set_winner(&self, game_id: &str, winner: Option<Side>) -> Result<(), StoreError> {
        self.store.set_winner(game_id, winner).await
    }

    #[instrument(skip(self))]
    async fn renumber_game(&self, game_id: &str, number: u32) -> Result<(), StoreError> {
        self.store.update_game_number(game_id, number).await
    }
}
