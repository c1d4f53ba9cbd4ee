use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use hoops_tracker::{PersistenceSink, Side, StatLine, StoreError};

// ============================================================================
// Sink doubles
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum SinkCall {
    Upsert {
        game_id: String,
        player_id: String,
        line: StatLine,
    },
    Winner {
        game_id: String,
        winner: Option<Side>,
    },
    Renumber {
        game_id: String,
        number: u32,
    },
}

/// Records every dispatched write and reports success
#[derive(Clone, Default)]
pub struct RecordingSink {
    calls: Arc<Mutex<Vec<SinkCall>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<SinkCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: SinkCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl PersistenceSink for RecordingSink {
    async fn upsert_stat_line(
        &self,
        game_id: &str,
        player_id: &str,
        line: StatLine,
    ) -> Result<(), StoreError> {
        self.record(SinkCall::Upsert {
            game_id: game_id.to_string(),
            player_id: player_id.to_string(),
            line,
        });
        Ok(())
    }

    async fn set_winner(&self, game_id: &str, winner: Option<Side>) -> Result<(), StoreError> {
        self.record(SinkCall::Winner {
            game_id: game_id.to_string(),
            winner,
        });
        Ok(())
    }

    async fn renumber_game(&self, game_id: &str, number: u32) -> Result<(), StoreError> {
        self.record(SinkCall::Renumber {
            game_id: game_id.to_string(),
            number,
        });
        Ok(())
    }
}

/// Every write fails as if the store were unreachable
pub struct FailingSink;

fn unreachable_store() -> StoreError {
    StoreError::Unavailable("connection refused".to_string())
}

#[async_trait]
impl PersistenceSink for FailingSink {
    async fn upsert_stat_line(&self, _: &str, _: &str, _: StatLine) -> Result<(), StoreError> {
        Err(unreachable_store())
    }

    async fn set_winner(&self, _: &str, _: Option<Side>) -> Result<(), StoreError> {
        Err(unreachable_store())
    }

    async fn renumber_game(&self, _: &str, _: u32) -> Result<(), StoreError> {
        Err(unreachable_store())
    }
}
