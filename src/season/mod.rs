pub mod handlers;

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, instrument};

use crate::night::models::Night;
use crate::roster::models::{Player, PlayerId};
use crate::stats::{season_stats, SeasonLine};
use crate::store::{StatStore, StoreError};

pub type SharedBook = Arc<RwLock<SeasonBook>>;

/// The canonical collection every read is served from: the roster in
/// registration order and every night, newest first.
#[derive(Debug, Clone, Default)]
pub struct SeasonBook {
    players: Vec<Player>,
    nights: Vec<Night>,
}

impl SeasonBook {
    pub fn new(players: Vec<Player>, nights: Vec<Night>) -> Self {
        Self { players, nights }
    }

    /// Full reload from the store
    #[instrument(skip(store))]
    pub async fn load(store: &dyn StatStore) -> Result<Self, StoreError> {
        let (players, nights) = tokio::try_join!(store.list_players(), store.list_nights())?;
        info!(
            players = players.len(),
            nights = nights.len(),
            "Season loaded from store"
        );
        Ok(Self::new(players, nights))
    }

    pub fn into_shared(self) -> SharedBook {
        Arc::new(RwLock::new(self))
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    /// Roster as displayed: alphabetical, ignoring case
    pub fn players_by_name(&self) -> Vec<Player> {
        let mut sorted = self.players.clone();
        sorted.sort_by_key(|p| p.name.to_lowercase());
        sorted
    }

    pub fn player(&self, player_id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id == player_id)
    }

    pub fn has_player_named(&self, name: &str) -> bool {
        self.players.iter().any(|p| p.has_name(name))
    }

    pub fn add_player(&mut self, player: Player) {
        self.players.push(player);
    }

    pub fn remove_player(&mut self, player_id: &str) -> bool {
        let before = self.players.len();
        self.players.retain(|p| p.id != player_id);
        self.players.len() != before
    }

    pub fn nights(&self) -> &[Night] {
        &self.nights
    }

    pub fn night(&self, night_id: &str) -> Option<&Night> {
        self.nights.iter().find(|n| n.id == night_id)
    }

    pub fn night_mut(&mut self, night_id: &str) -> Option<&mut Night> {
        self.nights.iter_mut().find(|n| n.id == night_id)
    }

    pub fn prepend_night(&mut self, night: Night) {
        self.nights.insert(0, night);
    }

    pub fn remove_night(&mut self, night_id: &str) -> bool {
        let before = self.nights.len();
        self.nights.retain(|n| n.id != night_id);
        self.nights.len() != before
    }

    /// Replace by id, or prepend when the night is not in the collection yet
    pub fn save_night(&mut self, night: Night) {
        match self.night_mut(&night.id) {
            Some(existing) => *existing = night,
            None => self.prepend_night(night),
        }
    }

    pub fn total_games(&self) -> usize {
        self.nights.iter().map(|n| n.games.len()).sum()
    }

    pub fn season_stats(&self) -> HashMap<PlayerId, SeasonLine> {
        season_stats(&self.players, &self.nights)
    }
}
