use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::models::{Game, Night, Side};
use crate::auth::Access;
use crate::notify::Notifier;
use crate::roster::models::{Player, PlayerId};
use crate::season::SharedBook;
use crate::shared::AppError;
use crate::stats::{merge_player_stats, ranking::night_top_scorer, StatLine};
use crate::store::StatStore;

/// Minimum attendance to begin a night
pub const MIN_ATTENDEES: usize = 2;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewNight {
    pub date: Option<NaiveDate>,
    pub youtube_url: Option<String>,
    pub players: Vec<PlayerId>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopScorer {
    pub player_id: PlayerId,
    pub name: String,
    pub points: u32,
}

/// One line of the nights list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NightSummary {
    pub id: String,
    pub date: NaiveDate,
    pub youtube_url: Option<String>,
    pub games: usize,
    pub players: usize,
    pub decided: usize,
    pub top_scorer: Option<TopScorer>,
}

/// A player's merged line for one night
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NightTotalsRow {
    pub player_id: PlayerId,
    pub name: String,
    pub points: u32,
    pub fg_pct: Option<f64>,
    #[serde(flatten)]
    pub line: StatLine,
}

/// Night totals for every attendee still on the roster, in roster order
pub fn night_totals(night: &Night, players: &[Player]) -> Vec<NightTotalsRow> {
    let totals = merge_player_stats(night);
    players
        .iter()
        .filter(|p| night.has_player(&p.id))
        .map(|p| {
            let line = totals.get(&p.id).copied().unwrap_or_default();
            NightTotalsRow {
                player_id: p.id.clone(),
                name: p.name.clone(),
                points: line.points(),
                fg_pct: line.fg_percent(),
                line,
            }
        })
        .collect()
}

pub fn summarize(night: &Night, players: &[Player]) -> NightSummary {
    let totals = merge_player_stats(night);
    let top_scorer = night_top_scorer(players, night, &totals).map(|(p, points)| TopScorer {
        player_id: p.id.clone(),
        name: p.name.clone(),
        points,
    });

    NightSummary {
        id: night.id.clone(),
        date: night.date,
        youtube_url: night.youtube_url.clone(),
        games: night.games.len(),
        players: players.iter().filter(|p| night.has_player(&p.id)).count(),
        decided: night.decided_games(),
        top_scorer,
    }
}

/// Winner changes only make sense once sides exist
pub(crate) fn ensure_teams(game: &Game) -> Result<(), AppError> {
    if game.has_teams() {
        Ok(())
    } else {
        Err(AppError::Validation(format!(
            "Game {} has no teams to pick a winner from",
            game.number
        )))
    }
}

/// Night lifecycle on the canonical collection: begin, delete, list, and
/// winner changes on nights that are not open for tracking.
pub struct NightService {
    store: Arc<dyn StatStore>,
    book: SharedBook,
    notifier: Notifier,
}

impl NightService {
    pub fn new(store: Arc<dyn StatStore>, book: SharedBook, notifier: Notifier) -> Self {
        Self {
            store,
            book,
            notifier,
        }
    }

    pub async fn summaries(&self) -> Vec<NightSummary> {
        let book = self.book.read().await;
        book.nights()
            .iter()
            .map(|n| summarize(n, book.players()))
            .collect()
    }

    pub async fn totals(&self, night_id: &str) -> Result<Vec<NightTotalsRow>, AppError> {
        let book = self.book.read().await;
        let night = book
            .night(night_id)
            .ok_or_else(|| AppError::NotFound(format!("night {}", night_id)))?;
        Ok(night_totals(night, book.players()))
    }

    /// Creates a night with a fixed attendance list. Date defaults to today.
    #[instrument(skip(self, request), fields(attendees = request.players.len()))]
    pub async fn begin_night(&self, access: Access, request: NewNight) -> Result<Night, AppError> {
        access.require_editor("start a night")?;

        let mut seen = HashSet::new();
        let attendees: Vec<PlayerId> = request
            .players
            .into_iter()
            .filter(|pid| seen.insert(pid.clone()))
            .collect();

        if attendees.len() < MIN_ATTENDEES {
            self.notifier.error("Select at least 2 players");
            return Err(AppError::Validation(format!(
                "Select at least {} players",
                MIN_ATTENDEES
            )));
        }

        {
            let book = self.book.read().await;
            if let Some(unknown) = attendees.iter().find(|pid| book.player(pid).is_none()) {
                warn!(player_id = %unknown, "Attendee is not on the roster");
                return Err(AppError::Validation(format!(
                    "Unknown player {}",
                    unknown
                )));
            }
        }

        let date = request.date.unwrap_or_else(|| Local::now().date_naive());
        let youtube_url = request
            .youtube_url
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty());

        let night = self
            .store
            .create_night(date, youtube_url.as_deref(), &attendees)
            .await
            .map_err(|e| {
                self.notifier.error(format!("Error: {}", e));
                AppError::from(e)
            })?;
        self.book.write().await.prepend_night(night.clone());

        info!(night_id = %night.id, date = %night.date, "Night started");
        Ok(night)
    }

    #[instrument(skip(self))]
    pub async fn delete_night(&self, access: Access, night_id: &str) -> Result<(), AppError> {
        access.require_editor("delete nights")?;

        self.store.delete_night(night_id).await.map_err(|e| {
            self.notifier.error(format!("Error: {}", e));
            AppError::from(e)
        })?;
        self.book.write().await.remove_night(night_id);

        info!(night_id = %night_id, "Night deleted");
        self.notifier.info("Night deleted");
        Ok(())
    }

    /// Winner toggle on a night outside the tracking session.
    /// Persists first and only then updates the collection.
    /// Nights open for editing go through `TrackingService::set_winner` instead.
    #[instrument(skip(self))]
    pub async fn toggle_winner(
        &self,
        access: Access,
        night_id: &str,
        game_id: &str,
        side: Side,
    ) -> Result<Option<Side>, AppError> {
        access.require_editor("record results")?;

        // Held across the store write so overlapping toggles apply one after the other
        let mut book = self.book.write().await;
        let game = book
            .night_mut(night_id)
            .and_then(|n| n.game_mut(game_id))
            .ok_or_else(|| AppError::NotFound(format!("game {}", game_id)))?;
        ensure_teams(game)?;
        let winner = game.toggled_winner(side);

        self.store.set_winner(game_id, winner).await.map_err(|e| {
            self.notifier.error(format!("Error: {}", e));
            AppError::from(e)
        })?;
        game.winner = winner;

        info!(game_id = %game_id, ?winner, "Winner updated on saved night");
        Ok(winner)
    }
}
