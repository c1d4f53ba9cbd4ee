use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{error, info, instrument, warn};

use super::session::EditingSession;
use super::sink::PersistenceSink;
use crate::auth::Access;
use crate::night::models::{Game, GameId, Night, Side, Teams};
use crate::night::service::{ensure_teams, night_totals, NightTotalsRow};
use crate::notify::Notifier;
use crate::roster::models::PlayerId;
use crate::season::SharedBook;
use crate::shared::AppError;
use crate::stats::{StatKey, StatLine};
use crate::store::StatStore;

/// A background store write that the caller does not have to wait for
#[derive(Debug)]
pub struct PendingWrite(JoinHandle<()>);

impl PendingWrite {
    /// Waits for the write to finish. Its outcome has already been reported.
    pub async fn settled(self) {
        if let Err(e) = self.0.await {
            error!(error = %e, "Background write task did not complete");
        }
    }
}

/// Result of an optimistic stat change
#[derive(Debug)]
pub struct StatDelta {
    pub line: StatLine,
    pub write: PendingWrite,
}

#[derive(Debug)]
pub struct GameRemoval {
    pub removed: Game,
    /// Remaining games with their new numbers, in order
    pub renumbered: Vec<(GameId, u32)>,
    pub write: PendingWrite,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewGame {
    #[serde(default)]
    pub team_a: Vec<PlayerId>,
    #[serde(default)]
    pub team_b: Vec<PlayerId>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Lineup {
    pub game_id: GameId,
    pub number: u32,
    pub players: Vec<PlayerId>,
}

/// What the tracking screen shows
#[derive(Debug, Clone, Serialize)]
pub struct TrackingView {
    pub night: Night,
    pub opened_at: DateTime<Utc>,
    pub totals: Vec<NightTotalsRow>,
    pub lineups: Vec<Lineup>,
}

fn no_session() -> AppError {
    AppError::NotFound("No night is being tracked".to_string())
}

pub struct TrackingService {
    store: Arc<dyn StatStore>,
    sink: Arc<dyn PersistenceSink>,
    book: SharedBook,
    notifier: Notifier,
    session: RwLock<Option<EditingSession>>,
}

impl TrackingService {
    pub fn new(
        store: Arc<dyn StatStore>,
        sink: Arc<dyn PersistenceSink>,
        book: SharedBook,
        notifier: Notifier,
    ) -> Self {
        Self {
            store,
            sink,
            book,
            notifier,
            session: RwLock::new(None),
        }
    }

    /// Starts editing `night`, replacing any session already open
    #[instrument(skip(self, night), fields(night_id = %night.id))]
    pub async fn open(&self, access: Access, night: Night) -> Result<(), AppError> {
        access.require_editor("track nights")?;

        let mut session = self.session.write().await;
        if let Some(previous) = session.as_ref().filter(|s| s.night_id() != night.id) {
            warn!(previous = %previous.night_id(), "Unsaved tracking session replaced");
        }
        *session = Some(EditingSession::new(night));
        info!("Tracking session opened");
        Ok(())
    }

    /// Opens a copy of a night from the canonical collection
    pub async fn resume(&self, access: Access, night_id: &str) -> Result<Night, AppError> {
        access.require_editor("track nights")?;

        let night = self
            .book
            .read()
            .await
            .night(night_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("night {}", night_id)))?;
        self.open(access, night.clone()).await?;
        Ok(night)
    }

    pub async fn active(&self) -> Option<Night> {
        self.session
            .read()
            .await
            .as_ref()
            .map(|s| s.night().clone())
    }

    /// Whether `night_id` is the night currently open for editing
    pub async fn is_tracking(&self, night_id: &str) -> bool {
        self.session
            .read()
            .await
            .as_ref()
            .is_some_and(|s| s.night_id() == night_id)
    }

    pub async fn view(&self) -> Option<TrackingView> {
        let session = self.session.read().await;
        let session = session.as_ref()?;
        let night = session.night();
        let book = self.book.read().await;

        Some(TrackingView {
            night: night.clone(),
            opened_at: session.opened_at(),
            totals: night_totals(night, book.players()),
            lineups: night
                .games
                .iter()
                .map(|g| Lineup {
                    game_id: g.id.clone(),
                    number: g.number,
                    players: g.participants(&night.players),
                })
                .collect(),
        })
    }

    /// Leaves tracking without touching the canonical collection
    pub async fn discard(&self, access: Access) -> Result<(), AppError> {
        access.require_editor("stop tracking")?;
        if let Some(session) = self.session.write().await.take() {
            info!(night_id = %session.night_id(), "Tracking session discarded");
        }
        Ok(())
    }

    /// Ends the session if it is editing `night_id`
    pub async fn close_if_active(&self, night_id: &str) -> bool {
        let mut session = self.session.write().await;
        if session.as_ref().is_some_and(|s| s.night_id() == night_id) {
            *session = None;
            info!(night_id = %night_id, "Tracking session closed");
            true
        } else {
            false
        }
    }

    /// Creates the next game of the tracked night.
    /// Empty teams make a stats-only game.
    #[instrument(skip(self, request))]
    pub async fn new_game(&self, access: Access, request: NewGame) -> Result<Game, AppError> {
        access.require_editor("add games")?;

        // Held until the game is stored so overlapping calls get distinct numbers
        let mut session = self.session.write().await;
        let active = session.as_mut().ok_or_else(no_session)?;
        let night_id = active.night_id().to_string();
        let number = active.night().next_game_number();
        let roster = active.night().players.clone();

        let teams = Teams::new(request.team_a, request.team_b);
        if let Some(outsider) = teams
            .a
            .iter()
            .chain(teams.b.iter())
            .find(|pid| !roster.contains(pid))
        {
            return Err(AppError::Validation(format!(
                "{} is not playing tonight",
                outsider
            )));
        }
        let mut seen = HashSet::new();
        if !teams.is_disjoint() || !teams.a.iter().chain(teams.b.iter()).all(|p| seen.insert(p)) {
            return Err(AppError::Validation(
                "A player can only be picked once".to_string(),
            ));
        }

        let game = self
            .store
            .create_game(&night_id, number, &teams, &roster)
            .await
            .map_err(|e| {
                self.notifier.error(format!("Error: {}", e));
                AppError::from(e)
            })?;
        active.push_game(game.clone());
        drop(session);

        if let Some(night) = self.book.write().await.night_mut(&night_id) {
            night.games.push(game.clone());
        }

        info!(
            night_id = %night_id,
            game_id = %game.id,
            number,
            stats_only = !game.has_teams(),
            "Game started"
        );
        Ok(game)
    }

    /// Deletes a game and renumbers the rest.
    /// The delete is awaited; the renumbering writes run concurrently in the background.
    #[instrument(skip(self))]
    pub async fn delete_game(&self, access: Access, game_id: &str) -> Result<GameRemoval, AppError> {
        access.require_editor("remove games")?;

        let mut session = self.session.write().await;
        let active = session.as_mut().ok_or_else(no_session)?;
        if active.night().game(game_id).is_none() {
            return Err(AppError::NotFound(format!("game {}", game_id)));
        }
        let night_id = active.night_id().to_string();

        self.store.delete_game(game_id).await.map_err(|e| {
            self.notifier.error(format!("Error: {}", e));
            AppError::from(e)
        })?;

        let removed = active
            .remove_game(game_id)
            .ok_or_else(|| AppError::NotFound(format!("game {}", game_id)))?;
        let renumbered: Vec<(GameId, u32)> = active
            .night()
            .games
            .iter()
            .map(|g| (g.id.clone(), g.number))
            .collect();
        drop(session);
        if let Some(night) = self.book.write().await.night_mut(&night_id) {
            night.remove_game(game_id);
        }

        let write = self.spawn_renumbering(renumbered.clone());
        info!(
            night_id = %night_id,
            game_id = %game_id,
            remaining = renumbered.len(),
            "Game removed"
        );
        self.notifier.info("Game removed");

        Ok(GameRemoval {
            removed,
            renumbered,
            write,
        })
    }

    fn spawn_renumbering(&self, numbers: Vec<(GameId, u32)>) -> PendingWrite {
        let sink = self.sink.clone();
        let notifier = self.notifier.clone();

        PendingWrite(tokio::spawn(async move {
            let writes = numbers.iter().map(|(game_id, number)| {
                let sink = sink.clone();
                async move { (game_id, sink.renumber_game(game_id, *number).await) }
            });
            for (game_id, result) in join_all(writes).await {
                if let Err(e) = result {
                    warn!(game_id = %game_id, error = %e, "Renumbering failed");
                    notifier.error(format!("Save error: {}", e));
                }
            }
        }))
    }

    /// Optimistic stat change: the session is updated before this returns and
    /// the new line is written in the background. A failed write is reported
    /// as a notification and the session keeps the new value.
    #[instrument(skip(self))]
    pub async fn apply_stat_delta(
        &self,
        access: Access,
        game_id: &str,
        player_id: &str,
        key: StatKey,
        delta: i32,
    ) -> Result<StatDelta, AppError> {
        access.require_editor("log stats")?;

        let line = {
            let mut session = self.session.write().await;
            let session = session.as_mut().ok_or_else(no_session)?;
            session
                .apply_delta(game_id, player_id, key, delta)
                .map_err(|e| {
                    warn!(error = %e, "Stat change ignored");
                    e
                })?
        };

        let sink = self.sink.clone();
        let notifier = self.notifier.clone();
        let (game_id, player_id) = (game_id.to_string(), player_id.to_string());
        let write = PendingWrite(tokio::spawn(async move {
            if let Err(e) = sink.upsert_stat_line(&game_id, &player_id, line).await {
                warn!(game_id = %game_id, player_id = %player_id, error = %e, "Stat write failed");
                notifier.error(format!("Save error: {}", e));
            }
        }));

        Ok(StatDelta { line, write })
    }

    /// Toggles the winner of a tracked game. Persisted before the session changes.
    #[instrument(skip(self))]
    pub async fn set_winner(
        &self,
        access: Access,
        game_id: &str,
        side: Side,
    ) -> Result<Option<Side>, AppError> {
        access.require_editor("record results")?;

        // Held across the write so overlapping toggles see each other's result
        let mut session = self.session.write().await;
        let active = session.as_mut().ok_or_else(no_session)?;
        let winner = {
            let game = active
                .night()
                .game(game_id)
                .ok_or_else(|| AppError::NotFound(format!("game {}", game_id)))?;
            ensure_teams(game)?;
            game.toggled_winner(side)
        };

        self.sink.set_winner(game_id, winner).await.map_err(|e| {
            self.notifier.error(format!("Error: {}", e));
            AppError::from(e)
        })?;
        active.set_winner(game_id, winner)?;

        info!(game_id = %game_id, ?winner, "Winner updated");
        Ok(winner)
    }

    /// Promotes the tracked night into the canonical collection and ends the session
    #[instrument(skip(self))]
    pub async fn save_night(&self, access: Access) -> Result<Night, AppError> {
        access.require_editor("save nights")?;

        let night = self
            .session
            .write()
            .await
            .take()
            .ok_or_else(no_session)?
            .into_night();
        self.book.write().await.save_night(night.clone());

        info!(night_id = %night.id, games = night.games.len(), "Night saved");
        self.notifier.info("Night saved!");
        Ok(night)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::night::service::{NewNight, NightService};
    use crate::season::SeasonBook;
    use crate::shared::test_utils::YieldingStore;
    use crate::stats::line::MAX_COUNTER;
    use crate::store::{InMemoryStatStore, StoreError};
    use crate::tracking::StoreSink;
    use async_trait::async_trait;

    struct OfflineSink;

    #[async_trait]
    impl PersistenceSink for OfflineSink {
        async fn upsert_stat_line(&self, _: &str, _: &str, _: StatLine) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("offline".to_string()))
        }

        async fn set_winner(&self, _: &str, _: Option<Side>) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("offline".to_string()))
        }

        async fn renumber_game(&self, _: &str, _: u32) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("offline".to_string()))
        }
    }

    struct Fixture {
        tracking: TrackingService,
        store: Arc<InMemoryStatStore>,
        book: SharedBook,
        notifier: Notifier,
        ids: Vec<PlayerId>,
    }

    async fn fixture(sink: Option<Arc<dyn PersistenceSink>>) -> Fixture {
        let store = Arc::new(InMemoryStatStore::new());
        let mut ids = Vec::new();
        for name in ["Ann", "Bo", "Cy"] {
            ids.push(store.create_player(name).await.unwrap().id);
        }
        let book = SeasonBook::load(store.as_ref()).await.unwrap().into_shared();
        let notifier = Notifier::new(16);
        let sink: Arc<dyn PersistenceSink> = match sink {
            Some(sink) => sink,
            None => Arc::new(StoreSink::new(store.clone())),
        };

        let nights = NightService::new(store.clone(), book.clone(), notifier.clone());
        let night = nights
            .begin_night(
                Access::Editor,
                NewNight {
                    players: ids.clone(),
                    ..NewNight::default()
                },
            )
            .await
            .unwrap();

        let tracking = TrackingService::new(store.clone(), sink, book.clone(), notifier.clone());
        tracking.open(Access::Editor, night).await.unwrap();

        Fixture {
            tracking,
            store,
            book,
            notifier,
            ids,
        }
    }

    async fn yielding_fixture() -> (TrackingService, Vec<PlayerId>) {
        let store = Arc::new(YieldingStore::new());
        let mut ids = Vec::new();
        for name in ["Ann", "Bo", "Cy"] {
            ids.push(store.create_player(name).await.unwrap().id);
        }
        let book = SeasonBook::load(store.as_ref()).await.unwrap().into_shared();
        let notifier = Notifier::new(16);
        let sink: Arc<dyn PersistenceSink> = Arc::new(StoreSink::new(store.clone()));

        let nights = NightService::new(store.clone(), book.clone(), notifier.clone());
        let night = nights
            .begin_night(
                Access::Editor,
                NewNight {
                    players: ids.clone(),
                    ..NewNight::default()
                },
            )
            .await
            .unwrap();

        let tracking = TrackingService::new(store, sink, book, notifier);
        tracking.open(Access::Editor, night).await.unwrap();
        (tracking, ids)
    }

    #[tokio::test]
    async fn stat_delta_is_visible_before_write_settles() {
        let fx = fixture(None).await;
        let game = fx
            .tracking
            .new_game(Access::Editor, NewGame::default())
            .await
            .unwrap();

        let delta = fx
            .tracking
            .apply_stat_delta(Access::Editor, &game.id, &fx.ids[0], StatKey::Pts3, 1)
            .await
            .unwrap();

        let active = fx.tracking.active().await.unwrap();
        assert_eq!(active.games[0].stat_line(&fx.ids[0]).pts3, 1);
        assert_eq!(delta.line.fgm, 1);

        delta.write.settled().await;
        assert_eq!(fx.store.stored_line(&game.id, &fx.ids[0]), Some(delta.line));
    }

    #[tokio::test]
    async fn failed_write_notifies_without_rollback() {
        let fx = fixture(Some(Arc::new(OfflineSink))).await;
        let game = fx
            .tracking
            .new_game(Access::Editor, NewGame::default())
            .await
            .unwrap();
        fx.notifier.drain();

        let delta = fx
            .tracking
            .apply_stat_delta(Access::Editor, &game.id, &fx.ids[1], StatKey::Reb, 1)
            .await
            .unwrap();
        delta.write.settled().await;

        let active = fx.tracking.active().await.unwrap();
        assert_eq!(active.games[0].stat_line(&fx.ids[1]).reb, 1);
        let notes = fx.notifier.drain();
        assert_eq!(notes.len(), 1);
        assert!(notes[0].message.starts_with("Save error:"));
    }

    #[tokio::test]
    async fn winner_is_not_committed_when_persistence_fails() {
        let fx = fixture(Some(Arc::new(OfflineSink))).await;
        let game = fx
            .tracking
            .new_game(
                Access::Editor,
                NewGame {
                    team_a: vec![fx.ids[0].clone()],
                    team_b: vec![fx.ids[1].clone()],
                },
            )
            .await
            .unwrap();

        let result = fx.tracking.set_winner(Access::Editor, &game.id, Side::A).await;

        assert!(matches!(result, Err(AppError::Persistence(_))));
        let active = fx.tracking.active().await.unwrap();
        assert_eq!(active.games[0].winner, None);
    }

    #[tokio::test]
    async fn new_game_rejects_overlapping_or_outside_teams() {
        let fx = fixture(None).await;

        let overlapping = fx
            .tracking
            .new_game(
                Access::Editor,
                NewGame {
                    team_a: vec![fx.ids[0].clone()],
                    team_b: vec![fx.ids[0].clone()],
                },
            )
            .await;
        let outsider = fx
            .tracking
            .new_game(
                Access::Editor,
                NewGame {
                    team_a: vec!["stranger".to_string()],
                    team_b: vec![],
                },
            )
            .await;

        assert!(matches!(overlapping, Err(AppError::Validation(_))));
        assert!(matches!(outsider, Err(AppError::Validation(_))));
        assert!(fx.tracking.active().await.unwrap().games.is_empty());
    }

    #[tokio::test]
    async fn new_game_shows_up_in_canonical_night() {
        let fx = fixture(None).await;
        let game = fx
            .tracking
            .new_game(Access::Editor, NewGame::default())
            .await
            .unwrap();

        let book = fx.book.read().await;
        assert_eq!(book.nights()[0].games[0].id, game.id);
        assert_eq!(game.number, 1);
    }

    #[tokio::test]
    async fn save_promotes_session_and_ends_it() {
        let fx = fixture(None).await;
        let game = fx
            .tracking
            .new_game(Access::Editor, NewGame::default())
            .await
            .unwrap();
        fx.tracking
            .apply_stat_delta(Access::Editor, &game.id, &fx.ids[2], StatKey::Ast, 2)
            .await
            .unwrap();

        fx.tracking.save_night(Access::Editor).await.unwrap();

        assert!(fx.tracking.active().await.is_none());
        let book = fx.book.read().await;
        assert_eq!(book.nights()[0].games[0].stat_line(&fx.ids[2]).ast, 2);
        assert_eq!(fx.notifier.drain().last().unwrap().message, "Night saved!");
    }

    #[tokio::test]
    async fn discard_leaves_canonical_night_untouched() {
        let fx = fixture(None).await;
        let game = fx
            .tracking
            .new_game(Access::Editor, NewGame::default())
            .await
            .unwrap();
        fx.tracking
            .apply_stat_delta(Access::Editor, &game.id, &fx.ids[0], StatKey::Stl, 1)
            .await
            .unwrap();

        fx.tracking.discard(Access::Editor).await.unwrap();

        assert!(fx.tracking.view().await.is_none());
        let book = fx.book.read().await;
        assert_eq!(book.nights()[0].games[0].stat_line(&fx.ids[0]), StatLine::zero());
    }

    #[tokio::test]
    async fn viewer_cannot_log_stats() {
        let fx = fixture(None).await;
        let game = fx
            .tracking
            .new_game(Access::Editor, NewGame::default())
            .await
            .unwrap();

        let result = fx
            .tracking
            .apply_stat_delta(Access::Viewer, &game.id, &fx.ids[0], StatKey::Pts2, 1)
            .await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
        let active = fx.tracking.active().await.unwrap();
        assert_eq!(active.games[0].stat_line(&fx.ids[0]), StatLine::zero());
    }

    #[tokio::test]
    async fn view_lists_lineups_per_game() {
        let fx = fixture(None).await;
        fx.tracking
            .new_game(
                Access::Editor,
                NewGame {
                    team_a: vec![fx.ids[0].clone()],
                    team_b: vec![fx.ids[2].clone()],
                },
            )
            .await
            .unwrap();

        let view = fx.tracking.view().await.unwrap();
        assert_eq!(view.lineups[0].players, vec![fx.ids[0].clone(), fx.ids[2].clone()]);
        assert_eq!(view.totals.len(), 3);
    }

    #[tokio::test]
    async fn concurrent_new_games_get_distinct_numbers() {
        let (tracking, _) = yielding_fixture().await;

        let (first, second) = tokio::join!(
            tracking.new_game(Access::Editor, NewGame::default()),
            tracking.new_game(Access::Editor, NewGame::default()),
        );

        let mut numbers = vec![first.unwrap().number, second.unwrap().number];
        numbers.sort();
        assert_eq!(numbers, vec![1, 2]);
        let active = tracking.active().await.unwrap();
        assert_eq!(active.games.len(), 2);
        assert_eq!(active.next_game_number(), 3);
    }

    #[tokio::test]
    async fn concurrent_winner_taps_toggle_in_turn() {
        let (tracking, ids) = yielding_fixture().await;
        let game = tracking
            .new_game(
                Access::Editor,
                NewGame {
                    team_a: vec![ids[0].clone()],
                    team_b: vec![ids[1].clone()],
                },
            )
            .await
            .unwrap();

        let (first, second) = tokio::join!(
            tracking.set_winner(Access::Editor, &game.id, Side::A),
            tracking.set_winner(Access::Editor, &game.id, Side::A),
        );

        let outcomes = [first.unwrap(), second.unwrap()];
        assert!(outcomes.contains(&Some(Side::A)));
        assert!(outcomes.contains(&None));
        let active = tracking.active().await.unwrap();
        assert_eq!(active.games[0].winner, None);
    }

    #[tokio::test]
    async fn stat_counters_stop_at_ceiling() {
        let fx = fixture(None).await;
        let game = fx
            .tracking
            .new_game(Access::Editor, NewGame::default())
            .await
            .unwrap();

        for _ in 0..2 {
            fx.tracking
                .apply_stat_delta(Access::Editor, &game.id, &fx.ids[0], StatKey::Pts3, i32::MAX)
                .await
                .unwrap()
                .write
                .settled()
                .await;
        }

        let view = fx.tracking.view().await.unwrap();
        let row = view
            .totals
            .iter()
            .find(|row| row.player_id == fx.ids[0])
            .unwrap();
        assert_eq!(row.line.pts3, MAX_COUNTER);
        assert_eq!(row.points, u32::MAX);
    }
}
