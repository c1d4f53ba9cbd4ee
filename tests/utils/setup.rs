use std::sync::Arc;

use hoops_tracker::{
    auth::{token::TokenConfig, Access, AuthService},
    night::NewNight,
    tracking::{NewGame, StatDelta},
    AppState, Game, InMemoryStatStore, Night, Notifier, PersistenceSink, SeasonBook, StatKey,
    StatStore, StoreSink,
};

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

pub struct TestSetup {
    pub state: AppState,
    pub store: Arc<InMemoryStatStore>,
    pub night: Night,
    names: Vec<(String, String)>,
}

pub struct TestSetupBuilder {
    players: Vec<String>,
    sink: Option<Arc<dyn PersistenceSink>>,
}

impl TestSetupBuilder {
    pub fn new() -> Self {
        Self {
            players: vec![],
            sink: None,
        }
    }

    pub fn with_players(mut self, players: Vec<&str>) -> Self {
        self.players = players.into_iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_three_players(self) -> Self {
        self.with_players(vec!["Ann", "Bo", "Cy"])
    }

    pub fn with_sink(mut self, sink: Arc<dyn PersistenceSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Registers the players, begins a night with all of them and opens it for tracking
    pub async fn build(self) -> TestSetup {
        let store = Arc::new(InMemoryStatStore::new());
        let mut names = Vec::new();
        for name in &self.players {
            let player = store.create_player(name).await.unwrap();
            names.push((player.name, player.id));
        }

        let book = SeasonBook::load(store.as_ref()).await.unwrap();
        let sink: Arc<dyn PersistenceSink> = match self.sink {
            Some(sink) => sink,
            None => Arc::new(StoreSink::new(store.clone())),
        };
        let auth = AuthService::new(TokenConfig::new("test-secret".to_string(), 1), None);
        let state = AppState::new(
            store.clone(),
            sink,
            book.into_shared(),
            Notifier::new(32),
            Arc::new(auth),
        );

        let night = state
            .nights
            .begin_night(
                Access::Editor,
                NewNight {
                    players: names.iter().map(|(_, id)| id.clone()).collect(),
                    ..NewNight::default()
                },
            )
            .await
            .unwrap();
        state
            .tracking
            .open(Access::Editor, night.clone())
            .await
            .unwrap();

        TestSetup {
            state,
            store,
            night,
            names,
        }
    }
}

impl TestSetup {
    pub fn id(&self, name: &str) -> String {
        self.names
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, id)| id.clone())
            .unwrap_or_else(|| panic!("no player named {}", name))
    }

    fn ids(&self, names: &[&str]) -> Vec<String> {
        names.iter().map(|n| self.id(n)).collect()
    }

    pub async fn stats_only_game(&self) -> Game {
        self.game_with_teams(&[], &[]).await
    }

    pub async fn game_with_teams(&self, a: &[&str], b: &[&str]) -> Game {
        self.state
            .tracking
            .new_game(
                Access::Editor,
                NewGame {
                    team_a: self.ids(a),
                    team_b: self.ids(b),
                },
            )
            .await
            .unwrap()
    }

    pub async fn log(&self, game: &Game, name: &str, key: StatKey, delta: i32) -> StatDelta {
        self.state
            .tracking
            .apply_stat_delta(Access::Editor, &game.id, &self.id(name), key, delta)
            .await
            .unwrap()
    }

    /// Logs and waits for the background write to finish
    pub async fn log_settled(&self, game: &Game, name: &str, key: StatKey, delta: i32) {
        self.log(game, name, key, delta).await.write.settled().await;
    }

    pub async fn active(&self) -> Night {
        self.state.tracking.active().await.unwrap()
    }
}
