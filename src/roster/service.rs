use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::models::Player;
use crate::auth::Access;
use crate::notify::Notifier;
use crate::season::SharedBook;
use crate::shared::AppError;
use crate::store::StatStore;

/// Roster maintenance: adding and removing players
pub struct RosterService {
    store: Arc<dyn StatStore>,
    book: SharedBook,
    notifier: Notifier,
}

impl RosterService {
    pub fn new(store: Arc<dyn StatStore>, book: SharedBook, notifier: Notifier) -> Self {
        Self {
            store,
            book,
            notifier,
        }
    }

    pub async fn list(&self) -> Vec<Player> {
        self.book.read().await.players_by_name()
    }

    /// Registers a player; names must be unique ignoring case
    #[instrument(skip(self))]
    pub async fn add_player(&self, access: Access, name: &str) -> Result<Player, AppError> {
        access.require_editor("add players")?;

        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("Player name is required".to_string()));
        }
        if self.book.read().await.has_player_named(name) {
            warn!(name = %name, "Rejected duplicate player name");
            self.notifier.error("Already exists");
            return Err(AppError::Validation(format!("{} already exists", name)));
        }

        let player = self.store.create_player(name).await.map_err(|e| {
            self.notifier.error(format!("Error: {}", e));
            AppError::from(e)
        })?;
        self.book.write().await.add_player(player.clone());

        info!(player_id = %player.id, name = %player.name, "Player added");
        Ok(player)
    }

    /// Removes a player from the roster. Their persisted stat lines stay behind.
    #[instrument(skip(self))]
    pub async fn remove_player(&self, access: Access, player_id: &str) -> Result<(), AppError> {
        access.require_editor("remove players")?;

        if self.book.read().await.player(player_id).is_none() {
            return Err(AppError::NotFound(format!("player {}", player_id)));
        }

        self.store.delete_player(player_id).await.map_err(|e| {
            self.notifier.error(format!("Error: {}", e));
            AppError::from(e)
        })?;
        self.book.write().await.remove_player(player_id);

        info!(player_id = %player_id, "Player removed");
        self.notifier.info("Player removed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::season::SeasonBook;
    use crate::store::InMemoryStatStore;

    fn service() -> (RosterService, Arc<InMemoryStatStore>, Notifier) {
        let store = Arc::new(InMemoryStatStore::new());
        let notifier = Notifier::new(8);
        let service = RosterService::new(
            store.clone(),
            SeasonBook::default().into_shared(),
            notifier.clone(),
        );
        (service, store, notifier)
    }

    #[tokio::test]
    async fn adds_trimmed_player_to_store_and_book() {
        let (service, store, _) = service();

        let player = service.add_player(Access::Editor, "  Kawhi ").await.unwrap();

        assert_eq!(player.name, "Kawhi");
        assert_eq!(store.list_players().await.unwrap(), vec![player.clone()]);
        assert_eq!(service.list().await, vec![player]);
    }

    #[tokio::test]
    async fn duplicate_name_is_a_validation_error() {
        let (service, store, notifier) = service();
        service.add_player(Access::Editor, "Luka").await.unwrap();

        let result = service.add_player(Access::Editor, "LUKA").await;

        assert!(matches!(result, Err(AppError::Validation(_))));
        assert_eq!(store.list_players().await.unwrap().len(), 1);
        assert_eq!(notifier.drain()[0].message, "Already exists");
    }

    #[tokio::test]
    async fn blank_name_is_rejected() {
        let (service, _, _) = service();
        let result = service.add_player(Access::Editor, "   ").await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn viewers_cannot_change_the_roster() {
        let (service, store, _) = service();
        let result = service.add_player(Access::Viewer, "Jokic").await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
        assert!(store.list_players().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn remove_player_updates_book_and_notifies() {
        let (service, store, notifier) = service();
        let player = service.add_player(Access::Editor, "Tatum").await.unwrap();

        service
            .remove_player(Access::Editor, &player.id)
            .await
            .unwrap();

        assert!(service.list().await.is_empty());
        assert!(store.list_players().await.unwrap().is_empty());
        assert_eq!(notifier.drain().last().unwrap().message, "Player removed");
        assert!(matches!(
            service.remove_player(Access::Editor, &player.id).await,
            Err(AppError::NotFound(_))
        ));
    }
}
