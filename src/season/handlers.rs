use axum::{extract::State, Extension, Json};
use serde::Serialize;
use tracing::{info, instrument, warn};

use super::SeasonBook;
use crate::auth::Access;
use crate::shared::{AppError, AppState};

#[derive(Debug, Serialize)]
pub struct ReloadResponse {
    pub players: usize,
    pub nights: usize,
}

/// HTTP handler for a full reload of the canonical collection
///
/// POST /reload
/// Discards locally held state in favour of whatever the store has
#[instrument(name = "reload", skip(state))]
pub async fn reload(
    State(state): State<AppState>,
    Extension(access): Extension<Access>,
) -> Result<Json<ReloadResponse>, AppError> {
    access.require_editor("reload data")?;

    let fresh = match SeasonBook::load(state.store.as_ref()).await {
        Ok(book) => book,
        Err(e) => {
            warn!(error = %e, "Reload failed");
            state.notifier.error(format!("Failed to load data: {}", e));
            return Err(e.into());
        }
    };

    let response = ReloadResponse {
        players: fresh.players().len(),
        nights: fresh.nights().len(),
    };
    *state.book.write().await = fresh;

    info!(
        players = response.players,
        nights = response.nights,
        "Season reloaded"
    );
    Ok(Json(response))
}
