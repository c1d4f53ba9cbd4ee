use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use tracing::{info, instrument};

use super::models::Player;
use crate::auth::Access;
use crate::shared::{AppError, AppState};

#[derive(Debug, Deserialize)]
pub struct AddPlayerRequest {
    pub name: String,
}

/// GET /players
#[instrument(name = "list_players", skip(state))]
pub async fn list_players(State(state): State<AppState>) -> Json<Vec<Player>> {
    Json(state.roster.list().await)
}

/// POST /players
#[instrument(name = "add_player", skip(state))]
pub async fn add_player(
    State(state): State<AppState>,
    Extension(access): Extension<Access>,
    Json(request): Json<AddPlayerRequest>,
) -> Result<(StatusCode, Json<Player>), AppError> {
    let player = state.roster.add_player(access, &request.name).await?;
    info!(player_id = %player.id, "Player registered via API");
    Ok((StatusCode::CREATED, Json(player)))
}

/// DELETE /players/:id
#[instrument(name = "remove_player", skip(state))]
pub async fn remove_player(
    State(state): State<AppState>,
    Extension(access): Extension<Access>,
    Path(player_id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.roster.remove_player(access, &player_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
