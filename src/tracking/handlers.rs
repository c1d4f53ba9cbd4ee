use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::service::{NewGame, TrackingView};
use crate::auth::Access;
use crate::night::handlers::{WinnerRequest, WinnerResponse};
use crate::night::models::{Game, GameId, Night};
use crate::roster::models::PlayerId;
use crate::shared::{AppError, AppState};
use crate::stats::{StatKey, StatLine};

#[derive(Debug, Deserialize)]
pub struct StatDeltaRequest {
    pub game_id: GameId,
    pub player_id: PlayerId,
    pub stat: StatKey,
    #[serde(default = "one")]
    pub delta: i32,
}

fn one() -> i32 {
    1
}

#[derive(Debug, Serialize)]
pub struct StatDeltaResponse {
    pub game_id: GameId,
    pub player_id: PlayerId,
    pub line: StatLine,
}

#[derive(Debug, Serialize)]
pub struct RenumberedGame {
    pub game_id: GameId,
    pub number: u32,
}

/// GET /tracking
#[instrument(name = "tracking_view", skip(state))]
pub async fn current(State(state): State<AppState>) -> Result<Json<TrackingView>, AppError> {
    state
        .tracking
        .view()
        .await
        .map(Json)
        .ok_or_else(|| AppError::NotFound("No night is being tracked".to_string()))
}

/// POST /tracking/resume/:night_id
#[instrument(name = "resume_night", skip(state))]
pub async fn resume(
    State(state): State<AppState>,
    Extension(access): Extension<Access>,
    Path(night_id): Path<String>,
) -> Result<Json<Night>, AppError> {
    Ok(Json(state.tracking.resume(access, &night_id).await?))
}

/// POST /tracking/games
#[instrument(name = "new_game", skip(state, request))]
pub async fn new_game(
    State(state): State<AppState>,
    Extension(access): Extension<Access>,
    Json(request): Json<NewGame>,
) -> Result<(StatusCode, Json<Game>), AppError> {
    let game = state.tracking.new_game(access, request).await?;
    Ok((StatusCode::CREATED, Json(game)))
}

/// DELETE /tracking/games/:game_id
///
/// Responds once the game is gone; renumbering finishes in the background
#[instrument(name = "delete_game", skip(state))]
pub async fn delete_game(
    State(state): State<AppState>,
    Extension(access): Extension<Access>,
    Path(game_id): Path<String>,
) -> Result<Json<Vec<RenumberedGame>>, AppError> {
    let removal = state.tracking.delete_game(access, &game_id).await?;
    Ok(Json(
        removal
            .renumbered
            .into_iter()
            .map(|(game_id, number)| RenumberedGame { game_id, number })
            .collect(),
    ))
}

/// POST /tracking/stat
///
/// Returns the new line without waiting for it to be stored
#[instrument(name = "log_stat", skip(state))]
pub async fn log_stat(
    State(state): State<AppState>,
    Extension(access): Extension<Access>,
    Json(request): Json<StatDeltaRequest>,
) -> Result<Json<StatDeltaResponse>, AppError> {
    let delta = state
        .tracking
        .apply_stat_delta(
            access,
            &request.game_id,
            &request.player_id,
            request.stat,
            request.delta,
        )
        .await?;
    debug!(line = ?delta.line, "Stat applied");

    Ok(Json(StatDeltaResponse {
        game_id: request.game_id,
        player_id: request.player_id,
        line: delta.line,
    }))
}

/// POST /tracking/games/:game_id/winner
#[instrument(name = "set_winner", skip(state))]
pub async fn set_winner(
    State(state): State<AppState>,
    Extension(access): Extension<Access>,
    Path(game_id): Path<String>,
    Json(request): Json<WinnerRequest>,
) -> Result<Json<WinnerResponse>, AppError> {
    let winner = state
        .tracking
        .set_winner(access, &game_id, request.side)
        .await?;
    Ok(Json(WinnerResponse { game_id, winner }))
}

/// POST /tracking/save
#[instrument(name = "save_night", skip(state))]
pub async fn save(
    State(state): State<AppState>,
    Extension(access): Extension<Access>,
) -> Result<Json<Night>, AppError> {
    Ok(Json(state.tracking.save_night(access).await?))
}

/// POST /tracking/discard
#[instrument(name = "discard_tracking", skip(state))]
pub async fn discard(
    State(state): State<AppState>,
    Extension(access): Extension<Access>,
) -> Result<StatusCode, AppError> {
    state.tracking.discard(access).await?;
    Ok(StatusCode::NO_CONTENT)
}
