use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use super::models::{GameId, Night, Side};
use super::service::{NewNight, NightSummary, NightTotalsRow};
use crate::auth::Access;
use crate::shared::{AppError, AppState};

#[derive(Debug, Deserialize)]
pub struct WinnerRequest {
    pub side: Side,
}

#[derive(Debug, Serialize)]
pub struct WinnerResponse {
    pub game_id: GameId,
    pub winner: Option<Side>,
}

/// GET /nights
#[instrument(name = "list_nights", skip(state))]
pub async fn list_nights(State(state): State<AppState>) -> Json<Vec<NightSummary>> {
    Json(state.nights.summaries().await)
}

/// HTTP handler for starting a night
///
/// POST /nights
/// Creates the night and opens it for tracking
#[instrument(name = "begin_night", skip(state, request))]
pub async fn begin_night(
    State(state): State<AppState>,
    Extension(access): Extension<Access>,
    Json(request): Json<NewNight>,
) -> Result<(StatusCode, Json<Night>), AppError> {
    let night = state.nights.begin_night(access, request).await?;
    state.tracking.open(access, night.clone()).await?;

    info!(night_id = %night.id, "Night opened for tracking");
    Ok((StatusCode::CREATED, Json(night)))
}

/// DELETE /nights/:id
#[instrument(name = "delete_night", skip(state))]
pub async fn delete_night(
    State(state): State<AppState>,
    Extension(access): Extension<Access>,
    Path(night_id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.nights.delete_night(access, &night_id).await?;
    state.tracking.close_if_active(&night_id).await;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /nights/:id/totals
#[instrument(name = "night_totals", skip(state))]
pub async fn night_totals(
    State(state): State<AppState>,
    Path(night_id): Path<String>,
) -> Result<Json<Vec<NightTotalsRow>>, AppError> {
    Ok(Json(state.nights.totals(&night_id).await?))
}

/// POST /nights/:id/games/:game_id/winner
#[instrument(name = "toggle_saved_winner", skip(state))]
pub async fn toggle_winner(
    State(state): State<AppState>,
    Extension(access): Extension<Access>,
    Path((night_id, game_id)): Path<(String, String)>,
    Json(request): Json<WinnerRequest>,
) -> Result<Json<WinnerResponse>, AppError> {
    // The open session owns the tracked night until it is saved
    let winner = if state.tracking.is_tracking(&night_id).await {
        state
            .tracking
            .set_winner(access, &game_id, request.side)
            .await?
    } else {
        state
            .nights
            .toggle_winner(access, &night_id, &game_id, request.side)
            .await?
    };
    Ok(Json(WinnerResponse { game_id, winner }))
}
