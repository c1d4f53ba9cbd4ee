use axum::{extract::State, Json};
use tracing::{info, instrument};

use super::types::{SessionRequest, SessionResponse};
use crate::shared::{AppError, AppState};

/// HTTP handler for editor sign-in
///
/// POST /session
/// Returns a bearer token granting editor access
#[instrument(name = "create_session", skip(state, request))]
pub async fn create_session(
    State(state): State<AppState>,
    Json(request): Json<SessionRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    info!("Editor sign-in requested");
    let session = state.auth.login(&request.password)?;
    Ok(Json(session))
}
