use axum::{extract::State, Json};
use tracing::instrument;

use super::Notification;
use crate::shared::AppState;

/// GET /notifications
///
/// Hands out pending notifications once, oldest first
#[instrument(name = "notifications", skip(state))]
pub async fn pending(State(state): State<AppState>) -> Json<Vec<Notification>> {
    Json(state.notifier.drain())
}
