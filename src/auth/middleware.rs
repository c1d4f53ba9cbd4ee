use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use super::types::Access;
use crate::shared::AppState;

/// Attaches the caller's [`Access`] to every request.
/// Usage: .layer(middleware::from_fn_with_state(app_state.clone(), auth::resolve_access))
/// Handlers then extract `Extension(access): Extension<Access>`.
pub async fn resolve_access(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let token = req
        .headers()
        .get("Authorization")
        .and_then(|header| header.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    let access = state.auth.resolve(token);
    debug!(?access, uri = %req.uri(), "Resolved caller access");

    req.extensions_mut().insert(access);
    next.run(req).await
}
