use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

use crate::auth::AuthService;
use crate::night::service::NightService;
use crate::notify::Notifier;
use crate::roster::service::RosterService;
use crate::season::SharedBook;
use crate::store::{StatStore, StoreError};
use crate::tracking::{PersistenceSink, TrackingService};

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn StatStore>,
    pub book: SharedBook,
    pub notifier: Notifier,
    pub auth: Arc<AuthService>,
    pub roster: Arc<RosterService>,
    pub nights: Arc<NightService>,
    pub tracking: Arc<TrackingService>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn StatStore>,
        sink: Arc<dyn PersistenceSink>,
        book: SharedBook,
        notifier: Notifier,
        auth: Arc<AuthService>,
    ) -> Self {
        let roster = Arc::new(RosterService::new(
            store.clone(),
            book.clone(),
            notifier.clone(),
        ));
        let nights = Arc::new(NightService::new(
            store.clone(),
            book.clone(),
            notifier.clone(),
        ));
        let tracking = Arc::new(TrackingService::new(
            store.clone(),
            sink,
            book.clone(),
            notifier.clone(),
        ));

        Self {
            store,
            book,
            notifier,
            auth,
            roster,
            nights,
            tracking,
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Persistence failed: {0}")]
    Persistence(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("JWT error: {0}")]
    JwtError(String),

    #[error("Internal server error")]
    Internal,
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(msg) => AppError::NotFound(msg),
            StoreError::Conflict(msg) => AppError::Validation(msg),
            other => AppError::Persistence(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Persistence(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Persistence error: {}", msg),
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::JwtError(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(json!({
            "error": error_message
        }));

        (status, body).into_response()
    }
}
