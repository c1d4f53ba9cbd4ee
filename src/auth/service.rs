use tracing::{info, instrument, warn};

use super::{
    token::{TokenConfig, EDITOR_SUBJECT},
    types::{Access, SessionResponse},
};
use crate::shared::AppError;

/// Issues editor tokens and resolves bearer tokens into an [`Access`] level
pub struct AuthService {
    token_config: TokenConfig,
    editor_password: Option<String>,
}

impl AuthService {
    pub fn new(token_config: TokenConfig, editor_password: Option<String>) -> Self {
        Self {
            token_config,
            editor_password,
        }
    }

    #[instrument(skip(self, password))]
    pub fn login(&self, password: &str) -> Result<SessionResponse, AppError> {
        let Some(expected) = self.editor_password.as_deref() else {
            warn!("Editor login attempted but no editor password is configured");
            return Err(AppError::Unauthorized(
                "Editor sign-in is disabled".to_string(),
            ));
        };

        if password != expected {
            warn!("Editor login rejected");
            return Err(AppError::Unauthorized("Invalid credentials".to_string()));
        }

        let token = self.token_config.create_token()?;
        info!("Editor signed in");
        Ok(SessionResponse {
            token,
            expires_in_days: self.token_config.expiration_days,
        })
    }

    /// A missing or invalid token leaves the caller a viewer
    pub fn resolve(&self, token: Option<&str>) -> Access {
        let Some(token) = token else {
            return Access::Viewer;
        };
        match self.token_config.validate_token(token) {
            Ok(claims) if claims.sub == EDITOR_SUBJECT => Access::Editor,
            Ok(claims) => {
                warn!(sub = %claims.sub, "Token subject is not an editor");
                Access::Viewer
            }
            Err(e) => {
                warn!("Ignoring invalid bearer token: {}", e);
                Access::Viewer
            }
        }
    }
}
