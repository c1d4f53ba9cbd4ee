use serde::{Deserialize, Serialize};

use crate::shared::AppError;

/// What the caller may do. Reads never check this; every mutation does.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Access {
    #[default]
    Viewer,
    Editor,
}

impl Access {
    pub fn is_editor(self) -> bool {
        matches!(self, Access::Editor)
    }

    /// Rejects the action before anything is touched when the caller is not an editor
    pub fn require_editor(self, action: &str) -> Result<(), AppError> {
        if self.is_editor() {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!("Sign in to {}", action)))
        }
    }
}

/// JWT claims for an editor token
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EditorClaims {
    pub sub: String,
    pub exp: usize, // Expiration timestamp (standard JWT claim)
    pub iat: usize, // Issued at timestamp (standard JWT claim)
}

#[derive(Debug, Deserialize)]
pub struct SessionRequest {
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct SessionResponse {
    pub token: String,
    pub expires_in_days: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn viewer_is_rejected_for_mutations() {
        assert!(Access::Editor.require_editor("log stats").is_ok());
        let result = Access::Viewer.require_editor("log stats");
        assert!(matches!(result, Err(AppError::Forbidden(msg)) if msg.contains("log stats")));
        assert_eq!(Access::default(), Access::Viewer);
    }

    #[test]
    fn test_editor_claims_serialization() {
        let claims = EditorClaims {
            sub: "editor".to_string(),
            exp: 1234567890,
            iat: 1234567800,
        };

        let json = serde_json::to_string(&claims).unwrap();
        assert!(json.contains("editor"));

        let deserialized: EditorClaims = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, claims);
    }
}
