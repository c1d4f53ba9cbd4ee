// Editor capability gate
//
// Anyone may read. Mutations require `Access::Editor`, granted to callers
// presenting a token issued against the configured editor password.

pub use handlers::create_session;
pub use middleware::resolve_access;
pub use service::AuthService;
pub use types::{Access, EditorClaims, SessionRequest, SessionResponse};

mod handlers;
mod middleware;
mod service;
pub mod token;
mod types;
