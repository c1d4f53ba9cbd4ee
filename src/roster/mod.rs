pub mod handlers;
pub mod models;
pub mod service;

pub use models::{Player, PlayerId};
pub use service::RosterService;
