pub mod handlers;
pub mod models;
pub mod service;

pub use models::{Game, GameId, GameOutcome, Night, NightId, Side, Teams};
pub use service::{NewNight, NightService, NightSummary, NightTotalsRow};
