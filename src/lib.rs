// Library crate for the pickup-basketball stats service
// This file exposes the public API for the binary and integration tests

pub mod auth;
pub mod config;
pub mod night;
pub mod notify;
pub mod roster;
pub mod routes;
pub mod season;
pub mod shared;
pub mod stats;
pub mod store;
pub mod tracking;

// Re-export commonly used types for easier access in tests
pub use config::Config;
pub use night::{Game, Night, NightService, Side, Teams};
pub use notify::{Notification, NotificationLevel, Notifier};
pub use roster::{Player, RosterService};
pub use routes::router;
pub use season::{SeasonBook, SharedBook};
pub use shared::{AppError, AppState};
pub use stats::{StatKey, StatLine};
pub use store::{InMemoryStatStore, PostgresStatStore, StatStore, StoreError};
pub use tracking::{PersistenceSink, StoreSink, TrackingService};
