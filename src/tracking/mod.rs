// Live editing of one night at a time.
//
// Stat deltas land in the session immediately and are persisted in the
// background through a `PersistenceSink`; failures are reported as
// notifications and never rolled back.

pub mod handlers;
mod service;
mod session;
mod sink;

pub use service::{
    GameRemoval, Lineup, NewGame, PendingWrite, StatDelta, TrackingService, TrackingView,
};
pub use session::EditingSession;
pub use sink::{PersistenceSink, StoreSink};
