//! Strategy contract: a single `on_bars` hook fed a read-only context view,
//! plus the signal-conflict-policy resolution that collapses a step's raw
//! signals down to at most one per `(ts, symbol)` pair before the risk
//! engine ever sees them.

mod host;
mod types;

pub use host::resolve_signal_conflicts;
pub use types::*;
