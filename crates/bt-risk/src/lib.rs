//! Normalizes strategy stop intent into a structured `StopSpec`, resolves
//! stop distance, sizes positions under the equity-percent R model, and
//! applies guardrails with safe/strict enforcement modes. The hardest
//! subsystem in this workspace: every rejection path returns ordinary data
//! (`RejectedDecision`), never an `Error` — a rejected signal is an expected
//! outcome of a normal run, not a failure of the run itself.

mod engine;
mod indicator;
mod types;

pub use engine::{apply_guardrails, evaluate_entry_signal, normalize_stop_spec, resolve_stop_distance, risk_amount, size_position};
pub use indicator::{AtrRegistry, WilderAtr};
pub use types::*;
