//! The orchestration core: wires the data feed, strategy, risk engine,
//! execution model, and portfolio together into a single per-timestep
//! loop, and exposes it as one `run` call.

mod engine;
mod errors;
mod types;

pub use engine::run;
pub use errors::EngineError;
pub use types::{DecisionRow, EquityRow, RunOutcome};
