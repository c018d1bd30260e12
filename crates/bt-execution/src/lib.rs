//! Turns accepted order intents into fills: a delay queue plus the
//! intrabar/spread/slippage/fee cost pipeline.

mod engine;
mod errors;
mod types;

pub use engine::{build_fill, ExecutionEngine};
pub use errors::ExecutionError;
pub use types::{Fill, FillMetadata};
