mod errors;
mod types;
mod writer;

pub use errors::ArtifactError;
pub use types::{PerformanceReport, RunStatus, RunStatusCode, SCHEMA_VERSION};
pub use writer::{
    write_all, write_config_used, write_data_scope_json, write_decisions_jsonl, write_equity_csv,
    write_fills_jsonl, write_performance_by_bucket_csv, write_performance_json, write_run_status,
    write_run_status_failure, write_trades_csv,
};
