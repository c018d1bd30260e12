use std::collections::BTreeMap;

use serde::Serialize;

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RunStatusCode {
    Pass,
    Fail,
}

/// `run_status.json`. Written unconditionally — on success by
/// [`crate::write_run_status`] after every other artifact, and on a fatal
/// error by [`crate::write_run_status_failure`] with everything else left
/// `None`/empty — this file is always written, even on exception.
#[derive(Debug, Clone, Serialize)]
pub struct RunStatus {
    pub schema_version: u32,
    pub status: RunStatusCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub traceback: Option<String>,
    pub run_id: String,
    pub execution_profile: String,
    pub effective_execution: serde_json::Value,
    pub spread_mode: String,
    pub intrabar_mode: String,
    pub stop_resolution: String,
    pub used_legacy_stop_proxy: bool,
    pub r_metrics_valid: bool,
    pub stop_resolution_counts: BTreeMap<String, u64>,
    pub notes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_contract: Option<String>,
}

/// `performance.json`.
#[derive(Debug, Clone, Serialize)]
pub struct PerformanceReport {
    pub schema_version: u32,
    pub final_equity: i64,
    pub gross_pnl: i64,
    pub net_pnl: i64,
    pub fee_total: i64,
    pub slippage_total: i64,
    pub spread_total: i64,
    pub fee_drag_pct: f64,
    pub slippage_drag_pct: f64,
    pub spread_drag_pct: f64,
    pub cagr: f64,
    pub sharpe: f64,
    pub max_drawdown_pct: f64,
}
