use std::collections::BTreeMap;
use std::fmt;

use bt_data::{Bar, HtfBar, Side};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum HybridPolicy {
    Wider,
    Tighter,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StopSpecKind {
    Explicit,
    Structural,
    Atr,
    Hybrid,
    LegacyProxy,
}

/// Normalized stop intent. `kind` selects which of the other fields are
/// meaningful; unused fields are left `None`/empty for the chosen kind.
#[derive(Clone, Debug, PartialEq)]
pub struct StopSpec {
    pub kind: StopSpecKind,
    pub stop_price: Option<i64>,
    pub structural_stop: Option<i64>,
    pub atr_multiple: Option<f64>,
    pub atr_indicator: Option<String>,
    pub hybrid_policy: Option<HybridPolicy>,
    pub hybrid_components: Vec<StopSpec>,
    /// Free-text provenance, e.g. `"signal.metadata.stop_spec"` or
    /// `"legacy_proxy:prev_bar"`; carried through to decision logs.
    pub raw_source: String,
}

impl StopSpec {
    pub fn explicit(stop_price: i64, raw_source: impl Into<String>) -> Self {
        Self {
            kind: StopSpecKind::Explicit,
            stop_price: Some(stop_price),
            structural_stop: None,
            atr_multiple: None,
            atr_indicator: None,
            hybrid_policy: None,
            hybrid_components: Vec::new(),
            raw_source: raw_source.into(),
        }
    }
}

/// Everything a strategy may attach to a [`Signal`] beyond the required
/// fields. No field is required; the risk engine treats absence as "no stop
/// intent" and enforces its safe/strict policy accordingly.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SignalMetadata {
    pub stop_price: Option<i64>,
    pub stop_spec: Option<StopSpec>,
    pub is_exit: bool,
    pub reduce_only: bool,
}

/// Strategy output: an intent only, never an order. `confidence` is carried
/// through for diagnostics and is not otherwise interpreted by the core.
#[derive(Clone, Debug, PartialEq)]
pub struct Signal {
    pub ts: i64,
    pub symbol: String,
    pub side: Side,
    pub signal_type: String,
    pub confidence: f64,
    pub metadata: SignalMetadata,
}

impl Signal {
    pub fn new(ts: i64, symbol: impl Into<String>, side: Side, signal_type: impl Into<String>, confidence: f64) -> Self {
        Self {
            ts,
            symbol: symbol.into(),
            side,
            signal_type: signal_type.into(),
            confidence,
            metadata: SignalMetadata::default(),
        }
    }

    pub fn is_exit(&self) -> bool {
        self.signal_type.ends_with("_exit") || self.metadata.is_exit || self.metadata.reduce_only
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct OpenPositionSummary {
    pub symbol: String,
    pub side: Side,
    pub qty: i64,
    pub avg_price: i64,
}

/// Read-only snapshot of portfolio state as of the start of the current
/// timestep, before this step's fills and mark-to-market are applied.
#[derive(Clone, Debug, PartialEq)]
pub struct PortfolioSnapshot {
    pub equity: i64,
    pub cash: i64,
    pub margin_used: i64,
    pub open_positions: Vec<OpenPositionSummary>,
}

/// Read access to whatever indicators the run has registered. Indicators
/// themselves (e.g. Wilder ATR) are owned and updated outside this crate;
/// strategies only ever read through this trait.
pub trait IndicatorRegistry {
    fn read(&self, name: &str, symbol: &str) -> Option<f64>;
}

/// Bounded lookback access to already-observed base-timeframe bars.
pub trait BarHistory {
    fn lookback(&self, symbol: &str, n: usize) -> Vec<Bar>;
}

/// Read-only view into engine state a strategy is allowed to observe. A
/// strategy must never mutate anything reachable from this view.
pub struct StrategyContext<'a> {
    pub portfolio: &'a PortfolioSnapshot,
    pub indicators: &'a dyn IndicatorRegistry,
    /// `htf_bars[timeframe][symbol]` — the most recently emitted HTF bar per
    /// target timeframe and symbol.
    pub htf_bars: &'a BTreeMap<String, BTreeMap<String, HtfBar>>,
    pub history: &'a dyn BarHistory,
}

/// Contract every strategy implements. `tradeable_universe` is the subset of
/// symbols the engine currently considers eligible for new entries (it may
/// be narrower than `bars_by_symbol`'s keys).
pub trait Strategy {
    fn on_bars(
        &mut self,
        ts: i64,
        bars_by_symbol: &BTreeMap<String, Bar>,
        tradeable_universe: &[String],
        ctx: &StrategyContext,
    ) -> Vec<Signal>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StrategyContractError {
    DuplicateSignalUnderReject { ts: i64, symbol: String, count: usize },
    ConflictingMetadata { ts: i64, symbol: String, detail: String },
    EmptySymbol { ts: i64 },
    InvalidConfidence { ts: i64, symbol: String, confidence: String },
}

impl fmt::Display for StrategyContractError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyContractError::DuplicateSignalUnderReject { ts, symbol, count } => write!(
                f,
                "signal_conflict:reject: {count} signals for {symbol} at ts={ts}, signal_conflict_policy=reject requires exactly one"
            ),
            StrategyContractError::ConflictingMetadata { ts, symbol, detail } => {
                write!(f, "signal_contract:conflicting_metadata: {symbol} at ts={ts}: {detail}")
            }
            StrategyContractError::EmptySymbol { ts } => {
                write!(f, "signal_contract:empty_symbol: signal at ts={ts} has an empty symbol")
            }
            StrategyContractError::InvalidConfidence { ts, symbol, confidence } => write!(
                f,
                "signal_contract:invalid_confidence: {symbol} at ts={ts}: confidence={confidence} is not in [0, 1]"
            ),
        }
    }
}

impl std::error::Error for StrategyContractError {}

/// Per-signal contract checks, applied to every signal a strategy emits
/// before conflict resolution ever groups them.
pub fn validate_signal(signal: &Signal) -> Result<(), StrategyContractError> {
    if signal.symbol.is_empty() {
        return Err(StrategyContractError::EmptySymbol { ts: signal.ts });
    }
    if !(0.0..=1.0).contains(&signal.confidence) {
        return Err(StrategyContractError::InvalidConfidence {
            ts: signal.ts,
            symbol: signal.symbol.clone(),
            confidence: signal.confidence.to_string(),
        });
    }
    if signal.metadata.stop_price.is_some() && signal.metadata.stop_spec.is_some() {
        return Err(StrategyContractError::ConflictingMetadata {
            ts: signal.ts,
            symbol: signal.symbol.clone(),
            detail: "metadata.stop_price and metadata.stop_spec must not both be set".to_string(),
        });
    }
    Ok(())
}
