use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionProfile {
    Tier1,
    Tier2,
    Tier3,
    Custom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntrabarMode {
    WorstCase,
    BestCase,
    Midpoint,
}

impl Default for IntrabarMode {
    fn default() -> Self {
        IntrabarMode::WorstCase
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpreadMode {
    FixedBps,
    None,
}

impl Default for SpreadMode {
    fn default() -> Self {
        SpreadMode::FixedBps
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopResolutionMode {
    Safe,
    Strict,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HybridPolicy {
    Wider,
    Tighter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalConflictPolicy {
    Reject,
    FirstWins,
    LastWins,
    NetOut,
}

impl Default for SignalConflictPolicy {
    fn default() -> Self {
        SignalConflictPolicy::Reject
    }
}

/// `(maker_fee, taker_fee, slippage_bps, spread_bps, delay_bars)` — the five
/// cost parameters a tier preset fixes or `custom` requires explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierValues {
    pub maker_fee: f64,
    pub taker_fee: f64,
    pub slippage_bps: f64,
    pub spread_bps: f64,
    pub delay_bars: u32,
}

pub const TIER1: TierValues = TierValues {
    maker_fee: 0.0,
    taker_fee: 0.0004,
    slippage_bps: 0.5,
    spread_bps: 0.0,
    delay_bars: 0,
};
pub const TIER2: TierValues = TierValues {
    maker_fee: 0.0,
    taker_fee: 0.0006,
    slippage_bps: 2.0,
    spread_bps: 1.0,
    delay_bars: 1,
};
pub const TIER3: TierValues = TierValues {
    maker_fee: 0.0,
    taker_fee: 0.0008,
    slippage_bps: 5.0,
    spread_bps: 3.0,
    delay_bars: 1,
};

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ExecutionConfig {
    pub profile: ExecutionProfile,
    pub maker_fee: f64,
    pub taker_fee: f64,
    pub slippage_bps: f64,
    pub spread_bps: f64,
    pub delay_bars: u32,
    pub intrabar_mode: IntrabarMode,
    pub spread_mode: SpreadMode,
}

// Tier-preset cost fields are implied by `profile` and re-resolving a
// resolved config must be a fixed point (they would otherwise look like
// an explicit override of the preset), so they're only emitted for
// `profile: custom`.
impl Serialize for ExecutionConfig {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;
        let field_count = if self.profile == ExecutionProfile::Custom { 7 } else { 2 };
        let mut state = serializer.serialize_struct("ExecutionConfig", field_count)?;
        state.serialize_field("profile", &self.profile)?;
        if self.profile == ExecutionProfile::Custom {
            state.serialize_field("maker_fee", &self.maker_fee)?;
            state.serialize_field("taker_fee", &self.taker_fee)?;
            state.serialize_field("slippage_bps", &self.slippage_bps)?;
            state.serialize_field("spread_bps", &self.spread_bps)?;
            state.serialize_field("delay_bars", &self.delay_bars)?;
        }
        state.serialize_field("intrabar_mode", &self.intrabar_mode)?;
        state.serialize_field("spread_mode", &self.spread_mode)?;
        state.end()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskConfig {
    pub stop_resolution_mode: StopResolutionMode,
    pub allow_legacy_proxy: bool,
    pub r_per_trade: f64,
    pub min_stop_distance: f64,
    pub min_stop_distance_pct: f64,
    pub max_notional_pct_equity: f64,
    pub maintenance_free_margin_pct: f64,
    pub max_positions: u32,
    pub contract_lot_size: f64,
    pub hybrid_policy: HybridPolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateRange {
    /// RFC3339 UTC instant, inclusive.
    pub start: String,
    /// RFC3339 UTC instant, exclusive.
    pub end: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataConfig {
    pub symbols_subset: Option<Vec<String>>,
    pub max_symbols: Option<usize>,
    pub date_range: Option<DateRange>,
    pub row_limit_per_symbol: Option<usize>,
    pub chunksize: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrategyConfig {
    pub signal_conflict_policy: SignalConflictPolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HtfResamplerConfig {
    pub timeframes: Vec<String>,
    pub strict: bool,
}

impl Default for HtfResamplerConfig {
    fn default() -> Self {
        Self {
            timeframes: Vec::new(),
            strict: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkConfig {
    pub enabled: bool,
}

/// Starting account state. Not itself one of the other five config
/// namespaces (`execution.*`/`risk.*`/`data.*`/`strategy.*`/
/// `htf_resampler.*`), but every run needs a starting equity from
/// somewhere; `portfolio.starting_equity` in price-micros is that source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PortfolioConfig {
    pub starting_equity: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedConfig {
    pub execution: ExecutionConfig,
    pub risk: RiskConfig,
    pub data: DataConfig,
    pub strategy: StrategyConfig,
    pub htf_resampler: HtfResamplerConfig,
    pub benchmark: BenchmarkConfig,
    pub portfolio: PortfolioConfig,
    /// SHA-256 of the canonical pre-resolution merged JSON; provenance only,
    /// never consumed by simulation logic.
    pub config_hash: String,
}
