use std::collections::BTreeMap;

use bt_config::{
    BenchmarkConfig, DataConfig, ExecutionConfig, ExecutionProfile, HtfResamplerConfig, HybridPolicy,
    IntrabarMode, PortfolioConfig, ResolvedConfig, RiskConfig, SignalConflictPolicy, SpreadMode,
    StopResolutionMode, StrategyConfig, TIER2,
};
use bt_data::{Bar, PRICE_SCALE};
use bt_strategy::{Signal, Strategy, StrategyContext};

pub fn bar(ts: i64, symbol: &str, open: f64, high: f64, low: f64, close: f64, volume: i64) -> Bar {
    Bar::new(
        ts,
        symbol,
        (open * PRICE_SCALE as f64).round() as i64,
        (high * PRICE_SCALE as f64).round() as i64,
        (low * PRICE_SCALE as f64).round() as i64,
        (close * PRICE_SCALE as f64).round() as i64,
        volume,
    )
}

/// A `ResolvedConfig` with tier2 costs, strict stop resolution, and
/// `reject` conflict policy; tests override whatever field the scenario
/// cares about.
pub fn base_cfg(starting_equity_dollars: f64) -> ResolvedConfig {
    ResolvedConfig {
        execution: ExecutionConfig {
            profile: ExecutionProfile::Tier2,
            maker_fee: TIER2.maker_fee,
            taker_fee: TIER2.taker_fee,
            slippage_bps: TIER2.slippage_bps,
            spread_bps: TIER2.spread_bps,
            delay_bars: TIER2.delay_bars,
            intrabar_mode: IntrabarMode::WorstCase,
            spread_mode: SpreadMode::FixedBps,
        },
        risk: RiskConfig {
            stop_resolution_mode: StopResolutionMode::Strict,
            allow_legacy_proxy: false,
            r_per_trade: 0.01,
            min_stop_distance: 0.0,
            min_stop_distance_pct: 0.0,
            max_notional_pct_equity: 1.0,
            maintenance_free_margin_pct: 0.0,
            max_positions: 10,
            contract_lot_size: 0.00000001,
            hybrid_policy: HybridPolicy::Wider,
        },
        data: DataConfig::default(),
        strategy: StrategyConfig { signal_conflict_policy: SignalConflictPolicy::Reject },
        htf_resampler: HtfResamplerConfig::default(),
        benchmark: BenchmarkConfig::default(),
        portfolio: PortfolioConfig { starting_equity: (starting_equity_dollars * PRICE_SCALE as f64).round() as i64 },
        config_hash: "test".to_string(),
    }
}

/// A strategy whose entire behavior is a fixed `ts -> signals` script,
/// emitted exactly once each and never again, for deterministic scenario
/// tests that need to inject a signal at a specific timestep.
pub struct ScriptedStrategy {
    script: BTreeMap<i64, Vec<Signal>>,
}

impl ScriptedStrategy {
    pub fn new(script: Vec<(i64, Vec<Signal>)>) -> Self {
        Self { script: script.into_iter().collect() }
    }
}

impl Strategy for ScriptedStrategy {
    fn on_bars(
        &mut self,
        ts: i64,
        _bars_by_symbol: &BTreeMap<String, Bar>,
        _tradeable_universe: &[String],
        _ctx: &StrategyContext,
    ) -> Vec<Signal> {
        self.script.remove(&ts).unwrap_or_default()
    }
}
