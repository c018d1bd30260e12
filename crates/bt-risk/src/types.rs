use std::fmt;

use bt_config::StopResolutionMode;
use bt_data::Side;
use bt_strategy::StopSpecKind;

pub const MICROS_SCALE: i64 = 1_000_000;

/// Only `MARKET` is supported (spec Non-goal: order types beyond market).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum OrderType {
    Market,
}

/// Rejection outcomes from the entry path. These are ordinary data, not
/// `Error`s: a rejected signal is an expected, every-run outcome recorded to
/// the decision stream, not a failure to propagate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RejectReason {
    StopUnresolvableStrict,
    StopUnresolvableSafeNoProxy,
    InvalidStopDirection,
    IndicatorNotReady,
    PrevBarUnavailable,
    MinStopDistance,
    SizingZeroQty,
    MaxPositions,
    NotionalCap,
    InsufficientMargin,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            RejectReason::StopUnresolvableStrict => "risk_rejected:stop_unresolvable:strict",
            RejectReason::StopUnresolvableSafeNoProxy => "risk_rejected:stop_unresolvable:safe_no_proxy",
            RejectReason::InvalidStopDirection => "risk_rejected:invalid_stop_direction",
            RejectReason::IndicatorNotReady => "risk_rejected:indicator_not_ready",
            RejectReason::PrevBarUnavailable => "risk_rejected:prev_bar_unavailable",
            RejectReason::MinStopDistance => "risk_rejected:min_stop_distance",
            RejectReason::SizingZeroQty => "risk_rejected:sizing_zero_qty",
            RejectReason::MaxPositions => "risk_rejected:max_positions",
            RejectReason::NotionalCap => "risk_rejected:notional_cap",
            RejectReason::InsufficientMargin => "risk_rejected:insufficient_margin",
        };
        write!(f, "{code}")
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RejectedDecision {
    pub ts: i64,
    pub symbol: String,
    pub side: Side,
    pub reason: RejectReason,
    pub detail: String,
}

/// Outcome of resolving a normalized `StopSpec` into a concrete distance.
#[derive(Clone, Debug, PartialEq)]
pub struct StopResolutionResult {
    pub stop_price: i64,
    pub stop_distance: i64,
    pub stop_source: StopSpecKind,
    pub is_valid: bool,
    pub used_fallback: bool,
    pub reason_code: String,
    pub details: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct OrderIntentMetadata {
    pub risk_amount: i64,
    pub stop_distance: i64,
    pub stop_source: StopSpecKind,
    pub stop_details: String,
    pub r_metrics_valid: bool,
    pub used_legacy_stop_proxy: bool,
    pub stop_resolution_mode: StopResolutionMode,
    pub delay_remaining: u32,
    pub reason_code: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct OrderIntent {
    pub ts_created: i64,
    pub symbol: String,
    pub side: Side,
    pub order_type: OrderType,
    pub qty: i64,
    pub metadata: OrderIntentMetadata,
}

impl OrderIntent {
    pub fn reduce_only(ts_created: i64, symbol: impl Into<String>, side: Side, qty: i64, delay_bars: u32) -> Self {
        debug_assert!(qty > 0);
        Self {
            ts_created,
            symbol: symbol.into(),
            side,
            order_type: OrderType::Market,
            qty,
            metadata: OrderIntentMetadata {
                risk_amount: 0,
                stop_distance: 0,
                stop_source: StopSpecKind::Explicit,
                stop_details: "reduce_only".to_string(),
                r_metrics_valid: false,
                used_legacy_stop_proxy: false,
                stop_resolution_mode: StopResolutionMode::Strict,
                delay_remaining: delay_bars,
                reason_code: "resolved_exit".to_string(),
            },
        }
    }
}
