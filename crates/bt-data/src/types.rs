use std::fmt;

pub const PRICE_SCALE: i64 = 1_000_000;
pub const QTY_SCALE: i64 = 100_000_000;

/// Trade direction, shared by every downstream crate (signals, intents,
/// fills, positions).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// +1 for BUY, -1 for SELL — the sign convention the PnL and fill-price
    /// formulas are written against.
    pub fn sign(&self) -> i64 {
        match self {
            Side::Buy => 1,
            Side::Sell => -1,
        }
    }

    pub fn opposite(&self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// One OHLCV sample at a fixed timeframe for one symbol.
///
/// Prices are stored as integer price-micros (`PRICE_SCALE`); volume as
/// integer qty-lots (`QTY_SCALE`). `ts` is a UTC epoch-second instant.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Bar {
    pub ts: i64,
    pub symbol: String,
    pub open: i64,
    pub high: i64,
    pub low: i64,
    pub close: i64,
    pub volume: i64,
}

impl Bar {
    pub fn new(ts: i64, symbol: impl Into<String>, open: i64, high: i64, low: i64, close: i64, volume: i64) -> Self {
        Self {
            ts,
            symbol: symbol.into(),
            open,
            high,
            low,
            close,
            volume,
        }
    }
}

/// A resampled higher-timeframe bar. `ts` is the UTC-floored bucket start,
/// not the bucket end — emitted only once the bucket is known closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtfBar {
    pub ts: i64,
    pub symbol: String,
    pub open: i64,
    pub high: i64,
    pub low: i64,
    pub close: i64,
    pub volume: i64,
}
