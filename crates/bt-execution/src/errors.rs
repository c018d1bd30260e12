use std::fmt;

/// Execution-boundary errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionError {
    /// A fill price computation would not fit in `i64` cash-micros. Always
    /// indicates a data-quality error upstream (e.g. a corrupt bar).
    PriceOverflow { symbol: String, ts: i64 },
    /// A non-market order reached the gateway. `bt_risk::OrderType` is
    /// currently `Market`-only, so this can't yet be constructed from this
    /// workspace's own call sites, but the variant is kept so the error
    /// taxonomy stays total if `OrderType` ever grows a second variant —
    /// a misconfigured strategy is the only way to reach it.
    UnsupportedOrderType { symbol: String, ts: i64 },
}

impl fmt::Display for ExecutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionError::PriceOverflow { symbol, ts } => {
                write!(f, "{symbol}@{ts}: fill price computation overflowed i64")
            }
            ExecutionError::UnsupportedOrderType { symbol, ts } => {
                write!(f, "{symbol}@{ts}: non-market order reached the execution gateway")
            }
        }
    }
}

impl std::error::Error for ExecutionError {}
