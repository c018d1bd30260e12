use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortfolioError {
    /// A fill's notional or PnL arithmetic would not fit in `i64`.
    Overflow { symbol: String, ts: i64 },
    /// A position's quantity went negative, which the accounting logic
    /// should never permit.
    NegativeQtyInvariant { symbol: String, qty: i64 },
    /// `equity` diverged from `cash + realized_pnl_cum + unrealized_pnl`.
    EquityIdentityViolation { equity: i64, expected: i64 },
    /// A caller referenced a position key that isn't open.
    UnknownPosition { symbol: String, side: String },
    /// A fill arrived with `qty <= 0`.
    NonPositiveFillQty { symbol: String, qty: i64 },
}

impl fmt::Display for PortfolioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortfolioError::Overflow { symbol, ts } => {
                write!(f, "{symbol}@{ts}: portfolio arithmetic overflowed i64")
            }
            PortfolioError::NegativeQtyInvariant { symbol, qty } => {
                write!(f, "{symbol}: position quantity went negative ({qty})")
            }
            PortfolioError::EquityIdentityViolation { equity, expected } => write!(
                f,
                "equity identity violated: equity={equity} but cash+realized_pnl_cum+unrealized_pnl={expected}"
            ),
            PortfolioError::UnknownPosition { symbol, side } => {
                write!(f, "{symbol}/{side}: no open position at this key")
            }
            PortfolioError::NonPositiveFillQty { symbol, qty } => {
                write!(f, "{symbol}: fill qty must be positive, got {qty}")
            }
        }
    }
}

impl std::error::Error for PortfolioError {}
