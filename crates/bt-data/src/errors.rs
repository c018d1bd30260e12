use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataError {
    Io(String),
    Parse { line: usize, reason: String },
    MissingColumn(&'static str),
    NonUtcTimestamp { line: usize, raw: String },
    NonMonotonicTimestamp { symbol: String, prev_ts: i64, ts: i64 },
    DuplicateTimestamp { symbol: String, ts: i64 },
    InvalidOhlc { symbol: String, ts: i64, reason: String },
    NegativeVolume { symbol: String, ts: i64 },
    ManifestParse(String),
    ManifestSchemaUnknown,
    BaseTimeframeNotOneMinute { symbol: String, ts: i64 },
    SymbolAliasConflict,
}

impl fmt::Display for DataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataError::Io(msg) => write!(f, "data io error: {msg}"),
            DataError::Parse { line, reason } => write!(f, "parse error at line {line}: {reason}"),
            DataError::MissingColumn(c) => write!(f, "missing required column: {c}"),
            DataError::NonUtcTimestamp { line, raw } => {
                write!(f, "timestamp at line {line} is not a UTC instant: {raw}")
            }
            DataError::NonMonotonicTimestamp { symbol, prev_ts, ts } => write!(
                f,
                "{symbol}: timestamps must be strictly increasing, got {ts} after {prev_ts}"
            ),
            DataError::DuplicateTimestamp { symbol, ts } => {
                write!(f, "{symbol}: duplicate timestamp {ts}")
            }
            DataError::InvalidOhlc { symbol, ts, reason } => {
                write!(f, "{symbol}@{ts}: invalid OHLC ({reason})")
            }
            DataError::NegativeVolume { symbol, ts } => write!(f, "{symbol}@{ts}: negative volume"),
            DataError::ManifestParse(msg) => write!(f, "manifest parse error: {msg}"),
            DataError::ManifestSchemaUnknown => write!(f, "manifest does not match a known schema (strict v1 or legacy per_symbol_parquet)"),
            DataError::BaseTimeframeNotOneMinute { symbol, ts } => write!(
                f,
                "{symbol}: base feed must be 1-minute UTC, timestamp {ts} is not minute-aligned"
            ),
            DataError::SymbolAliasConflict => write!(f, "data.symbols_subset and data.symbols were both given with different values"),
        }
    }
}

impl std::error::Error for DataError {}
