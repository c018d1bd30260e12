use bt_data::Side;
use bt_risk::OrderIntentMetadata;

/// Everything about a fill's provenance that a writer or test wants to
/// inspect beyond the five cost-pipeline outputs. Carries the originating
/// intent's risk metadata through unchanged so `trades.csv`'s R-multiple
/// columns can be computed downstream in `bt-portfolio` without reaching
/// back into the risk engine.
#[derive(Clone, Debug, PartialEq)]
pub struct FillMetadata {
    pub ts_created: i64,
    pub intrabar_raw_price: i64,
    pub risk: OrderIntentMetadata,
}

/// A realized execution. `price` is the final executed price after the
/// intrabar + spread + slippage pipeline; `fee_cost`, `slippage_cost`,
/// `spread_cost` are each in cash-micros (same scale as
/// `bt_data::PRICE_SCALE`), recorded separately.
#[derive(Clone, Debug, PartialEq)]
pub struct Fill {
    pub ts_filled: i64,
    pub symbol: String,
    pub side: Side,
    pub qty: i64,
    pub price: i64,
    pub fee_cost: i64,
    pub slippage_cost: i64,
    pub spread_cost: i64,
    pub metadata: FillMetadata,
}
