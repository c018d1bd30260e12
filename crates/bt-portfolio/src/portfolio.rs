//! Portfolio facade: owns positions and cash state, applies fills, marks to
//! market, and executes forced liquidation.

use std::collections::BTreeMap;

use bt_config::ExecutionConfig;
use bt_data::{Bar, Side};
use bt_execution::{build_fill, Fill, FillMetadata};
use bt_strategy::PortfolioSnapshot;

use crate::accounting::apply_fill as apply_fill_inner;
use crate::errors::PortfolioError;
use crate::metrics::{free_margin, mark_to_market, recompute_margin_used, snapshot};
use crate::types::{PortfolioState, Position, Trade};

pub struct Portfolio {
    positions: BTreeMap<(String, Side), Position>,
    state: PortfolioState,
    trades: Vec<Trade>,
}

impl Portfolio {
    pub fn new(starting_equity: i64) -> Self {
        Self {
            positions: BTreeMap::new(),
            state: PortfolioState::new(starting_equity),
            trades: Vec::new(),
        }
    }

    pub fn state(&self) -> &PortfolioState {
        &self.state
    }

    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    pub fn open_positions(&self) -> impl Iterator<Item = &Position> {
        self.positions.values()
    }

    pub fn snapshot(&self) -> PortfolioSnapshot {
        snapshot(&self.positions, &self.state)
    }

    pub fn free_margin(&self) -> i64 {
        free_margin(&self.state)
    }

    /// Applies a single fill: opens/extends, or reduces/closes/flips, then
    /// refreshes `margin_used` from the resulting position set.
    pub fn apply_fill(&mut self, fill: &Fill) -> Result<(), PortfolioError> {
        if let Some(trade) = apply_fill_inner(&mut self.positions, &mut self.state, fill)? {
            self.trades.push(trade);
        }
        self.state.margin_used = recompute_margin_used(&self.positions);
        self.validate_positions()
    }

    /// Marks every open position to the step's closing prices and updates
    /// `unrealized_pnl`/`equity` per the mark-to-market identity.
    pub fn mark_to_market(&mut self, bars: &BTreeMap<String, Bar>) -> Result<(), PortfolioError> {
        mark_to_market(&mut self.positions, &mut self.state, bars);
        self.validate_positions()?;
        self.validate_equity_identity()
    }

    /// Every open position must carry a strictly positive quantity.
    fn validate_positions(&self) -> Result<(), PortfolioError> {
        for pos in self.positions.values() {
            if pos.qty <= 0 {
                return Err(PortfolioError::NegativeQtyInvariant { symbol: pos.symbol.clone(), qty: pos.qty });
            }
        }
        Ok(())
    }

    /// `equity` must agree with `cash + realized_pnl_cum + unrealized_pnl`.
    /// Checked, so a silent `i64` overflow surfaces here as a fatal error
    /// instead of corrupting downstream output. Only meaningful right after
    /// `mark_to_market`, which is the sole place `equity` is assigned.
    fn validate_equity_identity(&self) -> Result<(), PortfolioError> {
        let expected = self
            .state
            .cash
            .checked_add(self.state.realized_pnl_cum)
            .and_then(|v| v.checked_add(self.state.unrealized_pnl));
        match expected {
            Some(expected) if expected == self.state.equity => Ok(()),
            Some(expected) => Err(PortfolioError::EquityIdentityViolation { equity: self.state.equity, expected }),
            None => Err(PortfolioError::EquityIdentityViolation { equity: self.state.equity, expected: i64::MAX }),
        }
    }

    /// Closes every open position that has a bar this step, using the
    /// execution pipeline's intrabar price. Covers both forced-liquidation
    /// triggers, `negative_free_margin` and `end_of_run`. Positions whose
    /// symbol has no bar this step are left open and retried on a later
    /// step the caller chooses to re-check.
    pub fn liquidate_all(
        &mut self,
        cfg: &ExecutionConfig,
        bars: &BTreeMap<String, Bar>,
        ts: i64,
        reason_code: &str,
    ) -> Result<Vec<Fill>, PortfolioError> {
        let targets: Vec<(String, Side, i64)> = self
            .positions
            .values()
            .filter(|p| bars.contains_key(&p.symbol))
            .map(|p| (p.symbol.clone(), p.side, p.qty))
            .collect();

        let mut fills = Vec::with_capacity(targets.len());
        for (symbol, side, qty) in targets {
            let bar = &bars[&symbol];
            let metadata = self
                .positions
                .get(&(symbol.clone(), side))
                .ok_or_else(|| PortfolioError::UnknownPosition { symbol: symbol.clone(), side: side.to_string() })?
                .metadata
                .clone();
            let fill = build_fill(
                cfg,
                ts,
                &symbol,
                side.opposite(),
                qty,
                bar,
                FillMetadata {
                    ts_created: ts,
                    intrabar_raw_price: bar.close,
                    risk: bt_risk::OrderIntentMetadata {
                        reason_code: reason_code.to_string(),
                        ..metadata
                    },
                },
            )
            .map_err(|_| PortfolioError::Overflow { symbol: symbol.clone(), ts })?;
            self.apply_fill(&fill)?;
            fills.push(fill);
        }
        Ok(fills)
    }
}
