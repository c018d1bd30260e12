use std::collections::BTreeMap;

use bt_config::SignalConflictPolicy;

use crate::types::{validate_signal, Signal, StrategyContractError};

/// Collapses a step's raw signals down to at most one per `(ts, symbol)`
/// pair, per the configured conflict policy. Signals for
/// different `(ts, symbol)` pairs are unaffected by each other. Order within
/// each group is preserved as received from the strategy, which is what
/// "first"/"last" mean below.
pub fn resolve_signal_conflicts(
    signals: Vec<Signal>,
    policy: SignalConflictPolicy,
) -> Result<Vec<Signal>, StrategyContractError> {
    let mut groups: BTreeMap<(i64, String), Vec<Signal>> = BTreeMap::new();
    let mut order: Vec<(i64, String)> = Vec::new();

    for signal in signals {
        validate_signal(&signal)?;
        let key = (signal.ts, signal.symbol.clone());
        if !groups.contains_key(&key) {
            order.push(key.clone());
        }
        groups.entry(key).or_default().push(signal);
    }

    let mut resolved = Vec::with_capacity(order.len());
    for key in order {
        let group = groups.remove(&key).unwrap();
        if group.len() == 1 {
            resolved.push(group.into_iter().next().unwrap());
            continue;
        }

        match policy {
            SignalConflictPolicy::Reject => {
                return Err(StrategyContractError::DuplicateSignalUnderReject {
                    ts: key.0,
                    symbol: key.1,
                    count: group.len(),
                });
            }
            SignalConflictPolicy::FirstWins => {
                resolved.push(group.into_iter().next().unwrap());
            }
            SignalConflictPolicy::LastWins => {
                resolved.push(group.into_iter().last().unwrap());
            }
            SignalConflictPolicy::NetOut => {
                if let Some(signal) = net_out(group) {
                    resolved.push(signal);
                }
            }
        }
    }

    Ok(resolved)
}

/// `net_out`: any exit-like signal outranks entries (keep the last exit);
/// otherwise, opposite-side entries cancel to a no-op, and same-side entries
/// keep the last one.
fn net_out(group: Vec<Signal>) -> Option<Signal> {
    let exits: Vec<Signal> = group.iter().filter(|s| s.is_exit()).cloned().collect();
    if !exits.is_empty() {
        return exits.into_iter().last();
    }

    let first_side = group[0].side;
    let mixed_sides = group.iter().any(|s| s.side != first_side);
    if mixed_sides {
        return None;
    }
    group.into_iter().last()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bt_data::Side;

    fn entry(ts: i64, symbol: &str, side: Side) -> Signal {
        Signal::new(ts, symbol, side, "entry", 1.0)
    }

    fn exit(ts: i64, symbol: &str, side: Side) -> Signal {
        Signal::new(ts, symbol, side, "entry_exit", 1.0)
    }

    #[test]
    fn single_signal_per_pair_passes_through_under_any_policy() {
        let signals = vec![entry(0, "AAA", Side::Buy)];
        let resolved = resolve_signal_conflicts(signals, SignalConflictPolicy::Reject).unwrap();
        assert_eq!(resolved.len(), 1);
    }

    #[test]
    fn reject_policy_errors_on_multiple_signals_for_same_pair() {
        let signals = vec![entry(0, "AAA", Side::Buy), entry(0, "AAA", Side::Sell)];
        let err = resolve_signal_conflicts(signals, SignalConflictPolicy::Reject).unwrap_err();
        assert!(matches!(err, StrategyContractError::DuplicateSignalUnderReject { count: 2, .. }));
    }

    #[test]
    fn first_wins_keeps_first_signal() {
        let signals = vec![entry(0, "AAA", Side::Buy), entry(0, "AAA", Side::Sell)];
        let resolved = resolve_signal_conflicts(signals, SignalConflictPolicy::FirstWins).unwrap();
        assert_eq!(resolved[0].side, Side::Buy);
    }

    #[test]
    fn last_wins_keeps_last_signal() {
        let signals = vec![entry(0, "AAA", Side::Buy), entry(0, "AAA", Side::Sell)];
        let resolved = resolve_signal_conflicts(signals, SignalConflictPolicy::LastWins).unwrap();
        assert_eq!(resolved[0].side, Side::Sell);
    }

    #[test]
    fn net_out_cancels_opposite_side_entries() {
        let signals = vec![entry(0, "AAA", Side::Buy), entry(0, "AAA", Side::Sell)];
        let resolved = resolve_signal_conflicts(signals, SignalConflictPolicy::NetOut).unwrap();
        assert!(resolved.is_empty());
    }

    #[test]
    fn net_out_keeps_last_of_same_side_entries() {
        let mut a = entry(0, "AAA", Side::Buy);
        a.confidence = 0.1;
        let mut b = entry(0, "AAA", Side::Buy);
        b.confidence = 0.9;
        let resolved = resolve_signal_conflicts(vec![a, b], SignalConflictPolicy::NetOut).unwrap();
        assert_eq!(resolved[0].confidence, 0.9);
    }

    #[test]
    fn net_out_exit_outranks_entries_and_keeps_last_exit() {
        let signals = vec![
            entry(0, "AAA", Side::Buy),
            exit(0, "AAA", Side::Sell),
            exit(0, "AAA", Side::Buy),
        ];
        let resolved = resolve_signal_conflicts(signals, SignalConflictPolicy::NetOut).unwrap();
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].side, Side::Buy);
        assert!(resolved[0].is_exit());
    }

    #[test]
    fn empty_symbol_is_rejected() {
        let signals = vec![Signal::new(0, "", Side::Buy, "entry", 1.0)];
        let err = resolve_signal_conflicts(signals, SignalConflictPolicy::Reject).unwrap_err();
        assert!(matches!(err, StrategyContractError::EmptySymbol { .. }));
    }

    #[test]
    fn confidence_outside_unit_interval_is_rejected() {
        let signals = vec![Signal::new(0, "AAA", Side::Buy, "entry", 1.5)];
        let err = resolve_signal_conflicts(signals, SignalConflictPolicy::Reject).unwrap_err();
        assert!(matches!(err, StrategyContractError::InvalidConfidence { .. }));
    }

    #[test]
    fn stop_price_and_stop_spec_both_set_is_conflicting_metadata() {
        let mut s = Signal::new(0, "AAA", Side::Buy, "entry", 1.0);
        s.metadata.stop_price = Some(99 * 1_000_000);
        s.metadata.stop_spec = Some(crate::types::StopSpec::explicit(99 * 1_000_000, "test"));
        let err = resolve_signal_conflicts(vec![s], SignalConflictPolicy::Reject).unwrap_err();
        assert!(matches!(err, StrategyContractError::ConflictingMetadata { .. }));
    }

    #[test]
    fn different_symbols_and_timestamps_are_independent_groups() {
        let signals = vec![entry(0, "AAA", Side::Buy), entry(0, "BBB", Side::Sell), entry(60, "AAA", Side::Sell)];
        let resolved = resolve_signal_conflicts(signals, SignalConflictPolicy::Reject).unwrap();
        assert_eq!(resolved.len(), 3);
    }
}
