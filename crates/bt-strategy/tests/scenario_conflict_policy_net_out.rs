use bt_config::SignalConflictPolicy;
use bt_data::Side;
use bt_strategy::{resolve_signal_conflicts, Signal};

/// net_out with one exit-like signal and one opposite entry for the same
/// (ts, symbol) resolves to just the exit.
#[test]
fn exit_signal_wins_over_competing_entry_under_net_out() {
    let exit = Signal::new(120, "AAA", Side::Sell, "trend_exit", 1.0);
    let entry = Signal::new(120, "AAA", Side::Buy, "trend_entry", 0.8);

    let resolved = resolve_signal_conflicts(vec![entry, exit], SignalConflictPolicy::NetOut).unwrap();

    assert_eq!(resolved.len(), 1);
    assert!(resolved[0].is_exit());
    assert_eq!(resolved[0].side, Side::Sell);
}

#[test]
fn reject_policy_surfaces_an_actionable_error_message() {
    let a = Signal::new(0, "AAA", Side::Buy, "entry", 1.0);
    let b = Signal::new(0, "AAA", Side::Sell, "entry", 1.0);
    let err = resolve_signal_conflicts(vec![a, b], SignalConflictPolicy::Reject).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("AAA"));
    assert!(message.contains("reject"));
}
