//! Property tests for the laws that must hold for every input: transform
//! round-trips and the ledger's structural bounds.

use canvas_history::history::{HistoryLedger, Transition};
use canvas_history::{HistoryError, Snapshot, TransformKind};
use proptest::prelude::*;

// ============================================================================
// Text transforms
// ============================================================================

fn kind_strategy() -> impl Strategy<Value = TransformKind> {
    prop_oneof![
        Just(TransformKind::Plain),
        Just(TransformKind::Base64),
        Just(TransformKind::Lz4),
    ]
}

proptest! {
    #[test]
    fn every_transform_round_trips(kind in kind_strategy(), text in any::<String>()) {
        let transform = kind.build();
        let encoded = transform.encode(&text);
        prop_assert_eq!(transform.decode(&encoded).unwrap(), text);
    }

    #[test]
    fn repetitive_text_round_trips(
        kind in kind_strategy(),
        unit in "[a-z{}\":,]{1,8}",
        times in 1usize..2_000,
    ) {
        let text = unit.repeat(times);
        let transform = kind.build();
        prop_assert_eq!(transform.decode(&transform.encode(&text)).unwrap(), text);
    }
}

// ============================================================================
// History ledger
// ============================================================================

#[derive(Debug, Clone)]
enum Op {
    Record,
    Undo,
    Redo,
    Commit,
    Abort,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => Just(Op::Record),
        2 => Just(Op::Undo),
        1 => Just(Op::Redo),
        2 => Just(Op::Commit),
        1 => Just(Op::Abort),
    ]
}

fn contents(ledger: &HistoryLedger) -> Vec<String> {
    ledger.entries().map(|s| s.as_str().to_string()).collect()
}

proptest! {
    #[test]
    fn ledger_stays_within_bounds(
        capacity in 1usize..8,
        ops in proptest::collection::vec(op_strategy(), 0..200),
    ) {
        let mut ledger = HistoryLedger::new(capacity);
        let mut pending: Option<Transition> = None;
        let mut next = 0u32;

        for op in ops {
            let before = contents(&ledger);
            let cursor_before = ledger.cursor();

            match op {
                Op::Record => {
                    let snapshot = Snapshot::from(format!("s{}", next));
                    next += 1;
                    match ledger.record(snapshot.clone()) {
                        Ok(outcome) => {
                            prop_assert!(pending.is_none());
                            let after = contents(&ledger);
                            prop_assert_eq!(after.last(), Some(&snapshot.as_str().to_string()));
                            prop_assert_eq!(outcome.cursor, after.len() - 1);
                            // survivors are the tail of what was kept up to the cursor
                            let kept = cursor_before.map_or(0, |c| c + 1);
                            let survivors = &after[..after.len() - 1];
                            prop_assert!(before[..kept].ends_with(survivors));
                        }
                        Err(err) => {
                            prop_assert!(pending.is_some());
                            let is_pending = matches!(err, HistoryError::TransitionPending { .. });
                            prop_assert!(is_pending);
                            prop_assert_eq!(contents(&ledger), before);
                        }
                    }
                }
                Op::Undo | Op::Redo => {
                    let result = if matches!(op, Op::Undo) {
                        ledger.begin_undo()
                    } else {
                        ledger.begin_redo()
                    };
                    match result {
                        Ok(Some(transition)) => {
                            prop_assert!(pending.is_none());
                            prop_assert!(transition.to() < ledger.len());
                            pending = Some(transition);
                        }
                        Ok(None) => prop_assert!(pending.is_none()),
                        Err(_) => prop_assert!(pending.is_some()),
                    }
                    prop_assert_eq!(ledger.cursor(), cursor_before);
                }
                Op::Commit => {
                    if let Some(transition) = pending.take() {
                        let cursor = ledger.commit(transition.ticket()).unwrap();
                        prop_assert_eq!(cursor, transition.to());
                        prop_assert_eq!(ledger.current(), Some(transition.snapshot()));
                    }
                }
                Op::Abort => {
                    if let Some(transition) = pending.take() {
                        ledger.abort(transition.ticket()).unwrap();
                        prop_assert_eq!(ledger.cursor(), cursor_before);
                    }
                }
            }

            prop_assert!(ledger.len() <= capacity);
            match ledger.cursor() {
                Some(cursor) => prop_assert!(cursor < ledger.len()),
                None => prop_assert!(ledger.is_empty()),
            }
            prop_assert_eq!(ledger.is_transitioning(), pending.is_some());
        }
    }
}
