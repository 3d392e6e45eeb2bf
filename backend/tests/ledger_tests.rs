//! Stock ledger tests
//!
//! Pure planning rules: non-negative stock, before/after bookkeeping,
//! reversal symmetry and amendment semantics.

use std::collections::HashMap;

use proptest::prelude::*;
use shared::{
    plan_amendment, plan_lines, plan_reversal, reversal_deltas, DomainError, ItemSnapshot,
    LineRequest, TxnType,
};
use uuid::Uuid;

fn snapshot(qty: i64) -> (Uuid, HashMap<Uuid, ItemSnapshot>) {
    let id = Uuid::new_v4();
    let stock = HashMap::from([(
        id,
        ItemSnapshot {
            part_name: "AHU Fan Belt".to_string(),
            quantity_on_hand: qty,
        },
    )]);
    (id, stock)
}

fn request(id: Uuid, qty: i64) -> LineRequest {
    LineRequest {
        inventory_id: id,
        qty,
        unit_cost: None,
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[test]
fn issue_reduces_and_receive_increases() {
    let (id, stock) = snapshot(10);

    let issued = plan_lines(TxnType::Issue, &[request(id, 4)], &stock).unwrap();
    assert_eq!(issued[0].after_qty, 6);

    let received = plan_lines(TxnType::Receive, &[request(id, 4)], &stock).unwrap();
    assert_eq!(received[0].after_qty, 14);
}

#[test]
fn adjustment_is_additive() {
    let (id, stock) = snapshot(3);
    let planned = plan_lines(TxnType::Adjustment, &[request(id, 2)], &stock).unwrap();
    assert_eq!(planned[0].after_qty, 5);
}

#[test]
fn overdraw_fails_with_available_quantity() {
    let (id, stock) = snapshot(3);
    let err = plan_lines(TxnType::Issue, &[request(id, 4)], &stock).unwrap_err();
    assert_eq!(
        err,
        DomainError::InsufficientStock {
            part_name: "AHU Fan Belt".to_string(),
            available: 3,
        }
    );
}

#[test]
fn unknown_item_is_rejected() {
    let (_, stock) = snapshot(3);
    let stranger = Uuid::new_v4();
    let err = plan_lines(TxnType::Issue, &[request(stranger, 1)], &stock).unwrap_err();
    assert_eq!(err, DomainError::UnknownItem(stranger));
}

#[test]
fn zero_and_negative_quantities_are_rejected() {
    let (id, stock) = snapshot(3);
    for qty in [0, -1] {
        let err = plan_lines(TxnType::Receive, &[request(id, qty)], &stock).unwrap_err();
        assert_eq!(err, DomainError::NonPositiveQuantity(qty));
    }
}

#[test]
fn failed_plan_yields_nothing() {
    // Second line overdraws; the valid first line must not survive
    let (id, stock) = snapshot(5);
    let result = plan_lines(TxnType::Issue, &[request(id, 3), request(id, 3)], &stock);
    assert!(result.is_err());
}

#[test]
fn amendment_replans_against_restored_stock() {
    // Stock 10, original ISSUE of 8 leaves 2. Amending the issue down to
    // 5 must be planned against the restored 10, not the current 2.
    let (id, stock_before) = snapshot(10);
    let original = plan_lines(TxnType::Issue, &[request(id, 8)], &stock_before).unwrap();

    let stock_now = HashMap::from([(
        id,
        ItemSnapshot {
            part_name: "AHU Fan Belt".to_string(),
            quantity_on_hand: 2,
        },
    )]);
    let amended =
        plan_amendment(TxnType::Issue, &original, TxnType::Issue, &[request(id, 5)], &stock_now)
            .unwrap();
    assert_eq!(amended[0].before_qty, 10);
    assert_eq!(amended[0].after_qty, 5);
}

#[test]
fn amendment_can_change_transaction_type() {
    let (id, stock_before) = snapshot(10);
    let original = plan_lines(TxnType::Issue, &[request(id, 4)], &stock_before).unwrap();

    let stock_now = HashMap::from([(
        id,
        ItemSnapshot {
            part_name: "AHU Fan Belt".to_string(),
            quantity_on_hand: 6,
        },
    )]);
    let amended = plan_amendment(
        TxnType::Issue,
        &original,
        TxnType::Return,
        &[request(id, 4)],
        &stock_now,
    )
    .unwrap();
    // Reversal restores 10, then the return adds 4
    assert_eq!(amended[0].after_qty, 14);
}

#[test]
fn amending_a_consumed_receipt_is_rejected() {
    // A receive of 10 was committed, then 8 were issued, leaving 2.
    // Undoing the receive would take stock to -8, so the amendment fails
    // before anything is planned.
    let (id, stock_before) = snapshot(0);
    let original = plan_lines(TxnType::Receive, &[request(id, 10)], &stock_before).unwrap();

    let stock_now = HashMap::from([(
        id,
        ItemSnapshot {
            part_name: "AHU Fan Belt".to_string(),
            quantity_on_hand: 2,
        },
    )]);
    let err = plan_amendment(
        TxnType::Receive,
        &original,
        TxnType::Receive,
        &[request(id, 5)],
        &stock_now,
    )
    .unwrap_err();
    assert_eq!(
        err,
        DomainError::InsufficientStock {
            part_name: "AHU Fan Belt".to_string(),
            available: 2,
        }
    );
}

#[test]
fn reversing_a_consumed_receipt_is_rejected() {
    let (id, stock_before) = snapshot(0);
    let original = plan_lines(TxnType::Receive, &[request(id, 10)], &stock_before).unwrap();

    let stock_now = HashMap::from([(
        id,
        ItemSnapshot {
            part_name: "AHU Fan Belt".to_string(),
            quantity_on_hand: 2,
        },
    )]);
    assert!(plan_reversal(TxnType::Receive, &original, &stock_now).is_err());

    // With the full quantity still on hand the exact inverse goes through
    let stock_full = HashMap::from([(
        id,
        ItemSnapshot {
            part_name: "AHU Fan Belt".to_string(),
            quantity_on_hand: 10,
        },
    )]);
    let deltas = plan_reversal(TxnType::Receive, &original, &stock_full).unwrap();
    assert_eq!(deltas, vec![(id, -10)]);
}

// ============================================================================
// Property Tests
// ============================================================================

fn any_txn_type() -> impl Strategy<Value = TxnType> {
    prop_oneof![
        Just(TxnType::Issue),
        Just(TxnType::Return),
        Just(TxnType::Receive),
        Just(TxnType::Adjustment),
    ]
}

proptest! {
    /// A successful plan never takes stock below zero
    #[test]
    fn planned_quantities_stay_non_negative(
        txn_type in any_txn_type(),
        start in 0i64..1000,
        quantities in proptest::collection::vec(1i64..200, 1..6),
    ) {
        let (id, stock) = snapshot(start);
        let requests: Vec<LineRequest> =
            quantities.iter().map(|&q| request(id, q)).collect();

        if let Ok(planned) = plan_lines(txn_type, &requests, &stock) {
            for line in &planned {
                prop_assert!(line.before_qty >= 0);
                prop_assert!(line.after_qty >= 0);
                prop_assert_eq!(
                    line.after_qty,
                    line.before_qty + txn_type.direction() * line.qty
                );
            }
        }
    }

    /// Reversal deltas exactly undo a committed plan
    #[test]
    fn reversal_restores_the_original_quantity(
        txn_type in any_txn_type(),
        start in 0i64..1000,
        quantities in proptest::collection::vec(1i64..200, 1..6),
    ) {
        let (id, stock) = snapshot(start);
        let requests: Vec<LineRequest> =
            quantities.iter().map(|&q| request(id, q)).collect();

        if let Ok(planned) = plan_lines(txn_type, &requests, &stock) {
            let final_qty = planned.last().map(|l| l.after_qty).unwrap_or(start);
            let reversed: i64 = reversal_deltas(txn_type, &planned)
                .iter()
                .map(|(_, delta)| delta)
                .sum();
            prop_assert_eq!(final_qty + reversed, start);
        }
    }

    /// Amending a transaction to itself reproduces the original plan
    #[test]
    fn no_op_amendment_is_idempotent(
        txn_type in any_txn_type(),
        start in 0i64..1000,
        quantities in proptest::collection::vec(1i64..200, 1..6),
    ) {
        let (id, stock) = snapshot(start);
        let requests: Vec<LineRequest> =
            quantities.iter().map(|&q| request(id, q)).collect();

        if let Ok(original) = plan_lines(txn_type, &requests, &stock) {
            // Current stock reflects the committed original
            let current = original.last().map(|l| l.after_qty).unwrap_or(start);
            let stock_now = HashMap::from([(
                id,
                ItemSnapshot {
                    part_name: "AHU Fan Belt".to_string(),
                    quantity_on_hand: current,
                },
            )]);
            let amended =
                plan_amendment(txn_type, &original, txn_type, &requests, &stock_now).unwrap();
            for (a, b) in amended.iter().zip(original.iter()) {
                prop_assert_eq!(a.before_qty, b.before_qty);
                prop_assert_eq!(a.after_qty, b.after_qty);
            }
        }
    }
}
