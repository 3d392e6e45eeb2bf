//! Cross-cutting domain validation
//!
//! Receipt validation is shared between purchase orders and order
//! schedules: both cap receipts at the outstanding quantity per line and
//! refuse a submission with no positive quantities.

use std::collections::HashMap;

use uuid::Uuid;

use crate::error::{DomainError, DomainResult};
use crate::models::{OrderScheduleLine, PoLine};
use crate::types::ReceiptRequest;

/// A line that goods can be received against
pub trait ReceivableLine {
    fn inventory_id(&self) -> Uuid;
    fn ordered_qty(&self) -> i64;
    fn received_qty(&self) -> i64;

    fn outstanding_qty(&self) -> i64 {
        self.ordered_qty() - self.received_qty()
    }
}

impl ReceivableLine for PoLine {
    fn inventory_id(&self) -> Uuid {
        self.inventory_id
    }
    fn ordered_qty(&self) -> i64 {
        self.ordered_qty
    }
    fn received_qty(&self) -> i64 {
        self.received_qty
    }
}

impl ReceivableLine for OrderScheduleLine {
    fn inventory_id(&self) -> Uuid {
        self.inventory_id
    }
    fn ordered_qty(&self) -> i64 {
        self.qty
    }
    fn received_qty(&self) -> i64 {
        self.received_qty
    }
}

/// Validate a receipt submission against the order's lines
///
/// Negative quantities fail the whole submission; zero quantities are
/// dropped and an empty remainder is an error. Receipts for the same line
/// accumulate and together may not exceed the line's outstanding
/// quantity. Returns the accepted receipts, or the first violation with
/// nothing accepted.
pub fn validate_receipts<L: ReceivableLine>(
    lines: &[L],
    receipts: &[ReceiptRequest],
    part_names: &HashMap<Uuid, String>,
) -> DomainResult<Vec<ReceiptRequest>> {
    if let Some(bad) = receipts.iter().find(|r| r.qty_received < 0) {
        return Err(DomainError::NonPositiveQuantity(bad.qty_received));
    }

    let accepted: Vec<ReceiptRequest> = receipts
        .iter()
        .filter(|r| r.qty_received > 0)
        .cloned()
        .collect();
    if accepted.is_empty() {
        return Err(DomainError::EmptyReceipt);
    }

    let mut pending: HashMap<Uuid, i64> = HashMap::new();
    for receipt in &accepted {
        *pending.entry(receipt.inventory_id).or_insert(0) += receipt.qty_received;
    }

    for (inventory_id, requested) in pending {
        let line = lines
            .iter()
            .find(|l| l.inventory_id() == inventory_id)
            .ok_or(DomainError::UnknownItem(inventory_id))?;
        if requested > line.outstanding_qty() {
            let part_name = part_names
                .get(&inventory_id)
                .cloned()
                .unwrap_or_else(|| inventory_id.to_string());
            return Err(DomainError::OverReceipt {
                part_name,
                ordered: line.ordered_qty(),
                received: line.received_qty(),
                requested,
            });
        }
    }

    Ok(accepted)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn po_line(id: Uuid, ordered: i64, received: i64) -> PoLine {
        PoLine {
            inventory_id: id,
            ordered_qty: ordered,
            received_qty: received,
            unit_cost: None,
            eta: None,
        }
    }

    fn receipt(id: Uuid, qty: i64) -> ReceiptRequest {
        ReceiptRequest {
            inventory_id: id,
            qty_received: qty,
            unit_cost: None,
        }
    }

    #[test]
    fn receipts_within_outstanding_pass() {
        let id = Uuid::new_v4();
        let lines = [po_line(id, 10, 4)];
        let accepted =
            validate_receipts(&lines, &[receipt(id, 6)], &HashMap::new()).unwrap();
        assert_eq!(accepted.len(), 1);
    }

    #[test]
    fn over_receipt_is_rejected() {
        let id = Uuid::new_v4();
        let lines = [po_line(id, 10, 0)];
        let err =
            validate_receipts(&lines, &[receipt(id, 11)], &HashMap::new()).unwrap_err();
        assert!(matches!(err, DomainError::OverReceipt { requested: 11, .. }));
    }

    #[test]
    fn split_receipts_accumulate_against_the_cap() {
        let id = Uuid::new_v4();
        let lines = [po_line(id, 10, 0)];
        let err = validate_receipts(
            &lines,
            &[receipt(id, 6), receipt(id, 6)],
            &HashMap::new(),
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::OverReceipt { requested: 12, .. }));
    }

    #[test]
    fn zero_quantities_are_dropped_and_empty_set_refused() {
        let id = Uuid::new_v4();
        let lines = [po_line(id, 10, 0)];
        let err = validate_receipts(&lines, &[receipt(id, 0)], &HashMap::new()).unwrap_err();
        assert_eq!(err, DomainError::EmptyReceipt);
    }

    #[test]
    fn a_negative_quantity_fails_the_whole_submission() {
        let id = Uuid::new_v4();
        let lines = [po_line(id, 10, 0)];
        let err = validate_receipts(
            &lines,
            &[receipt(id, -5), receipt(id, 3)],
            &HashMap::new(),
        )
        .unwrap_err();
        assert_eq!(err, DomainError::NonPositiveQuantity(-5));
    }
}
