//! Procurement tests
//!
//! PR and PO state machines, conversion rules, receipt caps, and the full
//! low-stock to closed-order flow.

use std::collections::HashMap;

use chrono::Utc;
use shared::{
    merge_pr_lines, plan_lines, po_lines_from_pr, po_supplier_from_pr, recompute_po_status,
    validate_receipts, DomainError, ItemSnapshot, LineRequest, PoLine, PoStatus, PrLine,
    PrStatus, PurchaseRequest, ReceiptRequest, TxnType,
};
use uuid::Uuid;

fn pr_with_status(status: PrStatus) -> PurchaseRequest {
    PurchaseRequest {
        id: Uuid::new_v4(),
        pr_no: "PR-000001".to_string(),
        created_at: Utc::now(),
        created_by: "storekeeper".to_string(),
        status,
        lines: vec![PrLine {
            inventory_id: Uuid::new_v4(),
            requested_qty: 13,
            notes: None,
            suggested_supplier_id: None,
        }],
    }
}

fn po_line(ordered: i64, received: i64) -> PoLine {
    PoLine {
        inventory_id: Uuid::new_v4(),
        ordered_qty: ordered,
        received_qty: received,
        unit_cost: None,
        eta: None,
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[test]
fn approval_accepts_only_draft() {
    let mut pr = pr_with_status(PrStatus::Draft);
    pr.approve().unwrap();
    assert_eq!(pr.status, PrStatus::Approved);

    for status in [
        PrStatus::Submitted,
        PrStatus::Approved,
        PrStatus::Rejected,
        PrStatus::Cancelled,
    ] {
        let mut pr = pr_with_status(status);
        assert!(pr.approve().is_err());
    }
}

#[test]
fn conversion_stamps_draft_approved_and_passes_approved_through() {
    let mut draft = pr_with_status(PrStatus::Draft);
    draft.approve_for_conversion().unwrap();
    assert_eq!(draft.status, PrStatus::Approved);

    let mut approved = pr_with_status(PrStatus::Approved);
    approved.approve_for_conversion().unwrap();
    assert_eq!(approved.status, PrStatus::Approved);

    for status in [PrStatus::Rejected, PrStatus::Cancelled, PrStatus::Submitted] {
        let mut pr = pr_with_status(status);
        assert!(pr.approve_for_conversion().is_err());
    }
}

#[test]
fn converted_lines_carry_quantities_with_nothing_received() {
    let pr = pr_with_status(PrStatus::Approved);
    let lines = po_lines_from_pr(&pr);
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].ordered_qty, 13);
    assert_eq!(lines[0].received_qty, 0);
}

#[test]
fn supplier_comes_from_the_first_line_or_the_fallback() {
    let fallback = Uuid::new_v4();
    let supplier = Uuid::new_v4();

    let mut pr = pr_with_status(PrStatus::Draft);
    assert_eq!(po_supplier_from_pr(&pr, fallback), fallback);

    pr.lines[0].suggested_supplier_id = Some(supplier);
    assert_eq!(po_supplier_from_pr(&pr, fallback), supplier);

    // A suggestion on a later line is ignored; only the first line counts
    pr.lines[0].suggested_supplier_id = None;
    pr.lines.push(PrLine {
        inventory_id: Uuid::new_v4(),
        requested_qty: 1,
        notes: None,
        suggested_supplier_id: Some(supplier),
    });
    assert_eq!(po_supplier_from_pr(&pr, fallback), fallback);
}

#[test]
fn po_closes_only_when_every_line_is_fully_received() {
    let mixed = [po_line(10, 10), po_line(5, 3)];
    assert_eq!(recompute_po_status(&mixed), PoStatus::PartiallyReceived);

    let complete = [po_line(10, 10), po_line(5, 5)];
    assert_eq!(recompute_po_status(&complete), PoStatus::Closed);
}

#[test]
fn over_receipt_is_rejected_with_context() {
    let line = po_line(10, 0);
    let id = line.inventory_id;
    let names = HashMap::from([(id, "Condenser Coil".to_string())]);
    let err = validate_receipts(
        &[line],
        &[ReceiptRequest {
            inventory_id: id,
            qty_received: 11,
            unit_cost: None,
        }],
        &names,
    )
    .unwrap_err();

    assert_eq!(
        err,
        DomainError::OverReceipt {
            part_name: "Condenser Coil".to_string(),
            ordered: 10,
            received: 0,
            requested: 11,
        }
    );
}

#[test]
fn negative_receipt_quantities_fail_the_whole_submission() {
    let line = po_line(10, 0);
    let id = line.inventory_id;
    let receipt = |qty| ReceiptRequest {
        inventory_id: id,
        qty_received: qty,
        unit_cost: None,
    };

    // The valid receipt alongside must not slip through
    let err = validate_receipts(&[line], &[receipt(-5), receipt(3)], &HashMap::new());
    assert_eq!(err.unwrap_err(), DomainError::NonPositiveQuantity(-5));
}

#[test]
fn duplicate_request_lines_merge_into_one() {
    let belt = Uuid::new_v4();
    let filter = Uuid::new_v4();
    let supplier = Uuid::new_v4();
    let line = |id, qty, supplier| PrLine {
        inventory_id: id,
        requested_qty: qty,
        notes: None,
        suggested_supplier_id: supplier,
    };

    let merged = merge_pr_lines(vec![
        line(belt, 4, Some(supplier)),
        line(filter, 2, None),
        line(belt, 3, None),
    ]);

    assert_eq!(merged.len(), 2);
    assert_eq!(merged[0].inventory_id, belt);
    assert_eq!(merged[0].requested_qty, 7);
    // The first occurrence keeps its supplier suggestion
    assert_eq!(merged[0].suggested_supplier_id, Some(supplier));
    assert_eq!(merged[1].inventory_id, filter);
    assert_eq!(merged[1].requested_qty, 2);
}

#[test]
fn split_receipts_may_fill_but_not_exceed_the_line() {
    let line = po_line(10, 4);
    let id = line.inventory_id;
    let receipt = |qty| ReceiptRequest {
        inventory_id: id,
        qty_received: qty,
        unit_cost: None,
    };

    let exact = validate_receipts(&[line.clone()], &[receipt(3), receipt(3)], &HashMap::new());
    assert!(exact.is_ok());

    let over = validate_receipts(&[line], &[receipt(3), receipt(4)], &HashMap::new());
    assert!(over.is_err());
}

/// The whole advisory-to-closure flow on one part: low stock triggers a
/// suggestion, the suggestion becomes a PR, the PR converts to a PO, and
/// receiving the full quantity closes the order and restocks the part.
#[test]
fn reorder_flow_from_suggestion_to_closed_order() {
    use shared::{InventoryItem, PartStatus};

    let inventory_id = Uuid::new_v4();
    let part = InventoryItem {
        id: inventory_id,
        building: "Block A".to_string(),
        room: None,
        tag_no: None,
        installation_type: None,
        system_type: None,
        brand: None,
        equipment_model: None,
        part_category: None,
        part_name: "Chiller Gasket".to_string(),
        part_model: None,
        unit: "pcs".to_string(),
        status: PartStatus::Spare,
        criticality: None,
        image_base64: None,
        specs: None,
        warranty_expiry: None,
        remark: None,
        min_stock: 0,
        reorder_point: Some(10),
        reorder_qty: None,
        preferred_supplier_id: None,
        location_bin: None,
        quantity_on_hand: 2,
        last_updated: Utc::now(),
        row_version: 1,
    };

    // Advisory: 2 on hand against a reorder point of 10 suggests 13
    assert!(part.is_low_stock());
    let suggested = part.suggested_reorder_qty();
    assert_eq!(suggested, 13);

    // PR carries the suggestion; conversion builds the order
    let mut pr = PurchaseRequest {
        id: Uuid::new_v4(),
        pr_no: "PR-000001".to_string(),
        created_at: Utc::now(),
        created_by: "storekeeper".to_string(),
        status: PrStatus::Draft,
        lines: vec![PrLine {
            inventory_id,
            requested_qty: suggested,
            notes: None,
            suggested_supplier_id: None,
        }],
    };
    pr.approve_for_conversion().unwrap();
    let mut po_lines = po_lines_from_pr(&pr);
    assert_eq!(po_lines[0].ordered_qty, 13);

    // Receive the full quantity
    let receipts = [ReceiptRequest {
        inventory_id,
        qty_received: 13,
        unit_cost: None,
    }];
    let accepted = validate_receipts(&po_lines, &receipts, &HashMap::new()).unwrap();
    for receipt in &accepted {
        for line in po_lines.iter_mut() {
            if line.inventory_id == receipt.inventory_id {
                line.received_qty += receipt.qty_received;
            }
        }
    }
    assert_eq!(recompute_po_status(&po_lines), PoStatus::Closed);

    // The matching stock movement restocks the part
    let stock = HashMap::from([(
        inventory_id,
        ItemSnapshot {
            part_name: part.part_name.clone(),
            quantity_on_hand: 2,
        },
    )]);
    let planned = plan_lines(
        TxnType::Receive,
        &[LineRequest {
            inventory_id,
            qty: 13,
            unit_cost: None,
        }],
        &stock,
    )
    .unwrap();
    assert_eq!(planned[0].before_qty, 2);
    assert_eq!(planned[0].after_qty, 15);
}
