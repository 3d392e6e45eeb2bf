//! WebAssembly module for the Spare Parts Management Platform
//!
//! Provides client-side computation for:
//! - Low-stock and reorder checks
//! - Order schedule display states
//! - Offline receipt validation

use std::collections::HashMap;

use chrono::NaiveDate;
use wasm_bindgen::prelude::*;

// Re-export shared types for use in JavaScript
pub use shared::models::*;
pub use shared::types::*;
pub use shared::validation::*;

/// Whether a part is at or below its effective reorder point
///
/// The effective reorder point is the configured reorder point when it is
/// above zero, otherwise the minimum stock level.
#[wasm_bindgen]
pub fn is_low_stock(quantity_on_hand: i64, min_stock: i64, reorder_point: i64) -> bool {
    let effective = if reorder_point > 0 {
        reorder_point
    } else {
        min_stock
    };
    quantity_on_hand <= effective
}

/// Quantity to propose when replenishing a low-stock part
///
/// Uses the configured reorder quantity when above zero, otherwise the
/// deficit against the effective reorder point plus a fixed buffer.
#[wasm_bindgen]
pub fn suggested_reorder_qty(
    quantity_on_hand: i64,
    min_stock: i64,
    reorder_point: i64,
    reorder_qty: i64,
) -> i64 {
    if reorder_qty > 0 {
        return reorder_qty;
    }
    let effective = if reorder_point > 0 {
        reorder_point
    } else {
        min_stock
    };
    effective - quantity_on_hand + shared::REORDER_BUFFER
}

/// Display state of an order schedule evaluated against a date
///
/// Dates are ISO `YYYY-MM-DD` strings; the schedule is passed as JSON.
#[wasm_bindgen]
pub fn schedule_display_state(schedule_json: &str, today: &str) -> Result<String, JsValue> {
    let schedule: OrderSchedule = serde_json::from_str(schedule_json)
        .map_err(|e| JsValue::from_str(&format!("Invalid schedule JSON: {}", e)))?;
    let today = NaiveDate::parse_from_str(today, "%Y-%m-%d")
        .map_err(|e| JsValue::from_str(&format!("Invalid date: {}", e)))?;

    Ok(schedule.display_state(today).to_string())
}

/// Validate a receipt submission against a purchase order's lines
///
/// Both arguments are JSON arrays. Returns the accepted receipts as JSON,
/// or the first violation as an error message.
#[wasm_bindgen]
pub fn validate_po_receipts(lines_json: &str, receipts_json: &str) -> Result<String, JsValue> {
    let lines: Vec<PoLine> = serde_json::from_str(lines_json)
        .map_err(|e| JsValue::from_str(&format!("Invalid lines JSON: {}", e)))?;
    let receipts: Vec<ReceiptRequest> = serde_json::from_str(receipts_json)
        .map_err(|e| JsValue::from_str(&format!("Invalid receipts JSON: {}", e)))?;

    let accepted = validate_receipts(&lines, &receipts, &HashMap::new())
        .map_err(|e| JsValue::from_str(&e.to_string()))?;

    serde_json::to_string(&accepted)
        .map_err(|e| JsValue::from_str(&format!("Serialization failed: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn low_stock_falls_back_to_min_stock() {
        assert!(is_low_stock(4, 5, 0));
        assert!(!is_low_stock(6, 5, 0));
        // A configured reorder point overrides min stock
        assert!(is_low_stock(8, 5, 10));
    }

    #[test]
    fn suggested_qty_prefers_configured_reorder_qty() {
        assert_eq!(suggested_reorder_qty(2, 0, 10, 20), 20);
        // No configured quantity: deficit plus buffer
        assert_eq!(suggested_reorder_qty(2, 0, 10, 0), 13);
    }

    #[test]
    fn display_state_from_json() {
        let schedule = serde_json::json!({
            "id": Uuid::new_v4(),
            "scheduledDate": "2025-09-01",
            "createdBy": "tester",
            "supplierId": Uuid::new_v4(),
            "remark": "",
            "status": "SCHEDULED",
            "lines": [{ "inventoryId": Uuid::new_v4(), "qty": 5 }],
            "createdAt": "2025-08-01T00:00:00Z",
            "lastUpdated": "2025-08-01T00:00:00Z"
        });
        let state = schedule_display_state(&schedule.to_string(), "2025-08-29").unwrap();
        assert_eq!(state, "Due Soon");
    }

    #[test]
    fn over_receipt_surfaces_as_error() {
        let id = Uuid::new_v4();
        let lines = serde_json::json!([
            { "inventoryId": id, "orderedQty": 10, "receivedQty": 0 }
        ]);
        let receipts = serde_json::json!([
            { "inventoryId": id, "qtyReceived": 11 }
        ]);
        let err = validate_po_receipts(&lines.to_string(), &receipts.to_string());
        assert!(err.is_err());
    }
}
