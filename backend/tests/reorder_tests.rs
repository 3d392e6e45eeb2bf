//! Low-stock detection and reorder advisory tests

use chrono::Utc;
use proptest::prelude::*;
use shared::{low_stock_items, reorder_suggestions, InventoryItem, PartStatus, REORDER_BUFFER};
use uuid::Uuid;

fn item(name: &str, qoh: i64, min_stock: i64, reorder_point: i64, reorder_qty: i64) -> InventoryItem {
    InventoryItem {
        id: Uuid::new_v4(),
        building: "Block A".to_string(),
        room: None,
        tag_no: None,
        installation_type: None,
        system_type: None,
        brand: None,
        equipment_model: None,
        part_category: Some("ACMV".to_string()),
        part_name: name.to_string(),
        part_model: None,
        unit: "pcs".to_string(),
        status: PartStatus::Spare,
        criticality: None,
        image_base64: None,
        specs: None,
        warranty_expiry: None,
        remark: None,
        min_stock,
        reorder_point: (reorder_point != 0).then_some(reorder_point),
        reorder_qty: (reorder_qty != 0).then_some(reorder_qty),
        preferred_supplier_id: None,
        location_bin: None,
        quantity_on_hand: qoh,
        last_updated: Utc::now(),
        row_version: 1,
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[test]
fn low_stock_boundary_is_inclusive() {
    assert!(item("Belt", 10, 0, 10, 0).is_low_stock());
    assert!(!item("Belt", 11, 0, 10, 0).is_low_stock());
}

#[test]
fn reorder_point_zero_falls_back_to_min_stock() {
    let fallback = item("Belt", 5, 5, 0, 0);
    assert_eq!(fallback.effective_reorder_point(), 5);
    assert!(fallback.is_low_stock());

    let configured = item("Belt", 5, 5, 3, 0);
    assert_eq!(configured.effective_reorder_point(), 3);
    assert!(!configured.is_low_stock());
}

#[test]
fn out_of_stock_means_exactly_zero() {
    assert!(item("Belt", 0, 5, 0, 0).is_out_of_stock());
    assert!(!item("Belt", 1, 5, 0, 0).is_out_of_stock());
}

#[test]
fn suggested_qty_uses_configured_reorder_qty() {
    assert_eq!(item("Belt", 2, 0, 10, 20).suggested_reorder_qty(), 20);
}

#[test]
fn suggested_qty_defaults_to_deficit_plus_buffer() {
    // qoh 2 against a reorder point of 10: deficit 8 plus the buffer
    assert_eq!(item("Belt", 2, 0, 10, 0).suggested_reorder_qty(), 8 + REORDER_BUFFER);
}

#[test]
fn only_low_stock_items_are_suggested() {
    let inventory = [
        item("Belt", 2, 0, 10, 0),
        item("Filter", 50, 5, 0, 0),
    ];
    let suggestions = reorder_suggestions(&inventory);
    assert_eq!(suggestions.len(), 1);
    assert_eq!(suggestions[0].part_name, "Belt");
    assert_eq!(suggestions[0].suggested_qty, 13);
}

#[test]
fn suggestions_rank_part_groups_by_total_quantity() {
    // Two belt locations together outweigh the single compressor
    let inventory = [
        item("Belt", 2, 0, 10, 0),      // suggests 13
        item("Compressor", 0, 0, 5, 15), // suggests 15
        item("Belt", 1, 0, 8, 0),       // suggests 12 -> belts total 25
    ];
    let suggestions = reorder_suggestions(&inventory);
    assert_eq!(suggestions[0].part_name, "Belt");
    assert_eq!(suggestions[1].part_name, "Belt");
    assert_eq!(suggestions[2].part_name, "Compressor");
}

#[test]
fn tied_part_groups_stay_contiguous_in_first_seen_order() {
    // Belts (13 + 12) and the compressor both total 25; the belts appear
    // first and their group must not be interleaved
    let inventory = [
        item("Belt", 2, 0, 10, 0),       // suggests 13
        item("Compressor", 0, 0, 5, 25), // suggests 25
        item("Belt", 1, 0, 8, 0),        // suggests 12 -> belts total 25
    ];
    let suggestions = reorder_suggestions(&inventory);
    let order: Vec<&str> = suggestions.iter().map(|s| s.part_name.as_str()).collect();
    assert_eq!(order, ["Belt", "Belt", "Compressor"]);
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    /// Every suggestion proposes a positive quantity and covers the gap
    /// up to the effective reorder point when no explicit quantity is set
    #[test]
    fn suggestions_are_positive_and_cover_the_deficit(
        qoh in 0i64..50,
        reorder_point in 1i64..100,
    ) {
        let part = item("Belt", qoh, 0, reorder_point, 0);
        if part.is_low_stock() {
            let suggested = part.suggested_reorder_qty();
            prop_assert!(suggested > 0);
            prop_assert!(qoh + suggested >= reorder_point);
        }
    }

    /// The low-stock report and the suggestion list agree on membership
    #[test]
    fn low_stock_and_suggestions_agree(
        quantities in proptest::collection::vec((0i64..30, 1i64..30), 1..10),
    ) {
        let inventory: Vec<InventoryItem> = quantities
            .iter()
            .enumerate()
            .map(|(i, &(qoh, rp))| item(&format!("Part {}", i), qoh, 0, rp, 0))
            .collect();

        let low = low_stock_items(&inventory);
        let suggestions = reorder_suggestions(&inventory);
        prop_assert_eq!(low.len(), suggestions.len());
    }
}
