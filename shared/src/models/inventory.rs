//! Inventory item model and stock-level rules

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Fixed buffer added above the deficit when no explicit reorder quantity
/// is configured
pub const REORDER_BUFFER: i64 = 5;

/// Lifecycle status of a spare part
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PartStatus {
    Spare,
    Installed,
    Faulty,
    Obsolete,
}

impl PartStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PartStatus::Spare => "Spare",
            PartStatus::Installed => "Installed",
            PartStatus::Faulty => "Faulty",
            PartStatus::Obsolete => "Obsolete",
        }
    }
}

impl std::str::FromStr for PartStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Spare" => Ok(PartStatus::Spare),
            "Installed" => Ok(PartStatus::Installed),
            "Faulty" => Ok(PartStatus::Faulty),
            "Obsolete" => Ok(PartStatus::Obsolete),
            other => Err(format!("Unknown part status: {}", other)),
        }
    }
}

/// Criticality of a part for facility operations
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Criticality {
    High,
    Medium,
    Low,
}

impl Criticality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Criticality::High => "High",
            Criticality::Medium => "Medium",
            Criticality::Low => "Low",
        }
    }
}

impl std::str::FromStr for Criticality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "High" => Ok(Criticality::High),
            "Medium" => Ok(Criticality::Medium),
            "Low" => Ok(Criticality::Low),
            other => Err(format!("Unknown criticality: {}", other)),
        }
    }
}

/// A spare part held in stock
///
/// `quantity_on_hand` is owned by the stock ledger and the receiving
/// operations; metadata edits never touch it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub id: Uuid,
    pub building: String,
    pub room: Option<String>,
    pub tag_no: Option<String>,
    pub installation_type: Option<String>,
    pub system_type: Option<String>,
    pub brand: Option<String>,
    pub equipment_model: Option<String>,
    pub part_category: Option<String>,
    pub part_name: String,
    pub part_model: Option<String>,
    pub unit: String,
    pub status: PartStatus,
    pub criticality: Option<Criticality>,
    pub image_base64: Option<String>,
    pub specs: Option<String>,
    pub warranty_expiry: Option<NaiveDate>,
    pub remark: Option<String>,
    pub min_stock: i64,
    pub reorder_point: Option<i64>,
    pub reorder_qty: Option<i64>,
    pub preferred_supplier_id: Option<Uuid>,
    pub location_bin: Option<String>,
    pub quantity_on_hand: i64,
    pub last_updated: DateTime<Utc>,
    pub row_version: i64,
}

impl InventoryItem {
    /// Replenishment threshold: the reorder point when configured above
    /// zero, otherwise the minimum stock level
    pub fn effective_reorder_point(&self) -> i64 {
        match self.reorder_point {
            Some(rp) if rp > 0 => rp,
            _ => self.min_stock,
        }
    }

    /// An item is low stock at or below its effective reorder point
    pub fn is_low_stock(&self) -> bool {
        self.quantity_on_hand <= self.effective_reorder_point()
    }

    /// Zero stock, flagged with higher severity than low stock
    pub fn is_out_of_stock(&self) -> bool {
        self.quantity_on_hand == 0
    }

    /// Quantity to propose when replenishing: the configured reorder
    /// quantity, or the deficit plus a fixed buffer
    pub fn suggested_reorder_qty(&self) -> i64 {
        match self.reorder_qty {
            Some(qty) if qty > 0 => qty,
            _ => self.effective_reorder_point() - self.quantity_on_hand + REORDER_BUFFER,
        }
    }
}

/// Filter options for inventory listings
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryFilter {
    pub search: Option<String>,
    pub building: Option<String>,
    pub category: Option<String>,
    pub status: Option<String>,
}

/// A replenishment proposal derived from current stock levels
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderSuggestion {
    pub inventory_id: Uuid,
    pub part_name: String,
    pub building: String,
    pub quantity_on_hand: i64,
    pub reorder_point: i64,
    pub suggested_qty: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_supplier_id: Option<Uuid>,
}

/// Items at or below their effective reorder point
pub fn low_stock_items(inventory: &[InventoryItem]) -> Vec<&InventoryItem> {
    inventory.iter().filter(|i| i.is_low_stock()).collect()
}

/// Build reorder suggestions for every low-stock item
///
/// Ordering contract: suggestions are grouped by part name and the groups
/// are ranked by total suggested quantity descending; groups that tie on
/// total keep first-appearance order.
pub fn reorder_suggestions(inventory: &[InventoryItem]) -> Vec<ReorderSuggestion> {
    let mut suggestions: Vec<ReorderSuggestion> = inventory
        .iter()
        .filter(|i| i.is_low_stock())
        .map(|i| ReorderSuggestion {
            inventory_id: i.id,
            part_name: i.part_name.clone(),
            building: i.building.clone(),
            quantity_on_hand: i.quantity_on_hand,
            reorder_point: i.effective_reorder_point(),
            suggested_qty: i.suggested_reorder_qty(),
            preferred_supplier_id: i.preferred_supplier_id,
        })
        .collect();

    let mut totals: std::collections::HashMap<String, i64> = std::collections::HashMap::new();
    let mut first_seen: std::collections::HashMap<String, usize> = std::collections::HashMap::new();
    for (index, s) in suggestions.iter().enumerate() {
        *totals.entry(s.part_name.clone()).or_insert(0) += s.suggested_qty;
        first_seen.entry(s.part_name.clone()).or_insert(index);
    }

    // The first-seen index keeps tied groups contiguous; the stable sort
    // keeps insertion order within a group
    suggestions.sort_by_key(|s| {
        (
            std::cmp::Reverse(totals[&s.part_name]),
            first_seen[&s.part_name],
        )
    });
    suggestions
}
