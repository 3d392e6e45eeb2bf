//! Stock ledger: transaction types, lines and the pure planning rules
//!
//! Planning is separated from persistence so the insufficient-stock check
//! and the before/after snapshots can be computed (and tested) against a
//! point-in-time view of stock, then committed atomically by the caller.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{DomainError, DomainResult};

/// Stock movement types
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TxnType {
    Issue,
    Return,
    Receive,
    Adjustment,
}

impl TxnType {
    /// Sign applied to line quantities. Issue removes stock; every other
    /// type adds, including Adjustment (observed convention: downward
    /// corrections are not representable as adjustments).
    pub fn direction(&self) -> i64 {
        match self {
            TxnType::Issue => -1,
            TxnType::Return | TxnType::Receive | TxnType::Adjustment => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TxnType::Issue => "ISSUE",
            TxnType::Return => "RETURN",
            TxnType::Receive => "RECEIVE",
            TxnType::Adjustment => "ADJUSTMENT",
        }
    }
}

impl std::str::FromStr for TxnType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ISSUE" => Ok(TxnType::Issue),
            "RETURN" => Ok(TxnType::Return),
            "RECEIVE" => Ok(TxnType::Receive),
            "ADJUSTMENT" => Ok(TxnType::Adjustment),
            other => Err(format!("Unknown transaction type: {}", other)),
        }
    }
}

/// A committed stock movement line with its before/after snapshots
///
/// Invariant: `after_qty = before_qty + direction * qty`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockTxnLine {
    pub inventory_id: Uuid,
    pub qty: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_cost: Option<Decimal>,
    pub before_qty: i64,
    pub after_qty: i64,
}

/// A committed stock transaction
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockTxn {
    pub id: Uuid,
    pub txn_type: TxnType,
    pub txn_time: DateTime<Utc>,
    pub performed_by: String,
    pub counterparty: String,
    pub reference: String,
    pub remark: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_no: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<String>,
    pub lines: Vec<StockTxnLine>,
}

/// A requested stock movement line, before planning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineRequest {
    pub inventory_id: Uuid,
    pub qty: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_cost: Option<Decimal>,
}

/// Point-in-time stock view used by the planner
#[derive(Debug, Clone)]
pub struct ItemSnapshot {
    pub part_name: String,
    pub quantity_on_hand: i64,
}

/// Plan a transaction against a stock snapshot
///
/// Returns one planned line per request with before/after quantities, or
/// the first violation. All-or-nothing: a failed line yields no plan, so
/// the caller commits either every line or none.
pub fn plan_lines(
    txn_type: TxnType,
    requests: &[LineRequest],
    stock: &HashMap<Uuid, ItemSnapshot>,
) -> DomainResult<Vec<StockTxnLine>> {
    let mut working: HashMap<Uuid, i64> = stock
        .iter()
        .map(|(id, snap)| (*id, snap.quantity_on_hand))
        .collect();
    let mut planned = Vec::with_capacity(requests.len());

    for request in requests {
        if request.qty <= 0 {
            return Err(DomainError::NonPositiveQuantity(request.qty));
        }
        let snapshot = stock
            .get(&request.inventory_id)
            .ok_or(DomainError::UnknownItem(request.inventory_id))?;
        let before_qty = working[&request.inventory_id];
        let delta = txn_type.direction() * request.qty;
        let after_qty = before_qty + delta;
        if after_qty < 0 {
            return Err(DomainError::InsufficientStock {
                part_name: snapshot.part_name.clone(),
                available: before_qty.max(0),
            });
        }
        working.insert(request.inventory_id, after_qty);
        planned.push(StockTxnLine {
            inventory_id: request.inventory_id,
            qty: request.qty,
            unit_cost: request.unit_cost,
            before_qty,
            after_qty,
        });
    }

    Ok(planned)
}

/// Per-item deltas that exactly undo a committed transaction
pub fn reversal_deltas(txn_type: TxnType, lines: &[StockTxnLine]) -> Vec<(Uuid, i64)> {
    lines
        .iter()
        .map(|line| (line.inventory_id, -txn_type.direction() * line.qty))
        .collect()
}

/// Plan the exact inverse of a committed transaction against a stock
/// snapshot
///
/// Fails with insufficient stock when later movements already consumed
/// what the transaction brought in; the undone quantities must stay
/// non-negative.
pub fn plan_reversal(
    txn_type: TxnType,
    lines: &[StockTxnLine],
    stock: &HashMap<Uuid, ItemSnapshot>,
) -> DomainResult<Vec<(Uuid, i64)>> {
    let mut working: HashMap<Uuid, i64> = stock
        .iter()
        .map(|(id, snap)| (*id, snap.quantity_on_hand))
        .collect();
    let deltas = reversal_deltas(txn_type, lines);

    for (inventory_id, delta) in &deltas {
        let Some(snapshot) = stock.get(inventory_id) else {
            continue;
        };
        let qty = working
            .entry(*inventory_id)
            .or_insert(snapshot.quantity_on_hand);
        *qty += delta;
        if *qty < 0 {
            return Err(DomainError::InsufficientStock {
                part_name: snapshot.part_name.clone(),
                available: snapshot.quantity_on_hand,
            });
        }
    }

    Ok(deltas)
}

/// Plan an amendment: reverse the original effect, then plan the new line
/// set against the restored quantities
///
/// Both halves are validated: the reversal fails when intervening
/// movements consumed the original receipt, and the reapplication fails
/// on insufficient stock. Nothing is mutated here, so a rejected
/// amendment leaves the caller free to keep the original transaction
/// untouched.
pub fn plan_amendment(
    original_type: TxnType,
    original_lines: &[StockTxnLine],
    new_type: TxnType,
    requests: &[LineRequest],
    stock: &HashMap<Uuid, ItemSnapshot>,
) -> DomainResult<Vec<StockTxnLine>> {
    let mut restored = stock.clone();
    for (inventory_id, delta) in plan_reversal(original_type, original_lines, stock)? {
        if let Some(snapshot) = restored.get_mut(&inventory_id) {
            snapshot.quantity_on_hand += delta;
        }
    }
    plan_lines(new_type, requests, &restored)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stock_of(id: Uuid, name: &str, qty: i64) -> HashMap<Uuid, ItemSnapshot> {
        HashMap::from([(
            id,
            ItemSnapshot {
                part_name: name.to_string(),
                quantity_on_hand: qty,
            },
        )])
    }

    #[test]
    fn direction_table() {
        assert_eq!(TxnType::Issue.direction(), -1);
        assert_eq!(TxnType::Return.direction(), 1);
        assert_eq!(TxnType::Receive.direction(), 1);
        assert_eq!(TxnType::Adjustment.direction(), 1);
    }

    #[test]
    fn plan_records_before_and_after() {
        let id = Uuid::new_v4();
        let stock = stock_of(id, "Fan Belt", 10);
        let planned = plan_lines(
            TxnType::Issue,
            &[LineRequest {
                inventory_id: id,
                qty: 4,
                unit_cost: None,
            }],
            &stock,
        )
        .unwrap();
        assert_eq!(planned[0].before_qty, 10);
        assert_eq!(planned[0].after_qty, 6);
    }

    #[test]
    fn issue_beyond_stock_is_rejected() {
        let id = Uuid::new_v4();
        let stock = stock_of(id, "Fan Belt", 3);
        let err = plan_lines(
            TxnType::Issue,
            &[LineRequest {
                inventory_id: id,
                qty: 5,
                unit_cost: None,
            }],
            &stock,
        )
        .unwrap_err();
        assert_eq!(
            err,
            DomainError::InsufficientStock {
                part_name: "Fan Belt".to_string(),
                available: 3,
            }
        );
    }

    #[test]
    fn reversing_a_consumed_receipt_is_rejected() {
        let id = Uuid::new_v4();
        let stock = stock_of(id, "Fan Belt", 2);
        let original = [StockTxnLine {
            inventory_id: id,
            qty: 10,
            unit_cost: None,
            before_qty: 0,
            after_qty: 10,
        }];
        let err = plan_reversal(TxnType::Receive, &original, &stock).unwrap_err();
        assert_eq!(
            err,
            DomainError::InsufficientStock {
                part_name: "Fan Belt".to_string(),
                available: 2,
            }
        );
    }

    #[test]
    fn repeated_lines_consume_the_same_pool() {
        let id = Uuid::new_v4();
        let stock = stock_of(id, "Fan Belt", 5);
        let line = LineRequest {
            inventory_id: id,
            qty: 3,
            unit_cost: None,
        };
        let err = plan_lines(TxnType::Issue, &[line.clone(), line], &stock).unwrap_err();
        assert!(matches!(err, DomainError::InsufficientStock { .. }));
    }
}
