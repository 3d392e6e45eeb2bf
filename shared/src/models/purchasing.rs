//! Purchase request and purchase order models

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{DomainError, DomainResult};

/// Purchase request lifecycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PrStatus {
    Draft,
    Submitted,
    Approved,
    Rejected,
    Cancelled,
}

impl PrStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrStatus::Draft => "DRAFT",
            PrStatus::Submitted => "SUBMITTED",
            PrStatus::Approved => "APPROVED",
            PrStatus::Rejected => "REJECTED",
            PrStatus::Cancelled => "CANCELLED",
        }
    }
}

impl std::str::FromStr for PrStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DRAFT" => Ok(PrStatus::Draft),
            "SUBMITTED" => Ok(PrStatus::Submitted),
            "APPROVED" => Ok(PrStatus::Approved),
            "REJECTED" => Ok(PrStatus::Rejected),
            "CANCELLED" => Ok(PrStatus::Cancelled),
            other => Err(format!("Unknown purchase request status: {}", other)),
        }
    }
}

/// Purchase order lifecycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PoStatus {
    Draft,
    Sent,
    PartiallyReceived,
    Closed,
    Cancelled,
}

impl PoStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PoStatus::Draft => "DRAFT",
            PoStatus::Sent => "SENT",
            PoStatus::PartiallyReceived => "PARTIALLY_RECEIVED",
            PoStatus::Closed => "CLOSED",
            PoStatus::Cancelled => "CANCELLED",
        }
    }

    /// A PO still awaiting goods or cancellation
    pub fn is_open(&self) -> bool {
        !matches!(self, PoStatus::Closed | PoStatus::Cancelled)
    }
}

impl std::str::FromStr for PoStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DRAFT" => Ok(PoStatus::Draft),
            "SENT" => Ok(PoStatus::Sent),
            "PARTIALLY_RECEIVED" => Ok(PoStatus::PartiallyReceived),
            "CLOSED" => Ok(PoStatus::Closed),
            "CANCELLED" => Ok(PoStatus::Cancelled),
            other => Err(format!("Unknown purchase order status: {}", other)),
        }
    }
}

/// A purchase request line
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrLine {
    pub inventory_id: Uuid,
    pub requested_qty: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_supplier_id: Option<Uuid>,
}

/// A purchase request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseRequest {
    pub id: Uuid,
    pub pr_no: String,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    pub status: PrStatus,
    pub lines: Vec<PrLine>,
}

impl PurchaseRequest {
    /// Strict approval: only a draft request may be approved
    pub fn approve(&mut self) -> DomainResult<()> {
        if self.status != PrStatus::Draft {
            return Err(DomainError::InvalidStateTransition(format!(
                "Only a DRAFT purchase request can be approved (current: {})",
                self.status.as_str()
            )));
        }
        self.status = PrStatus::Approved;
        Ok(())
    }

    /// Conversion path: a draft request is force-stamped approved, an
    /// already approved request passes through. Terminal states refuse.
    /// (The laxity towards DRAFT matches the observed behavior and is
    /// deliberately looser than `approve`.)
    pub fn approve_for_conversion(&mut self) -> DomainResult<()> {
        match self.status {
            PrStatus::Draft | PrStatus::Approved => {
                self.status = PrStatus::Approved;
                Ok(())
            }
            other => Err(DomainError::InvalidStateTransition(format!(
                "A {} purchase request cannot be converted to a purchase order",
                other.as_str()
            ))),
        }
    }
}

/// A purchase order line with receipt progress
///
/// Invariant: `0 <= received_qty <= ordered_qty`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoLine {
    pub inventory_id: Uuid,
    pub ordered_qty: i64,
    pub received_qty: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_cost: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eta: Option<NaiveDate>,
}

impl PoLine {
    pub fn outstanding_qty(&self) -> i64 {
        self.ordered_qty - self.received_qty
    }

    pub fn is_fully_received(&self) -> bool {
        self.received_qty >= self.ordered_qty
    }
}

/// A purchase order
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseOrder {
    pub id: Uuid,
    pub po_no: String,
    pub supplier_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    pub status: PoStatus,
    pub lines: Vec<PoLine>,
}

/// Collapse duplicate items in a request's lines
///
/// Receipts address order lines by item, so a document carries at most
/// one line per item: quantities sum into the first occurrence, which
/// keeps its notes and supplier suggestion.
pub fn merge_pr_lines(lines: Vec<PrLine>) -> Vec<PrLine> {
    let mut merged: Vec<PrLine> = Vec::with_capacity(lines.len());
    for line in lines {
        match merged
            .iter_mut()
            .find(|m| m.inventory_id == line.inventory_id)
        {
            Some(existing) => existing.requested_qty += line.requested_qty,
            None => merged.push(line),
        }
    }
    merged
}

/// Status after a receipt has been applied: closed once every line is
/// fully received, partially received otherwise
pub fn recompute_po_status(lines: &[PoLine]) -> PoStatus {
    if lines.iter().all(PoLine::is_fully_received) {
        PoStatus::Closed
    } else {
        PoStatus::PartiallyReceived
    }
}

/// Build the purchase order lines for a converted request: one line per
/// request line, nothing received yet
pub fn po_lines_from_pr(pr: &PurchaseRequest) -> Vec<PoLine> {
    pr.lines
        .iter()
        .map(|line| PoLine {
            inventory_id: line.inventory_id,
            ordered_qty: line.requested_qty,
            received_qty: 0,
            unit_cost: None,
            eta: None,
        })
        .collect()
}

/// Supplier for a converted purchase order: the first line's suggestion,
/// falling back to a configured default. Single supplier per PO is a known
/// simplification.
pub fn po_supplier_from_pr(pr: &PurchaseRequest, fallback: Uuid) -> Uuid {
    pr.lines
        .first()
        .and_then(|line| line.suggested_supplier_id)
        .unwrap_or(fallback)
}
