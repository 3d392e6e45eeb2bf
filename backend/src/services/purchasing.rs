//! Procurement service: purchase requests and purchase orders
//!
//! The state machines live in `shared`; this service loads documents,
//! applies the pure transitions, and persists the outcome. Receiving a
//! purchase order updates its lines and appends a RECEIVE stock movement
//! in the same database transaction.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use shared::{
    merge_pr_lines, po_lines_from_pr, po_supplier_from_pr, recompute_po_status,
    validate_receipts, LineRequest, PoLine, PoStatus, PrLine, PrStatus, PurchaseOrder,
    PurchaseRequest, ReceiptRequest, TxnType,
};
use sqlx::{PgPool, Postgres, Transaction};
use std::str::FromStr;
use uuid::Uuid;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::services::ledger::{LedgerService, TxnInput};

/// Procurement service
#[derive(Clone)]
pub struct PurchasingService {
    db: PgPool,
    fallback_supplier_id: Uuid,
}

/// Input for creating a purchase request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePrInput {
    pub lines: Vec<PrLineInput>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrLineInput {
    pub inventory_id: Uuid,
    pub requested_qty: i64,
    pub notes: Option<String>,
    pub suggested_supplier_id: Option<Uuid>,
}

/// Input for receiving goods against a purchase order
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiveInput {
    pub receipts: Vec<ReceiptRequest>,
    pub remark: Option<String>,
}

#[derive(Debug, sqlx::FromRow)]
struct PrRow {
    id: Uuid,
    pr_no: String,
    created_at: DateTime<Utc>,
    created_by: String,
    status: String,
}

#[derive(Debug, sqlx::FromRow)]
struct PrLineRow {
    pr_id: Uuid,
    inventory_id: Uuid,
    requested_qty: i64,
    notes: Option<String>,
    suggested_supplier_id: Option<Uuid>,
}

#[derive(Debug, sqlx::FromRow)]
struct PoRow {
    id: Uuid,
    po_no: String,
    supplier_id: Uuid,
    created_at: DateTime<Utc>,
    created_by: String,
    status: String,
}

#[derive(Debug, sqlx::FromRow)]
struct PoLineRow {
    po_id: Uuid,
    inventory_id: Uuid,
    ordered_qty: i64,
    received_qty: i64,
    unit_cost: Option<Decimal>,
    eta: Option<NaiveDate>,
}

impl PurchasingService {
    pub fn new(db: PgPool, config: &Config) -> Self {
        Self {
            db,
            fallback_supplier_id: config.purchasing.fallback_supplier_id,
        }
    }

    /// List purchase requests, newest first
    pub async fn list_prs(&self) -> AppResult<Vec<PurchaseRequest>> {
        let rows = sqlx::query_as::<_, PrRow>(
            r#"
            SELECT id, pr_no, created_at, created_by, status
            FROM purchase_requests
            ORDER BY created_at DESC, pr_no DESC
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        let line_rows = sqlx::query_as::<_, PrLineRow>(
            r#"
            SELECT pr_id, inventory_id, requested_qty, notes, suggested_supplier_id
            FROM pr_lines
            ORDER BY line_no
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        let mut lines_by_pr: HashMap<Uuid, Vec<PrLine>> = HashMap::new();
        for row in line_rows {
            lines_by_pr.entry(row.pr_id).or_default().push(PrLine {
                inventory_id: row.inventory_id,
                requested_qty: row.requested_qty,
                notes: row.notes,
                suggested_supplier_id: row.suggested_supplier_id,
            });
        }

        rows.into_iter()
            .map(|row| {
                let lines = lines_by_pr.remove(&row.id).unwrap_or_default();
                Self::assemble_pr(row, lines)
            })
            .collect()
    }

    /// Get a purchase request by ID
    pub async fn get_pr(&self, id: Uuid) -> AppResult<PurchaseRequest> {
        let mut tx = self.db.begin().await?;
        let pr = Self::load_pr(&mut tx, id).await?;
        tx.commit().await?;
        Ok(pr)
    }

    /// Create a purchase request in DRAFT
    ///
    /// Lines repeating an item are merged into one, so every document
    /// carries at most one line per item.
    pub async fn create_pr(&self, created_by: &str, input: CreatePrInput) -> AppResult<PurchaseRequest> {
        if input.lines.is_empty() {
            return Err(AppError::Validation {
                field: "lines".to_string(),
                message: "A purchase request needs at least one line".to_string(),
            });
        }
        for line in &input.lines {
            if line.requested_qty <= 0 {
                return Err(AppError::Validation {
                    field: "requestedQty".to_string(),
                    message: "Requested quantity must be positive".to_string(),
                });
            }
        }

        let lines = merge_pr_lines(
            input
                .lines
                .into_iter()
                .map(|l| PrLine {
                    inventory_id: l.inventory_id,
                    requested_qty: l.requested_qty,
                    notes: l.notes,
                    suggested_supplier_id: l.suggested_supplier_id,
                })
                .collect(),
        );

        let mut tx = self.db.begin().await?;

        // Verify every referenced item exists before numbering the document
        let item_ids: Vec<Uuid> = lines.iter().map(|l| l.inventory_id).collect();
        let known = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM inventory_items WHERE id = ANY($1)",
        )
        .bind(&item_ids)
        .fetch_all(&mut *tx)
        .await?;
        for id in &item_ids {
            if !known.contains(id) {
                return Err(AppError::NotFound(format!("Inventory item {} not found", id)));
            }
        }

        // Suggested suppliers must be active to join a new request
        let supplier_ids: Vec<Uuid> = lines
            .iter()
            .filter_map(|l| l.suggested_supplier_id)
            .collect();
        if !supplier_ids.is_empty() {
            let inactive = sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(*) FROM suppliers WHERE id = ANY($1) AND active = FALSE",
            )
            .bind(&supplier_ids)
            .fetch_one(&mut *tx)
            .await?;
            if inactive > 0 {
                return Err(AppError::Conflict {
                    resource: "supplier".to_string(),
                    message: "A suggested supplier is inactive".to_string(),
                });
            }
        }

        let pr_no = Self::next_document_no(&mut tx, "PR", "purchase_requests").await?;
        let pr_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO purchase_requests (pr_no, created_by, status)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(&pr_no)
        .bind(created_by)
        .bind(PrStatus::Draft.as_str())
        .fetch_one(&mut *tx)
        .await?;

        for (line_no, line) in lines.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO pr_lines (pr_id, line_no, inventory_id, requested_qty,
                                      notes, suggested_supplier_id)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(pr_id)
            .bind(line_no as i32)
            .bind(line.inventory_id)
            .bind(line.requested_qty)
            .bind(&line.notes)
            .bind(line.suggested_supplier_id)
            .execute(&mut *tx)
            .await?;
        }

        let pr = Self::load_pr(&mut tx, pr_id).await?;
        tx.commit().await?;
        Ok(pr)
    }

    /// Approve a purchase request (strict: DRAFT only)
    pub async fn approve_pr(&self, id: Uuid) -> AppResult<PurchaseRequest> {
        let mut tx = self.db.begin().await?;

        let mut pr = Self::load_pr_for_update(&mut tx, id).await?;
        pr.approve()?;

        sqlx::query("UPDATE purchase_requests SET status = $2 WHERE id = $1")
            .bind(id)
            .bind(pr.status.as_str())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(pr)
    }

    /// Convert a purchase request into a purchase order
    ///
    /// A draft request is stamped approved on the way through. The order's
    /// supplier comes from the first line's suggestion, falling back to
    /// the configured default, and must be an active supplier.
    pub async fn convert_to_po(&self, pr_id: Uuid, created_by: &str) -> AppResult<PurchaseOrder> {
        let mut tx = self.db.begin().await?;

        let mut pr = Self::load_pr_for_update(&mut tx, pr_id).await?;
        pr.approve_for_conversion()?;

        let supplier_id = po_supplier_from_pr(&pr, self.fallback_supplier_id);
        let active = sqlx::query_scalar::<_, bool>(
            "SELECT active FROM suppliers WHERE id = $1",
        )
        .bind(supplier_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Supplier {} not found", supplier_id)))?;

        if !active {
            return Err(AppError::Conflict {
                resource: "supplier".to_string(),
                message: format!("Supplier {} is inactive", supplier_id),
            });
        }

        sqlx::query("UPDATE purchase_requests SET status = $2 WHERE id = $1")
            .bind(pr_id)
            .bind(pr.status.as_str())
            .execute(&mut *tx)
            .await?;

        let po_no = Self::next_document_no(&mut tx, "PO", "purchase_orders").await?;
        let po_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO purchase_orders (po_no, supplier_id, created_by, status, pr_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(&po_no)
        .bind(supplier_id)
        .bind(created_by)
        .bind(PoStatus::Draft.as_str())
        .bind(pr_id)
        .fetch_one(&mut *tx)
        .await?;

        for (line_no, line) in po_lines_from_pr(&pr).iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO po_lines (po_id, line_no, inventory_id, ordered_qty,
                                      received_qty, unit_cost, eta)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(po_id)
            .bind(line_no as i32)
            .bind(line.inventory_id)
            .bind(line.ordered_qty)
            .bind(line.received_qty)
            .bind(line.unit_cost)
            .bind(line.eta)
            .execute(&mut *tx)
            .await?;
        }

        let po = Self::load_po(&mut tx, po_id).await?;
        tx.commit().await?;
        Ok(po)
    }

    /// List purchase orders, newest first
    pub async fn list_pos(&self) -> AppResult<Vec<PurchaseOrder>> {
        let rows = sqlx::query_as::<_, PoRow>(
            r#"
            SELECT id, po_no, supplier_id, created_at, created_by, status
            FROM purchase_orders
            ORDER BY created_at DESC, po_no DESC
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        let line_rows = sqlx::query_as::<_, PoLineRow>(
            r#"
            SELECT po_id, inventory_id, ordered_qty, received_qty, unit_cost, eta
            FROM po_lines
            ORDER BY line_no
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        let mut lines_by_po: HashMap<Uuid, Vec<PoLine>> = HashMap::new();
        for row in line_rows {
            lines_by_po.entry(row.po_id).or_default().push(PoLine {
                inventory_id: row.inventory_id,
                ordered_qty: row.ordered_qty,
                received_qty: row.received_qty,
                unit_cost: row.unit_cost,
                eta: row.eta,
            });
        }

        rows.into_iter()
            .map(|row| {
                let lines = lines_by_po.remove(&row.id).unwrap_or_default();
                Self::assemble_po(row, lines)
            })
            .collect()
    }

    /// Get a purchase order by ID
    pub async fn get_po(&self, id: Uuid) -> AppResult<PurchaseOrder> {
        let mut tx = self.db.begin().await?;
        let po = Self::load_po(&mut tx, id).await?;
        tx.commit().await?;
        Ok(po)
    }

    /// Receive goods against a purchase order
    ///
    /// Validated receipts update the order's lines, the order's status is
    /// recomputed, and a RECEIVE stock movement referencing the order is
    /// appended. One transaction covers all three.
    pub async fn receive_po(
        &self,
        po_id: Uuid,
        performed_by: &str,
        input: ReceiveInput,
    ) -> AppResult<PurchaseOrder> {
        let mut tx = self.db.begin().await?;

        let po = Self::load_po_for_update(&mut tx, po_id).await?;
        if !po.status.is_open() {
            return Err(AppError::Conflict {
                resource: "purchase_order".to_string(),
                message: format!(
                    "Purchase order {} is {} and cannot receive goods",
                    po.po_no,
                    po.status.as_str()
                ),
            });
        }

        let part_names = Self::load_part_names(
            &mut tx,
            &po.lines.iter().map(|l| l.inventory_id).collect::<Vec<_>>(),
        )
        .await?;
        let accepted = validate_receipts(&po.lines, &input.receipts, &part_names)?;

        let mut totals: HashMap<Uuid, i64> = HashMap::new();
        for receipt in &accepted {
            *totals.entry(receipt.inventory_id).or_insert(0) += receipt.qty_received;
        }
        // Conversion merges duplicate items, so one line per item is hit
        for (inventory_id, qty) in &totals {
            sqlx::query(
                r#"
                UPDATE po_lines
                SET received_qty = received_qty + $3
                WHERE po_id = $1 AND inventory_id = $2
                "#,
            )
            .bind(po_id)
            .bind(inventory_id)
            .bind(qty)
            .execute(&mut *tx)
            .await?;
        }

        let updated_lines: Vec<PoLine> = po
            .lines
            .iter()
            .map(|line| {
                let mut line = line.clone();
                line.received_qty += totals.get(&line.inventory_id).copied().unwrap_or(0);
                line
            })
            .collect();
        let new_status = recompute_po_status(&updated_lines);

        sqlx::query("UPDATE purchase_orders SET status = $2 WHERE id = $1")
            .bind(po_id)
            .bind(new_status.as_str())
            .execute(&mut *tx)
            .await?;

        let txn_input = TxnInput {
            txn_type: TxnType::Receive,
            txn_time: None,
            counterparty: String::new(),
            reference: po.po_no.clone(),
            remark: input.remark.unwrap_or_default(),
            reason_code: None,
            source_location: None,
            destination_location: None,
            document_type: Some("PO".to_string()),
            document_no: Some(po.po_no.clone()),
            approved_by: None,
            lines: accepted
                .iter()
                .map(|r| LineRequest {
                    inventory_id: r.inventory_id,
                    qty: r.qty_received,
                    unit_cost: r.unit_cost,
                })
                .collect(),
        };
        LedgerService::record_in_tx(&mut tx, performed_by, &txn_input).await?;

        let po = Self::load_po(&mut tx, po_id).await?;
        tx.commit().await?;
        Ok(po)
    }

    /// Sequential document number: prefix plus a zero-padded counter
    async fn next_document_no(
        tx: &mut Transaction<'_, Postgres>,
        prefix: &str,
        table: &str,
    ) -> AppResult<String> {
        let count = sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&mut **tx)
            .await?;
        Ok(format!("{}-{:06}", prefix, count + 1))
    }

    async fn load_part_names(
        tx: &mut Transaction<'_, Postgres>,
        item_ids: &[Uuid],
    ) -> AppResult<HashMap<Uuid, String>> {
        let rows = sqlx::query_as::<_, (Uuid, String)>(
            "SELECT id, part_name FROM inventory_items WHERE id = ANY($1)",
        )
        .bind(item_ids)
        .fetch_all(&mut **tx)
        .await?;
        Ok(rows.into_iter().collect())
    }

    async fn load_pr(
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
    ) -> AppResult<PurchaseRequest> {
        let row = sqlx::query_as::<_, PrRow>(
            r#"
            SELECT id, pr_no, created_at, created_by, status
            FROM purchase_requests
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Purchase request {} not found", id)))?;

        let lines = Self::load_pr_lines(tx, id).await?;
        Self::assemble_pr(row, lines)
    }

    async fn load_pr_for_update(
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
    ) -> AppResult<PurchaseRequest> {
        let row = sqlx::query_as::<_, PrRow>(
            r#"
            SELECT id, pr_no, created_at, created_by, status
            FROM purchase_requests
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Purchase request {} not found", id)))?;

        let lines = Self::load_pr_lines(tx, id).await?;
        Self::assemble_pr(row, lines)
    }

    async fn load_pr_lines(
        tx: &mut Transaction<'_, Postgres>,
        pr_id: Uuid,
    ) -> AppResult<Vec<PrLine>> {
        let rows = sqlx::query_as::<_, PrLineRow>(
            r#"
            SELECT pr_id, inventory_id, requested_qty, notes, suggested_supplier_id
            FROM pr_lines
            WHERE pr_id = $1
            ORDER BY line_no
            "#,
        )
        .bind(pr_id)
        .fetch_all(&mut **tx)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| PrLine {
                inventory_id: row.inventory_id,
                requested_qty: row.requested_qty,
                notes: row.notes,
                suggested_supplier_id: row.suggested_supplier_id,
            })
            .collect())
    }

    async fn load_po(tx: &mut Transaction<'_, Postgres>, id: Uuid) -> AppResult<PurchaseOrder> {
        let row = sqlx::query_as::<_, PoRow>(
            r#"
            SELECT id, po_no, supplier_id, created_at, created_by, status
            FROM purchase_orders
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Purchase order {} not found", id)))?;

        let lines = Self::load_po_lines(tx, id).await?;
        Self::assemble_po(row, lines)
    }

    async fn load_po_for_update(
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
    ) -> AppResult<PurchaseOrder> {
        let row = sqlx::query_as::<_, PoRow>(
            r#"
            SELECT id, po_no, supplier_id, created_at, created_by, status
            FROM purchase_orders
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Purchase order {} not found", id)))?;

        let lines = Self::load_po_lines(tx, id).await?;
        Self::assemble_po(row, lines)
    }

    async fn load_po_lines(
        tx: &mut Transaction<'_, Postgres>,
        po_id: Uuid,
    ) -> AppResult<Vec<PoLine>> {
        let rows = sqlx::query_as::<_, PoLineRow>(
            r#"
            SELECT po_id, inventory_id, ordered_qty, received_qty, unit_cost, eta
            FROM po_lines
            WHERE po_id = $1
            ORDER BY line_no
            "#,
        )
        .bind(po_id)
        .fetch_all(&mut **tx)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| PoLine {
                inventory_id: row.inventory_id,
                ordered_qty: row.ordered_qty,
                received_qty: row.received_qty,
                unit_cost: row.unit_cost,
                eta: row.eta,
            })
            .collect())
    }

    fn assemble_pr(row: PrRow, lines: Vec<PrLine>) -> AppResult<PurchaseRequest> {
        let status = PrStatus::from_str(&row.status)
            .map_err(|e| AppError::Internal(format!("Corrupt purchase request status: {}", e)))?;
        Ok(PurchaseRequest {
            id: row.id,
            pr_no: row.pr_no,
            created_at: row.created_at,
            created_by: row.created_by,
            status,
            lines,
        })
    }

    fn assemble_po(row: PoRow, lines: Vec<PoLine>) -> AppResult<PurchaseOrder> {
        let status = PoStatus::from_str(&row.status)
            .map_err(|e| AppError::Internal(format!("Corrupt purchase order status: {}", e)))?;
        Ok(PurchaseOrder {
            id: row.id,
            po_no: row.po_no,
            supplier_id: row.supplier_id,
            created_at: row.created_at,
            created_by: row.created_by,
            status,
            lines,
        })
    }
}
