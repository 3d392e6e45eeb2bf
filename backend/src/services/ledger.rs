//! Stock ledger service
//!
//! Persists stock transactions planned by the pure rules in `shared`.
//! Every commit runs in a single database transaction: the snapshot read
//! locks the touched items, the plan is computed in memory, and either
//! every line and quantity update lands or none do.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use shared::{
    plan_amendment, plan_lines, plan_reversal, reversal_deltas, ItemSnapshot, LineRequest,
    StockTxn, StockTxnLine, TxnType,
};
use sqlx::{PgPool, Postgres, Transaction};
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Stock ledger service
#[derive(Clone)]
pub struct LedgerService {
    db: PgPool,
}

/// Input for recording or amending a stock transaction
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxnInput {
    pub txn_type: TxnType,
    pub txn_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub counterparty: String,
    #[serde(default)]
    pub reference: String,
    #[serde(default)]
    pub remark: String,
    pub reason_code: Option<String>,
    pub source_location: Option<String>,
    pub destination_location: Option<String>,
    pub document_type: Option<String>,
    pub document_no: Option<String>,
    pub approved_by: Option<String>,
    pub lines: Vec<LineRequest>,
}

#[derive(Debug, sqlx::FromRow)]
struct TxnRow {
    id: Uuid,
    txn_type: String,
    txn_time: DateTime<Utc>,
    performed_by: String,
    counterparty: String,
    reference: String,
    remark: String,
    reason_code: Option<String>,
    source_location: Option<String>,
    destination_location: Option<String>,
    document_type: Option<String>,
    document_no: Option<String>,
    approved_by: Option<String>,
}

#[derive(Debug, sqlx::FromRow)]
struct TxnLineRow {
    txn_id: Uuid,
    inventory_id: Uuid,
    qty: i64,
    unit_cost: Option<Decimal>,
    before_qty: i64,
    after_qty: i64,
}

const SELECT_TXN: &str = r#"
    SELECT id, txn_type, txn_time, performed_by, counterparty, reference,
           remark, reason_code, source_location, destination_location,
           document_type, document_no, approved_by
    FROM stock_txns
"#;

impl LedgerService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// List all transactions, newest first, with their lines
    pub async fn list(&self) -> AppResult<Vec<StockTxn>> {
        let rows =
            sqlx::query_as::<_, TxnRow>(&format!("{SELECT_TXN} ORDER BY txn_time DESC, id"))
                .fetch_all(&self.db)
                .await?;

        let line_rows = sqlx::query_as::<_, TxnLineRow>(
            r#"
            SELECT txn_id, inventory_id, qty, unit_cost, before_qty, after_qty
            FROM stock_txn_lines
            ORDER BY line_no
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        let mut lines_by_txn: HashMap<Uuid, Vec<StockTxnLine>> = HashMap::new();
        for row in line_rows {
            lines_by_txn.entry(row.txn_id).or_default().push(StockTxnLine {
                inventory_id: row.inventory_id,
                qty: row.qty,
                unit_cost: row.unit_cost,
                before_qty: row.before_qty,
                after_qty: row.after_qty,
            });
        }

        rows.into_iter()
            .map(|row| {
                let lines = lines_by_txn.remove(&row.id).unwrap_or_default();
                Self::assemble(row, lines)
            })
            .collect()
    }

    /// Get a transaction by ID
    pub async fn get(&self, id: Uuid) -> AppResult<StockTxn> {
        let row = sqlx::query_as::<_, TxnRow>(&format!("{SELECT_TXN} WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Transaction {} not found", id)))?;

        let lines = self.load_lines(id).await?;
        Self::assemble(row, lines)
    }

    /// Record a new stock transaction and apply it to on-hand quantities
    pub async fn record(&self, performed_by: &str, input: TxnInput) -> AppResult<StockTxn> {
        if input.lines.is_empty() {
            return Err(AppError::Validation {
                field: "lines".to_string(),
                message: "A transaction needs at least one line".to_string(),
            });
        }

        let mut tx = self.db.begin().await?;
        let txn_id = Self::record_in_tx(&mut tx, performed_by, &input).await?;
        tx.commit().await?;

        self.get(txn_id).await
    }

    /// Plan and persist a transaction inside an existing database
    /// transaction
    ///
    /// Used directly by `record` and by the receiving operations, which
    /// append a RECEIVE movement in the same transaction that updates the
    /// order's lines.
    pub(crate) async fn record_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        performed_by: &str,
        input: &TxnInput,
    ) -> AppResult<Uuid> {
        let item_ids: Vec<Uuid> = input.lines.iter().map(|l| l.inventory_id).collect();
        let stock = Self::lock_snapshots(tx, &item_ids).await?;
        let planned = plan_lines(input.txn_type, &input.lines, &stock)?;

        let txn_time = input.txn_time.unwrap_or_else(Utc::now);
        let txn_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO stock_txns (
                txn_type, txn_time, performed_by, counterparty, reference,
                remark, reason_code, source_location, destination_location,
                document_type, document_no, approved_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING id
            "#,
        )
        .bind(input.txn_type.as_str())
        .bind(txn_time)
        .bind(performed_by)
        .bind(&input.counterparty)
        .bind(&input.reference)
        .bind(&input.remark)
        .bind(&input.reason_code)
        .bind(&input.source_location)
        .bind(&input.destination_location)
        .bind(&input.document_type)
        .bind(&input.document_no)
        .bind(&input.approved_by)
        .fetch_one(&mut **tx)
        .await?;

        Self::insert_lines(tx, txn_id, &planned).await?;
        Self::apply_final_quantities(tx, &planned).await?;

        Ok(txn_id)
    }

    /// Amend a committed transaction
    ///
    /// The original effect is reversed and the new line set is planned
    /// against the restored quantities before anything is written, so a
    /// rejected amendment leaves both the ledger and stock untouched.
    pub async fn amend(&self, id: Uuid, input: TxnInput) -> AppResult<StockTxn> {
        if input.lines.is_empty() {
            return Err(AppError::Validation {
                field: "lines".to_string(),
                message: "A transaction needs at least one line".to_string(),
            });
        }

        let mut tx = self.db.begin().await?;

        let original = sqlx::query_as::<_, TxnRow>(&format!("{SELECT_TXN} WHERE id = $1"))
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Transaction {} not found", id)))?;
        let original_type = Self::parse_type(&original.txn_type)?;
        let original_lines = self.load_lines_in_tx(&mut tx, id).await?;

        let mut item_ids: Vec<Uuid> = original_lines.iter().map(|l| l.inventory_id).collect();
        item_ids.extend(input.lines.iter().map(|l| l.inventory_id));
        let stock = Self::lock_snapshots(&mut tx, &item_ids).await?;

        let planned = plan_amendment(
            original_type,
            &original_lines,
            input.txn_type,
            &input.lines,
            &stock,
        )?;

        // Undo the original effect on stock, then apply the new plan
        for (inventory_id, delta) in reversal_deltas(original_type, &original_lines) {
            Self::apply_delta(&mut tx, inventory_id, delta).await?;
        }

        sqlx::query(
            r#"
            UPDATE stock_txns SET
                txn_type = $2, txn_time = COALESCE($3, txn_time),
                counterparty = $4, reference = $5, remark = $6,
                reason_code = $7, source_location = $8,
                destination_location = $9, document_type = $10,
                document_no = $11, approved_by = $12
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(input.txn_type.as_str())
        .bind(input.txn_time)
        .bind(&input.counterparty)
        .bind(&input.reference)
        .bind(&input.remark)
        .bind(&input.reason_code)
        .bind(&input.source_location)
        .bind(&input.destination_location)
        .bind(&input.document_type)
        .bind(&input.document_no)
        .bind(&input.approved_by)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM stock_txn_lines WHERE txn_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        Self::insert_lines(&mut tx, id, &planned).await?;

        // The plan's after quantities already account for the reversal
        Self::apply_final_quantities(&mut tx, &planned).await?;

        tx.commit().await?;

        self.get(id).await
    }

    /// Delete a transaction, reversing its effect on stock
    ///
    /// Refused when later movements already consumed what the transaction
    /// brought in; the exact inverse must keep every quantity
    /// non-negative.
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        let original = sqlx::query_as::<_, TxnRow>(&format!("{SELECT_TXN} WHERE id = $1"))
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Transaction {} not found", id)))?;
        let original_type = Self::parse_type(&original.txn_type)?;
        let original_lines = self.load_lines_in_tx(&mut tx, id).await?;

        let item_ids: Vec<Uuid> = original_lines.iter().map(|l| l.inventory_id).collect();
        let stock = Self::lock_snapshots(&mut tx, &item_ids).await?;
        for (inventory_id, delta) in plan_reversal(original_type, &original_lines, &stock)? {
            Self::apply_delta(&mut tx, inventory_id, delta).await?;
        }

        sqlx::query("DELETE FROM stock_txn_lines WHERE txn_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM stock_txns WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Lock and snapshot the touched items inside the transaction
    async fn lock_snapshots(
        tx: &mut Transaction<'_, Postgres>,
        item_ids: &[Uuid],
    ) -> AppResult<HashMap<Uuid, ItemSnapshot>> {
        let rows = sqlx::query_as::<_, (Uuid, String, i64)>(
            r#"
            SELECT id, part_name, quantity_on_hand
            FROM inventory_items
            WHERE id = ANY($1)
            FOR UPDATE
            "#,
        )
        .bind(item_ids)
        .fetch_all(&mut **tx)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, part_name, quantity_on_hand)| {
                (
                    id,
                    ItemSnapshot {
                        part_name,
                        quantity_on_hand,
                    },
                )
            })
            .collect())
    }

    async fn insert_lines(
        tx: &mut Transaction<'_, Postgres>,
        txn_id: Uuid,
        lines: &[StockTxnLine],
    ) -> AppResult<()> {
        for (line_no, line) in lines.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO stock_txn_lines (
                    txn_id, line_no, inventory_id, qty, unit_cost,
                    before_qty, after_qty
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(txn_id)
            .bind(line_no as i32)
            .bind(line.inventory_id)
            .bind(line.qty)
            .bind(line.unit_cost)
            .bind(line.before_qty)
            .bind(line.after_qty)
            .execute(&mut **tx)
            .await?;
        }
        Ok(())
    }

    /// Write each item's final on-hand quantity from the plan
    ///
    /// With repeated lines for one item, the last line carries the final
    /// quantity, so later writes overwrite earlier ones.
    async fn apply_final_quantities(
        tx: &mut Transaction<'_, Postgres>,
        lines: &[StockTxnLine],
    ) -> AppResult<()> {
        let mut finals: HashMap<Uuid, i64> = HashMap::new();
        for line in lines {
            finals.insert(line.inventory_id, line.after_qty);
        }

        for (inventory_id, qty) in finals {
            sqlx::query(
                r#"
                UPDATE inventory_items
                SET quantity_on_hand = $2, last_updated = NOW(),
                    row_version = row_version + 1
                WHERE id = $1
                "#,
            )
            .bind(inventory_id)
            .bind(qty)
            .execute(&mut **tx)
            .await?;
        }
        Ok(())
    }

    /// Apply a reversal delta as the exact inverse of the original
    /// movement; the planner has already checked it stays non-negative
    async fn apply_delta(
        tx: &mut Transaction<'_, Postgres>,
        inventory_id: Uuid,
        delta: i64,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE inventory_items
            SET quantity_on_hand = quantity_on_hand + $2,
                last_updated = NOW(), row_version = row_version + 1
            WHERE id = $1
            "#,
        )
        .bind(inventory_id)
        .bind(delta)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    async fn load_lines(&self, txn_id: Uuid) -> AppResult<Vec<StockTxnLine>> {
        let rows = sqlx::query_as::<_, TxnLineRow>(
            r#"
            SELECT txn_id, inventory_id, qty, unit_cost, before_qty, after_qty
            FROM stock_txn_lines
            WHERE txn_id = $1
            ORDER BY line_no
            "#,
        )
        .bind(txn_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Self::line_from_row).collect())
    }

    async fn load_lines_in_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        txn_id: Uuid,
    ) -> AppResult<Vec<StockTxnLine>> {
        let rows = sqlx::query_as::<_, TxnLineRow>(
            r#"
            SELECT txn_id, inventory_id, qty, unit_cost, before_qty, after_qty
            FROM stock_txn_lines
            WHERE txn_id = $1
            ORDER BY line_no
            "#,
        )
        .bind(txn_id)
        .fetch_all(&mut **tx)
        .await?;

        Ok(rows.into_iter().map(Self::line_from_row).collect())
    }

    fn line_from_row(row: TxnLineRow) -> StockTxnLine {
        StockTxnLine {
            inventory_id: row.inventory_id,
            qty: row.qty,
            unit_cost: row.unit_cost,
            before_qty: row.before_qty,
            after_qty: row.after_qty,
        }
    }

    fn parse_type(raw: &str) -> AppResult<TxnType> {
        TxnType::from_str(raw)
            .map_err(|e| AppError::Internal(format!("Corrupt transaction type: {}", e)))
    }

    fn assemble(row: TxnRow, lines: Vec<StockTxnLine>) -> AppResult<StockTxn> {
        Ok(StockTxn {
            id: row.id,
            txn_type: Self::parse_type(&row.txn_type)?,
            txn_time: row.txn_time,
            performed_by: row.performed_by,
            counterparty: row.counterparty,
            reference: row.reference,
            remark: row.remark,
            reason_code: row.reason_code,
            source_location: row.source_location,
            destination_location: row.destination_location,
            document_type: row.document_type,
            document_no: row.document_no,
            approved_by: row.approved_by,
            lines,
        })
    }
}
