//! Order schedule service
//!
//! Persists the three schedule statuses; the richer display states (due
//! soon, delayed, partial receive) are derived on read with today's date.
//! Receiving against a schedule appends a RECEIVE stock movement in the
//! same database transaction.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use shared::{
    merge_schedule_lines, validate_receipts, LineRequest, OrderSchedule, OrderScheduleLine,
    ReceiptRequest, ScheduleStatus, TxnType,
};
use sqlx::{PgPool, Postgres, Transaction};
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::ledger::{LedgerService, TxnInput};

/// Order schedule service
#[derive(Clone)]
pub struct ScheduleService {
    db: PgPool,
}

/// A schedule with its derived display state
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleView {
    #[serde(flatten)]
    pub schedule: OrderSchedule,
    pub display_state: String,
}

impl ScheduleView {
    fn of(schedule: OrderSchedule, today: NaiveDate) -> Self {
        let display_state = schedule.display_state(today).to_string();
        Self {
            schedule,
            display_state,
        }
    }
}

/// Input for creating or updating a schedule
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleInput {
    pub scheduled_date: NaiveDate,
    pub supplier_id: Uuid,
    #[serde(default)]
    pub remark: String,
    pub lines: Vec<ScheduleLineInput>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleLineInput {
    pub inventory_id: Uuid,
    pub qty: i64,
}

/// Input for the cancel/complete status endpoint
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusInput {
    pub status: ScheduleStatus,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RescheduleInput {
    pub scheduled_date: NaiveDate,
}

/// Input for receiving goods against a schedule
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleReceiveInput {
    pub receipts: Vec<ReceiptRequest>,
    pub remark: Option<String>,
}

#[derive(Debug, sqlx::FromRow)]
struct ScheduleRow {
    id: Uuid,
    scheduled_date: NaiveDate,
    created_by: String,
    supplier_id: Uuid,
    remark: String,
    status: String,
    created_at: DateTime<Utc>,
    last_updated: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct ScheduleLineRow {
    schedule_id: Uuid,
    inventory_id: Uuid,
    qty: i64,
    received_qty: i64,
}

impl ScheduleService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// List schedules, soonest first, with display states for today
    pub async fn list(&self) -> AppResult<Vec<ScheduleView>> {
        let rows = sqlx::query_as::<_, ScheduleRow>(
            r#"
            SELECT id, scheduled_date, created_by, supplier_id, remark,
                   status, created_at, last_updated
            FROM order_schedules
            ORDER BY scheduled_date, created_at
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        let line_rows = sqlx::query_as::<_, ScheduleLineRow>(
            r#"
            SELECT schedule_id, inventory_id, qty, received_qty
            FROM order_schedule_lines
            ORDER BY line_no
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        let mut lines_by_schedule: HashMap<Uuid, Vec<OrderScheduleLine>> = HashMap::new();
        for row in line_rows {
            lines_by_schedule
                .entry(row.schedule_id)
                .or_default()
                .push(OrderScheduleLine {
                    inventory_id: row.inventory_id,
                    qty: row.qty,
                    received_qty: row.received_qty,
                });
        }

        let today = Utc::now().date_naive();
        rows.into_iter()
            .map(|row| {
                let lines = lines_by_schedule.remove(&row.id).unwrap_or_default();
                Ok(ScheduleView::of(Self::assemble(row, lines)?, today))
            })
            .collect()
    }

    /// Get a schedule by ID with its display state for today
    pub async fn get(&self, id: Uuid) -> AppResult<ScheduleView> {
        let mut tx = self.db.begin().await?;
        let schedule = Self::load(&mut tx, id).await?;
        tx.commit().await?;
        Ok(ScheduleView::of(schedule, Utc::now().date_naive()))
    }

    /// Create a schedule in SCHEDULED
    ///
    /// Lines repeating an item are merged into one, so every schedule
    /// carries at most one line per item.
    pub async fn create(&self, created_by: &str, input: ScheduleInput) -> AppResult<ScheduleView> {
        Self::validate_input(&input)?;
        let lines = Self::merged_lines(&input);

        let mut tx = self.db.begin().await?;
        Self::check_items_exist(&mut tx, &input).await?;
        Self::check_supplier_active(&mut tx, input.supplier_id).await?;

        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO order_schedules (scheduled_date, created_by, supplier_id, remark, status)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(input.scheduled_date)
        .bind(created_by)
        .bind(input.supplier_id)
        .bind(&input.remark)
        .bind(ScheduleStatus::Scheduled.as_str())
        .fetch_one(&mut *tx)
        .await?;

        Self::insert_lines(&mut tx, id, &lines).await?;

        let schedule = Self::load(&mut tx, id).await?;
        tx.commit().await?;
        Ok(ScheduleView::of(schedule, Utc::now().date_naive()))
    }

    /// Replace a schedule's date, supplier, remark and lines
    ///
    /// Receipt progress is discarded with the old lines; only an open
    /// schedule may be edited.
    pub async fn update(&self, id: Uuid, input: ScheduleInput) -> AppResult<ScheduleView> {
        Self::validate_input(&input)?;
        let lines = Self::merged_lines(&input);

        let mut tx = self.db.begin().await?;
        let schedule = Self::load_for_update(&mut tx, id).await?;
        if schedule.status != ScheduleStatus::Scheduled {
            return Err(AppError::Conflict {
                resource: "order_schedule".to_string(),
                message: format!(
                    "Only a SCHEDULED order can be edited (current: {})",
                    schedule.status.as_str()
                ),
            });
        }
        Self::check_items_exist(&mut tx, &input).await?;
        Self::check_supplier_active(&mut tx, input.supplier_id).await?;

        sqlx::query(
            r#"
            UPDATE order_schedules
            SET scheduled_date = $2, supplier_id = $3, remark = $4,
                last_updated = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(input.scheduled_date)
        .bind(input.supplier_id)
        .bind(&input.remark)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM order_schedule_lines WHERE schedule_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        Self::insert_lines(&mut tx, id, &lines).await?;

        let schedule = Self::load(&mut tx, id).await?;
        tx.commit().await?;
        Ok(ScheduleView::of(schedule, Utc::now().date_naive()))
    }

    /// Delete a schedule and its lines
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        sqlx::query("DELETE FROM order_schedule_lines WHERE schedule_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM order_schedules WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Order schedule {} not found", id)));
        }

        tx.commit().await?;
        Ok(())
    }

    /// Postpone an open schedule to a new date
    pub async fn reschedule(&self, id: Uuid, input: RescheduleInput) -> AppResult<ScheduleView> {
        let mut tx = self.db.begin().await?;

        let mut schedule = Self::load_for_update(&mut tx, id).await?;
        schedule.reschedule(input.scheduled_date)?;

        sqlx::query(
            "UPDATE order_schedules SET scheduled_date = $2, last_updated = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(schedule.scheduled_date)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(ScheduleView::of(schedule, Utc::now().date_naive()))
    }

    /// Cancel or complete an open schedule
    pub async fn set_status(&self, id: Uuid, input: StatusInput) -> AppResult<ScheduleView> {
        let mut tx = self.db.begin().await?;

        let mut schedule = Self::load_for_update(&mut tx, id).await?;
        match input.status {
            ScheduleStatus::Cancelled => schedule.cancel()?,
            ScheduleStatus::Completed => schedule.complete()?,
            ScheduleStatus::Scheduled => {
                return Err(AppError::Validation {
                    field: "status".to_string(),
                    message: "Status can only be set to COMPLETED or CANCELLED".to_string(),
                })
            }
        }

        sqlx::query("UPDATE order_schedules SET status = $2, last_updated = NOW() WHERE id = $1")
            .bind(id)
            .bind(schedule.status.as_str())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(ScheduleView::of(schedule, Utc::now().date_naive()))
    }

    /// Receive goods against an open schedule
    ///
    /// Validated receipts update the lines' progress and append a RECEIVE
    /// stock movement; the persisted status stays SCHEDULED and the
    /// display state derives completion from the remaining quantity.
    pub async fn receive(
        &self,
        id: Uuid,
        performed_by: &str,
        input: ScheduleReceiveInput,
    ) -> AppResult<ScheduleView> {
        let mut tx = self.db.begin().await?;

        let schedule = Self::load_for_update(&mut tx, id).await?;
        if schedule.status != ScheduleStatus::Scheduled {
            return Err(AppError::Conflict {
                resource: "order_schedule".to_string(),
                message: format!(
                    "Only a SCHEDULED order can receive goods (current: {})",
                    schedule.status.as_str()
                ),
            });
        }

        let item_ids: Vec<Uuid> = schedule.lines.iter().map(|l| l.inventory_id).collect();
        let part_names = Self::load_part_names(&mut tx, &item_ids).await?;
        let accepted = validate_receipts(&schedule.lines, &input.receipts, &part_names)?;

        let mut totals: HashMap<Uuid, i64> = HashMap::new();
        for receipt in &accepted {
            *totals.entry(receipt.inventory_id).or_insert(0) += receipt.qty_received;
        }
        // Creation merges duplicate items, so one line per item is hit
        for (inventory_id, qty) in &totals {
            sqlx::query(
                r#"
                UPDATE order_schedule_lines
                SET received_qty = received_qty + $3
                WHERE schedule_id = $1 AND inventory_id = $2
                "#,
            )
            .bind(id)
            .bind(inventory_id)
            .bind(qty)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("UPDATE order_schedules SET last_updated = NOW() WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let txn_input = TxnInput {
            txn_type: TxnType::Receive,
            txn_time: None,
            counterparty: String::new(),
            reference: id.to_string(),
            remark: input.remark.unwrap_or_default(),
            reason_code: None,
            source_location: None,
            destination_location: None,
            document_type: Some("SCHEDULE".to_string()),
            document_no: Some(id.to_string()),
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

        let schedule = Self::load(&mut tx, id).await?;
        tx.commit().await?;
        Ok(ScheduleView::of(schedule, Utc::now().date_naive()))
    }

    fn validate_input(input: &ScheduleInput) -> AppResult<()> {
        if input.lines.is_empty() {
            return Err(AppError::Validation {
                field: "lines".to_string(),
                message: "A schedule needs at least one line".to_string(),
            });
        }
        for line in &input.lines {
            if line.qty <= 0 {
                return Err(AppError::Validation {
                    field: "qty".to_string(),
                    message: "Line quantity must be positive".to_string(),
                });
            }
        }
        Ok(())
    }

    /// New schedules may only point at an active supplier
    async fn check_supplier_active(
        tx: &mut Transaction<'_, Postgres>,
        supplier_id: Uuid,
    ) -> AppResult<()> {
        let active = sqlx::query_scalar::<_, bool>("SELECT active FROM suppliers WHERE id = $1")
            .bind(supplier_id)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Supplier {} not found", supplier_id)))?;

        if !active {
            return Err(AppError::Conflict {
                resource: "supplier".to_string(),
                message: format!("Supplier {} is inactive", supplier_id),
            });
        }
        Ok(())
    }

    async fn check_items_exist(
        tx: &mut Transaction<'_, Postgres>,
        input: &ScheduleInput,
    ) -> AppResult<()> {
        let item_ids: Vec<Uuid> = input.lines.iter().map(|l| l.inventory_id).collect();
        let known =
            sqlx::query_scalar::<_, Uuid>("SELECT id FROM inventory_items WHERE id = ANY($1)")
                .bind(&item_ids)
                .fetch_all(&mut **tx)
                .await?;
        for id in &item_ids {
            if !known.contains(id) {
                return Err(AppError::NotFound(format!("Inventory item {} not found", id)));
            }
        }
        Ok(())
    }

    fn merged_lines(input: &ScheduleInput) -> Vec<OrderScheduleLine> {
        merge_schedule_lines(
            input
                .lines
                .iter()
                .map(|l| OrderScheduleLine {
                    inventory_id: l.inventory_id,
                    qty: l.qty,
                    received_qty: 0,
                })
                .collect(),
        )
    }

    async fn insert_lines(
        tx: &mut Transaction<'_, Postgres>,
        schedule_id: Uuid,
        lines: &[OrderScheduleLine],
    ) -> AppResult<()> {
        for (line_no, line) in lines.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO order_schedule_lines (schedule_id, line_no, inventory_id, qty)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(schedule_id)
            .bind(line_no as i32)
            .bind(line.inventory_id)
            .bind(line.qty)
            .execute(&mut **tx)
            .await?;
        }
        Ok(())
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

    async fn load(tx: &mut Transaction<'_, Postgres>, id: Uuid) -> AppResult<OrderSchedule> {
        let row = sqlx::query_as::<_, ScheduleRow>(
            r#"
            SELECT id, scheduled_date, created_by, supplier_id, remark,
                   status, created_at, last_updated
            FROM order_schedules
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Order schedule {} not found", id)))?;

        let lines = Self::load_lines(tx, id).await?;
        Self::assemble(row, lines)
    }

    async fn load_for_update(
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
    ) -> AppResult<OrderSchedule> {
        let row = sqlx::query_as::<_, ScheduleRow>(
            r#"
            SELECT id, scheduled_date, created_by, supplier_id, remark,
                   status, created_at, last_updated
            FROM order_schedules
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Order schedule {} not found", id)))?;

        let lines = Self::load_lines(tx, id).await?;
        Self::assemble(row, lines)
    }

    async fn load_lines(
        tx: &mut Transaction<'_, Postgres>,
        schedule_id: Uuid,
    ) -> AppResult<Vec<OrderScheduleLine>> {
        let rows = sqlx::query_as::<_, ScheduleLineRow>(
            r#"
            SELECT schedule_id, inventory_id, qty, received_qty
            FROM order_schedule_lines
            WHERE schedule_id = $1
            ORDER BY line_no
            "#,
        )
        .bind(schedule_id)
        .fetch_all(&mut **tx)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| OrderScheduleLine {
                inventory_id: row.inventory_id,
                qty: row.qty,
                received_qty: row.received_qty,
            })
            .collect())
    }

    fn assemble(row: ScheduleRow, lines: Vec<OrderScheduleLine>) -> AppResult<OrderSchedule> {
        let status = ScheduleStatus::from_str(&row.status)
            .map_err(|e| AppError::Internal(format!("Corrupt schedule status: {}", e)))?;
        Ok(OrderSchedule {
            id: row.id,
            scheduled_date: row.scheduled_date,
            created_by: row.created_by,
            supplier_id: row.supplier_id,
            remark: row.remark,
            status,
            lines,
            created_at: row.created_at,
            last_updated: row.last_updated,
        })
    }
}
