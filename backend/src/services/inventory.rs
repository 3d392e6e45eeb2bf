//! Inventory service for spare part records and stock-level reporting
//!
//! Metadata CRUD never touches `quantity_on_hand`; that column belongs to
//! the stock ledger and the receiving operations.

use base64::Engine;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use shared::{
    low_stock_items, reorder_suggestions, Criticality, InventoryFilter, InventoryItem, PartStatus,
    ReorderSuggestion,
};
use sqlx::PgPool;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Inventory service
#[derive(Clone)]
pub struct InventoryService {
    db: PgPool,
}

/// Input for creating or replacing a spare part record
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryInput {
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
    #[serde(default)]
    pub min_stock: i64,
    pub reorder_point: Option<i64>,
    pub reorder_qty: Option<i64>,
    pub preferred_supplier_id: Option<Uuid>,
    pub location_bin: Option<String>,
    /// Only honoured on create; updates never touch stock
    #[serde(default)]
    pub quantity_on_hand: i64,
}

/// Partial update applied to every item in a bulk edit
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryBulkPatch {
    pub building: Option<String>,
    pub room: Option<String>,
    pub part_category: Option<String>,
    pub status: Option<PartStatus>,
    pub criticality: Option<Criticality>,
    pub remark: Option<String>,
    pub min_stock: Option<i64>,
    pub reorder_point: Option<i64>,
    pub reorder_qty: Option<i64>,
    pub preferred_supplier_id: Option<Uuid>,
    pub location_bin: Option<String>,
}

/// Inventory item row from database
#[derive(Debug, sqlx::FromRow)]
pub struct InventoryRow {
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
    pub status: String,
    pub criticality: Option<String>,
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

impl TryFrom<InventoryRow> for InventoryItem {
    type Error = AppError;

    fn try_from(row: InventoryRow) -> Result<Self, Self::Error> {
        let status = PartStatus::from_str(&row.status)
            .map_err(|e| AppError::Internal(format!("Corrupt part status: {}", e)))?;
        let criticality = row
            .criticality
            .as_deref()
            .map(Criticality::from_str)
            .transpose()
            .map_err(|e| AppError::Internal(format!("Corrupt criticality: {}", e)))?;

        Ok(InventoryItem {
            id: row.id,
            building: row.building,
            room: row.room,
            tag_no: row.tag_no,
            installation_type: row.installation_type,
            system_type: row.system_type,
            brand: row.brand,
            equipment_model: row.equipment_model,
            part_category: row.part_category,
            part_name: row.part_name,
            part_model: row.part_model,
            unit: row.unit,
            status,
            criticality,
            image_base64: row.image_base64,
            specs: row.specs,
            warranty_expiry: row.warranty_expiry,
            remark: row.remark,
            min_stock: row.min_stock,
            reorder_point: row.reorder_point,
            reorder_qty: row.reorder_qty,
            preferred_supplier_id: row.preferred_supplier_id,
            location_bin: row.location_bin,
            quantity_on_hand: row.quantity_on_hand,
            last_updated: row.last_updated,
            row_version: row.row_version,
        })
    }
}

const SELECT_ITEM: &str = r#"
    SELECT id, building, room, tag_no, installation_type, system_type,
           brand, equipment_model, part_category, part_name, part_model,
           unit, status, criticality, image_base64, specs, warranty_expiry,
           remark, min_stock, reorder_point, reorder_qty,
           preferred_supplier_id, location_bin, quantity_on_hand,
           last_updated, row_version
    FROM inventory_items
"#;

impl InventoryService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// List inventory items with optional search and facet filters
    pub async fn list(&self, filter: InventoryFilter) -> AppResult<Vec<InventoryItem>> {
        let rows = sqlx::query_as::<_, InventoryRow>(&format!(
            r#"{SELECT_ITEM}
            WHERE ($1::text IS NULL
                   OR part_name ILIKE '%' || $1 || '%'
                   OR tag_no ILIKE '%' || $1 || '%'
                   OR brand ILIKE '%' || $1 || '%'
                   OR equipment_model ILIKE '%' || $1 || '%')
              AND ($2::text IS NULL OR building = $2)
              AND ($3::text IS NULL OR part_category = $3)
              AND ($4::text IS NULL OR status = $4)
            ORDER BY part_name, building
            "#
        ))
        .bind(filter.search)
        .bind(filter.building)
        .bind(filter.category)
        .bind(filter.status)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(InventoryItem::try_from).collect()
    }

    /// Get an inventory item by ID
    pub async fn get(&self, id: Uuid) -> AppResult<InventoryItem> {
        let row = sqlx::query_as::<_, InventoryRow>(&format!("{SELECT_ITEM} WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Inventory item {} not found", id)))?;

        InventoryItem::try_from(row)
    }

    /// Create a new spare part record
    pub async fn create(&self, input: InventoryInput) -> AppResult<InventoryItem> {
        Self::validate_input(&input)?;

        let row = sqlx::query_as::<_, InventoryRow>(&format!(
            r#"
            INSERT INTO inventory_items (
                building, room, tag_no, installation_type, system_type,
                brand, equipment_model, part_category, part_name, part_model,
                unit, status, criticality, image_base64, specs,
                warranty_expiry, remark, min_stock, reorder_point, reorder_qty,
                preferred_supplier_id, location_bin, quantity_on_hand
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13,
                    $14, $15, $16, $17, $18, $19, $20, $21, $22, $23)
            RETURNING {COLUMNS}
            "#,
            COLUMNS = RETURNING_COLUMNS
        ))
        .bind(&input.building)
        .bind(&input.room)
        .bind(&input.tag_no)
        .bind(&input.installation_type)
        .bind(&input.system_type)
        .bind(&input.brand)
        .bind(&input.equipment_model)
        .bind(&input.part_category)
        .bind(&input.part_name)
        .bind(&input.part_model)
        .bind(&input.unit)
        .bind(input.status.as_str())
        .bind(input.criticality.map(|c| c.as_str()))
        .bind(&input.image_base64)
        .bind(&input.specs)
        .bind(input.warranty_expiry)
        .bind(&input.remark)
        .bind(input.min_stock)
        .bind(input.reorder_point)
        .bind(input.reorder_qty)
        .bind(input.preferred_supplier_id)
        .bind(&input.location_bin)
        .bind(input.quantity_on_hand.max(0))
        .fetch_one(&self.db)
        .await?;

        InventoryItem::try_from(row)
    }

    /// Update an inventory item's metadata
    ///
    /// `quantity_on_hand` is deliberately absent from the SET list.
    pub async fn update(&self, id: Uuid, input: InventoryInput) -> AppResult<InventoryItem> {
        Self::validate_input(&input)?;

        let row = sqlx::query_as::<_, InventoryRow>(&format!(
            r#"
            UPDATE inventory_items SET
                building = $2, room = $3, tag_no = $4, installation_type = $5,
                system_type = $6, brand = $7, equipment_model = $8,
                part_category = $9, part_name = $10, part_model = $11,
                unit = $12, status = $13, criticality = $14,
                image_base64 = $15, specs = $16, warranty_expiry = $17,
                remark = $18, min_stock = $19, reorder_point = $20,
                reorder_qty = $21, preferred_supplier_id = $22,
                location_bin = $23,
                last_updated = NOW(), row_version = row_version + 1
            WHERE id = $1
            RETURNING {COLUMNS}
            "#,
            COLUMNS = RETURNING_COLUMNS
        ))
        .bind(id)
        .bind(&input.building)
        .bind(&input.room)
        .bind(&input.tag_no)
        .bind(&input.installation_type)
        .bind(&input.system_type)
        .bind(&input.brand)
        .bind(&input.equipment_model)
        .bind(&input.part_category)
        .bind(&input.part_name)
        .bind(&input.part_model)
        .bind(&input.unit)
        .bind(input.status.as_str())
        .bind(input.criticality.map(|c| c.as_str()))
        .bind(&input.image_base64)
        .bind(&input.specs)
        .bind(input.warranty_expiry)
        .bind(&input.remark)
        .bind(input.min_stock)
        .bind(input.reorder_point)
        .bind(input.reorder_qty)
        .bind(input.preferred_supplier_id)
        .bind(&input.location_bin)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Inventory item {} not found", id)))?;

        InventoryItem::try_from(row)
    }

    /// Delete an inventory item
    ///
    /// Refused while an open purchase order still references the part, so
    /// receiving never lands on a dangling item.
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let open_po_refs = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM po_lines pl
            JOIN purchase_orders po ON po.id = pl.po_id
            WHERE pl.inventory_id = $1
              AND po.status NOT IN ('CLOSED', 'CANCELLED')
            "#,
        )
        .bind(id)
        .fetch_one(&self.db)
        .await?;

        if open_po_refs > 0 {
            return Err(AppError::Conflict {
                resource: "inventory".to_string(),
                message: format!(
                    "Inventory item {} is referenced by an open purchase order",
                    id
                ),
            });
        }

        let result = sqlx::query("DELETE FROM inventory_items WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Inventory item {} not found",
                id
            )));
        }

        Ok(())
    }

    /// Apply a partial update to several items
    ///
    /// Each item is updated independently; a failure part-way through
    /// leaves earlier updates in place.
    pub async fn bulk_update(
        &self,
        ids: &[Uuid],
        patch: &InventoryBulkPatch,
    ) -> AppResult<Vec<InventoryItem>> {
        let mut updated = Vec::with_capacity(ids.len());

        for &id in ids {
            let row = sqlx::query_as::<_, InventoryRow>(&format!(
                r#"
                UPDATE inventory_items SET
                    building = COALESCE($2, building),
                    room = COALESCE($3, room),
                    part_category = COALESCE($4, part_category),
                    status = COALESCE($5, status),
                    criticality = COALESCE($6, criticality),
                    remark = COALESCE($7, remark),
                    min_stock = COALESCE($8, min_stock),
                    reorder_point = COALESCE($9, reorder_point),
                    reorder_qty = COALESCE($10, reorder_qty),
                    preferred_supplier_id = COALESCE($11, preferred_supplier_id),
                    location_bin = COALESCE($12, location_bin),
                    last_updated = NOW(), row_version = row_version + 1
                WHERE id = $1
                RETURNING {COLUMNS}
                "#,
                COLUMNS = RETURNING_COLUMNS
            ))
            .bind(id)
            .bind(&patch.building)
            .bind(&patch.room)
            .bind(&patch.part_category)
            .bind(patch.status.map(|s| s.as_str()))
            .bind(patch.criticality.map(|c| c.as_str()))
            .bind(&patch.remark)
            .bind(patch.min_stock)
            .bind(patch.reorder_point)
            .bind(patch.reorder_qty)
            .bind(patch.preferred_supplier_id)
            .bind(&patch.location_bin)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Inventory item {} not found", id)))?;

            updated.push(InventoryItem::try_from(row)?);
        }

        Ok(updated)
    }

    /// Delete several items, each with the open-PO guard applied
    pub async fn bulk_delete(&self, ids: &[Uuid]) -> AppResult<u64> {
        let mut deleted = 0;
        for &id in ids {
            self.delete(id).await?;
            deleted += 1;
        }
        Ok(deleted)
    }

    /// Items at or below their effective reorder point
    pub async fn low_stock(&self) -> AppResult<Vec<InventoryItem>> {
        let all = self.list(InventoryFilter::default()).await?;
        Ok(low_stock_items(&all).into_iter().cloned().collect())
    }

    /// Replenishment proposals for every low-stock item, ranked by the
    /// total suggested quantity per part name
    pub async fn reorder_report(&self) -> AppResult<Vec<ReorderSuggestion>> {
        let all = self.list(InventoryFilter::default()).await?;
        Ok(reorder_suggestions(&all))
    }

    fn validate_input(input: &InventoryInput) -> AppResult<()> {
        if input.part_name.trim().is_empty() {
            return Err(AppError::Validation {
                field: "partName".to_string(),
                message: "Part name is required".to_string(),
            });
        }
        if input.building.trim().is_empty() {
            return Err(AppError::Validation {
                field: "building".to_string(),
                message: "Building is required".to_string(),
            });
        }
        if input.min_stock < 0 {
            return Err(AppError::Validation {
                field: "minStock".to_string(),
                message: "Minimum stock cannot be negative".to_string(),
            });
        }

        if let Some(image) = &input.image_base64 {
            let payload = image.rsplit_once("base64,").map_or(image.as_str(), |(_, b)| b);
            base64::engine::general_purpose::STANDARD
                .decode(payload)
                .map_err(|_| AppError::Validation {
                    field: "imageBase64".to_string(),
                    message: "Image must be valid base64".to_string(),
                })?;
        }

        Ok(())
    }
}

const RETURNING_COLUMNS: &str = r#"
    id, building, room, tag_no, installation_type, system_type,
    brand, equipment_model, part_category, part_name, part_model,
    unit, status, criticality, image_base64, specs, warranty_expiry,
    remark, min_stock, reorder_point, reorder_qty,
    preferred_supplier_id, location_bin, quantity_on_hand,
    last_updated, row_version
"#;
