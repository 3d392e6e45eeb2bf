//! Supplier directory service

use serde::Deserialize;
use shared::{Supplier, SupplierPatch};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};

/// Supplier service
#[derive(Clone)]
pub struct SupplierService {
    db: PgPool,
}

/// Input for creating or replacing a supplier
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SupplierInput {
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub remark: String,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

/// Input for patching several suppliers at once
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkSupplierUpdate {
    pub ids: Vec<Uuid>,
    pub patch: SupplierPatch,
}

#[derive(Debug, sqlx::FromRow)]
struct SupplierRow {
    id: Uuid,
    name: String,
    email: String,
    phone: String,
    address: String,
    remark: String,
    active: bool,
}

impl From<SupplierRow> for Supplier {
    fn from(row: SupplierRow) -> Self {
        Supplier {
            id: row.id,
            name: row.name,
            email: row.email,
            phone: row.phone,
            address: row.address,
            remark: row.remark,
            active: row.active,
        }
    }
}

const SELECT_SUPPLIER: &str =
    "SELECT id, name, email, phone, address, remark, active FROM suppliers";

impl SupplierService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// List suppliers alphabetically
    pub async fn list(&self) -> AppResult<Vec<Supplier>> {
        let rows = sqlx::query_as::<_, SupplierRow>(&format!("{SELECT_SUPPLIER} ORDER BY name"))
            .fetch_all(&self.db)
            .await?;
        Ok(rows.into_iter().map(Supplier::from).collect())
    }

    /// Get a supplier by ID
    pub async fn get(&self, id: Uuid) -> AppResult<Supplier> {
        let row = sqlx::query_as::<_, SupplierRow>(&format!("{SELECT_SUPPLIER} WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Supplier {} not found", id)))?;
        Ok(row.into())
    }

    /// Create a supplier
    pub async fn create(&self, input: SupplierInput) -> AppResult<Supplier> {
        Self::validate(&input)?;

        let row = sqlx::query_as::<_, SupplierRow>(
            r#"
            INSERT INTO suppliers (name, email, phone, address, remark, active)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, name, email, phone, address, remark, active
            "#,
        )
        .bind(&input.name)
        .bind(&input.email)
        .bind(&input.phone)
        .bind(&input.address)
        .bind(&input.remark)
        .bind(input.active)
        .fetch_one(&self.db)
        .await?;

        Ok(row.into())
    }

    /// Replace a supplier's details
    pub async fn update(&self, id: Uuid, input: SupplierInput) -> AppResult<Supplier> {
        Self::validate(&input)?;

        let row = sqlx::query_as::<_, SupplierRow>(
            r#"
            UPDATE suppliers
            SET name = $2, email = $3, phone = $4, address = $5, remark = $6, active = $7
            WHERE id = $1
            RETURNING id, name, email, phone, address, remark, active
            "#,
        )
        .bind(id)
        .bind(&input.name)
        .bind(&input.email)
        .bind(&input.phone)
        .bind(&input.address)
        .bind(&input.remark)
        .bind(input.active)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Supplier {} not found", id)))?;

        Ok(row.into())
    }

    /// Delete a supplier
    ///
    /// Refused while inventory items or open purchase orders still point
    /// at the record; deactivate instead.
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let referenced = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT (SELECT COUNT(*) FROM inventory_items WHERE preferred_supplier_id = $1)
                 + (SELECT COUNT(*) FROM purchase_orders
                    WHERE supplier_id = $1 AND status NOT IN ('CLOSED', 'CANCELLED'))
            "#,
        )
        .bind(id)
        .fetch_one(&self.db)
        .await?;

        if referenced > 0 {
            return Err(AppError::Conflict {
                resource: "supplier".to_string(),
                message: format!("Supplier {} is still referenced; deactivate it instead", id),
            });
        }

        let result = sqlx::query("DELETE FROM suppliers WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Supplier {} not found", id)));
        }
        Ok(())
    }

    /// Patch several suppliers with the same field-level update
    ///
    /// Absent fields keep their stored values. Each supplier is updated
    /// independently; a failure part-way through leaves earlier updates in
    /// place.
    pub async fn bulk_update(&self, input: BulkSupplierUpdate) -> AppResult<Vec<Supplier>> {
        if input.patch.is_empty() {
            return Err(AppError::Validation {
                field: "patch".to_string(),
                message: "At least one field must be set".to_string(),
            });
        }
        if let Some(email) = &input.patch.email {
            if !validator::validate_email(email.as_str()) {
                return Err(AppError::Validation {
                    field: "email".to_string(),
                    message: "Invalid email address".to_string(),
                });
            }
        }

        let mut updated = Vec::with_capacity(input.ids.len());
        for &id in &input.ids {
            let mut supplier = self.get(id).await?;
            input.patch.apply_to(&mut supplier);

            let row = sqlx::query_as::<_, SupplierRow>(
                r#"
                UPDATE suppliers
                SET name = $2, email = $3, phone = $4, address = $5, remark = $6, active = $7
                WHERE id = $1
                RETURNING id, name, email, phone, address, remark, active
                "#,
            )
            .bind(id)
            .bind(&supplier.name)
            .bind(&supplier.email)
            .bind(&supplier.phone)
            .bind(&supplier.address)
            .bind(&supplier.remark)
            .bind(supplier.active)
            .fetch_one(&self.db)
            .await?;

            updated.push(row.into());
        }

        Ok(updated)
    }

    fn validate(input: &SupplierInput) -> AppResult<()> {
        if input.name.trim().is_empty() {
            return Err(AppError::Validation {
                field: "name".to_string(),
                message: "Supplier name is required".to_string(),
            });
        }
        input.validate().map_err(|_| AppError::Validation {
            field: "email".to_string(),
            message: "Invalid email address".to_string(),
        })
    }
}
