//! Dashboard summary service

use serde::Serialize;
use sqlx::PgPool;

use crate::error::AppResult;

/// Dashboard service
#[derive(Clone)]
pub struct DashboardService {
    db: PgPool,
}

/// Headline counts for the dashboard
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_items: i64,
    pub low_stock_count: i64,
    pub open_prs: i64,
    pub pending_pos: i64,
}

impl DashboardService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Compute the four headline counts in one round trip
    ///
    /// Low stock uses the effective reorder point: the reorder point when
    /// configured above zero, otherwise the minimum stock level. Open PRs
    /// are DRAFT or SUBMITTED; pending POs are anything not CLOSED or
    /// CANCELLED.
    pub async fn summary(&self) -> AppResult<DashboardSummary> {
        let (total_items, low_stock_count, open_prs, pending_pos) =
            sqlx::query_as::<_, (i64, i64, i64, i64)>(
                r#"
                SELECT
                    (SELECT COUNT(*) FROM inventory_items),
                    (SELECT COUNT(*) FROM inventory_items
                     WHERE quantity_on_hand <=
                           CASE WHEN COALESCE(reorder_point, 0) > 0
                                THEN reorder_point
                                ELSE min_stock
                           END),
                    (SELECT COUNT(*) FROM purchase_requests
                     WHERE status IN ('DRAFT', 'SUBMITTED')),
                    (SELECT COUNT(*) FROM purchase_orders
                     WHERE status NOT IN ('CLOSED', 'CANCELLED'))
                "#,
            )
            .fetch_one(&self.db)
            .await?;

        Ok(DashboardSummary {
            total_items,
            low_stock_count,
            open_prs,
            pending_pos,
        })
    }
}
