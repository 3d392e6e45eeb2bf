//! Common types used across the platform

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User roles, in descending order of privilege
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum UserRole {
    Admin,
    Storekeeper,
    Technician,
    Viewer,
}

impl UserRole {
    /// Roles allowed to mutate stock, purchasing and supplier records
    pub fn can_edit(&self) -> bool {
        matches!(self, UserRole::Admin | UserRole::Storekeeper)
    }

    /// Roles allowed to approve purchase requests and delete inventory
    pub fn is_admin(&self) -> bool {
        matches!(self, UserRole::Admin)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "Admin",
            UserRole::Storekeeper => "Storekeeper",
            UserRole::Technician => "Technician",
            UserRole::Viewer => "Viewer",
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Admin" => Ok(UserRole::Admin),
            "Storekeeper" => Ok(UserRole::Storekeeper),
            "Technician" => Ok(UserRole::Technician),
            "Viewer" => Ok(UserRole::Viewer),
            other => Err(format!("Unknown role: {}", other)),
        }
    }
}

/// A single receipt line submitted against a purchase order or an order
/// schedule
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptRequest {
    pub inventory_id: Uuid,
    pub qty_received: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_cost: Option<Decimal>,
}
