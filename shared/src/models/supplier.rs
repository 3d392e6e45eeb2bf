//! Supplier directory models

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// A parts supplier
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Supplier {
    pub id: Uuid,
    pub name: String,
    #[validate(email)]
    pub email: String,
    pub phone: String,
    pub address: String,
    pub remark: String,
    pub active: bool,
}

/// Field-level patch for bulk supplier updates
///
/// Only fields present in the patch overwrite the stored value; absent
/// fields are never nulled or defaulted.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplierPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub remark: Option<String>,
    pub active: Option<bool>,
}

impl SupplierPatch {
    /// Apply the enabled fields onto an existing record
    pub fn apply_to(&self, supplier: &mut Supplier) {
        if let Some(name) = &self.name {
            supplier.name = name.clone();
        }
        if let Some(email) = &self.email {
            supplier.email = email.clone();
        }
        if let Some(phone) = &self.phone {
            supplier.phone = phone.clone();
        }
        if let Some(address) = &self.address {
            supplier.address = address.clone();
        }
        if let Some(remark) = &self.remark {
            supplier.remark = remark.clone();
        }
        if let Some(active) = self.active {
            supplier.active = active;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.phone.is_none()
            && self.address.is_none()
            && self.remark.is_none()
            && self.active.is_none()
    }
}
