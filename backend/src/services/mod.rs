//! Business logic services for the Spare Parts Management Platform

pub mod auth;
pub mod dashboard;
pub mod inventory;
pub mod ledger;
pub mod purchasing;
pub mod schedule;
pub mod supplier;

pub use auth::AuthService;
pub use dashboard::DashboardService;
pub use inventory::InventoryService;
pub use ledger::LedgerService;
pub use purchasing::PurchasingService;
pub use schedule::ScheduleService;
pub use supplier::SupplierService;
