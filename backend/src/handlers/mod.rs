//! HTTP handlers for the Spare Parts Management Platform

pub mod auth;
pub mod dashboard;
pub mod health;
pub mod inventory;
pub mod ledger;
pub mod purchasing;
pub mod schedule;
pub mod supplier;

pub use auth::*;
pub use dashboard::*;
pub use health::*;
pub use inventory::*;
pub use ledger::*;
pub use purchasing::*;
pub use schedule::*;
pub use supplier::*;
