//! Shared domain types and rules for the Spare Parts Management Platform
//!
//! This crate contains the inventory, stock-ledger, purchasing and
//! order-schedule domain logic shared between the backend and the WASM
//! bindings. Everything in here is pure: no I/O, no clock, no database.

pub mod error;
pub mod models;
pub mod types;
pub mod validation;

pub use error::*;
pub use models::*;
pub use types::*;
pub use validation::*;
