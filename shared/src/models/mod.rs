//! Domain models for the Spare Parts Management Platform

mod inventory;
mod purchasing;
mod schedule;
mod supplier;
mod transaction;

pub use inventory::*;
pub use purchasing::*;
pub use schedule::*;
pub use supplier::*;
pub use transaction::*;
