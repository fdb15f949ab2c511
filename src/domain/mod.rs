//! Domain layer types and invariants.

pub mod customers;
pub mod entities;
pub mod error;
pub mod inspections;
pub mod suppliers;
pub mod types;
