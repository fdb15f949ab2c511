//! Domain services and their cached wrappers.

pub mod cached;
pub mod error;
pub mod memory;
pub mod policies;
pub mod scenario;
pub mod services;
