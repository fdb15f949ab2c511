//! Runtime bootstrap: telemetry and wiring of the cache stack.

pub mod error;
pub mod telemetry;
pub mod wiring;
