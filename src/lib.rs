//! Tag-indexed read-through caching for supply-chain inspection services.
//!
//! Domain services are wrapped in [`cache::CachedService`], which serves
//! reads through a shared [`cache::CacheCoordinator`] and turns every write
//! into an invalidation sweep over the tags the change can make stale.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
