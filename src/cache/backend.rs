//! Cache backend contract.
//!
//! The backend is a shared key/value store with per-key TTL and string sets.
//! Every single operation is atomic on its own key or set; nothing stronger is
//! assumed by the coordinator.

use std::collections::HashSet;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("cache backend unavailable: {0}")]
    Unavailable(String),
    #[error("cache backend `{op}` timed out after {after:?}")]
    Timeout { op: &'static str, after: Duration },
}

impl BackendError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }
}

#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Fetch a live value. Expired entries read as absent.
    async fn get(&self, key: &str) -> Result<Option<Bytes>, BackendError>;

    async fn set(&self, key: &str, value: Bytes, ttl: Duration) -> Result<(), BackendError>;

    /// Remove a value. Removing an absent key succeeds.
    async fn delete(&self, key: &str) -> Result<(), BackendError>;

    async fn add_to_set(&self, set_key: &str, member: &str) -> Result<(), BackendError>;

    async fn members_of(&self, set_key: &str) -> Result<HashSet<String>, BackendError>;

    /// Remove a whole set. Removing an absent set succeeds.
    async fn delete_key(&self, set_key: &str) -> Result<(), BackendError>;
}

/// Bound a backend call so a degraded cache tier cannot stall the caller.
pub(crate) async fn with_timeout<T, F>(
    after: Duration,
    op: &'static str,
    call: F,
) -> Result<T, BackendError>
where
    F: Future<Output = Result<T, BackendError>>,
{
    match tokio::time::timeout(after, call).await {
        Ok(result) => result,
        Err(_) => Err(BackendError::Timeout { op, after }),
    }
}
