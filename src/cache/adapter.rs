//! Cache-aware wrapper around a domain service.
//!
//! `CachedService<S>` exposes the same method surface as `S`; the per-service
//! trait impls live next to the service traits in `crate::application`.
//! The wrapper never touches the backend directly: reads go through
//! [`CacheCoordinator::read_through`] and writes through
//! [`CacheCoordinator::write_through`].

use std::sync::Arc;

use super::coordinator::CacheCoordinator;

pub struct CachedService<S> {
    inner: S,
    coordinator: Arc<CacheCoordinator>,
}

impl<S> CachedService<S> {
    pub fn new(inner: S, coordinator: Arc<CacheCoordinator>) -> Self {
        Self { inner, coordinator }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn coordinator(&self) -> &CacheCoordinator {
        &self.coordinator
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: Clone> Clone for CachedService<S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            coordinator: self.coordinator.clone(),
        }
    }
}
