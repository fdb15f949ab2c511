use thiserror::Error;

use crate::{cache::KeyError, domain::error::DomainError, infra::error::InfraError};

/// Errors returned by the domain services and, unchanged, by their cached
/// wrappers.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: &'static str },
    #[error("persistence error: {0}")]
    Persistence(String),
    /// Cache key derivation failed; the call site passes arguments the key
    /// builder cannot represent.
    #[error("cache key error: {0}")]
    CacheKey(#[from] KeyError),
}

impl ServiceError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::Domain(DomainError::not_found(entity, id))
    }

    pub fn persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Domain(DomainError::NotFound { .. }))
    }
}

/// Top-level error of the `aerocache` binary.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error(transparent)]
    Service(#[from] ServiceError),
    #[error(transparent)]
    CacheKey(#[from] KeyError),
    #[error("scenario check failed: {0}")]
    Scenario(String),
}

impl AppError {
    pub fn scenario(message: impl Into<String>) -> Self {
        Self::Scenario(message.into())
    }
}
