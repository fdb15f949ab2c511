use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("{entity} `{id}` not found")]
    NotFound { entity: &'static str, id: String },
    #[error("invalid {field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },
    #[error("{entity} cannot move from `{from}` to `{to}`")]
    InvalidTransition {
        entity: &'static str,
        from: &'static str,
        to: &'static str,
    },
}

impl DomainError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    pub fn invalid_transition(entity: &'static str, from: &'static str, to: &'static str) -> Self {
        Self::InvalidTransition { entity, from, to }
    }
}
