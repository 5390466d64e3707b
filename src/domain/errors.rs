use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        DomainError::InvalidInput(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        DomainError::NotFound(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        DomainError::Forbidden(msg.into())
    }

    /// Machine-checkable kind, stable across messages.
    pub fn kind(&self) -> &'static str {
        match self {
            DomainError::Unauthorized => "Unauthorized",
            DomainError::Forbidden(_) => "Forbidden",
            DomainError::InvalidInput(_) => "InvalidInput",
            DomainError::NotFound(_) => "NotFound",
            DomainError::Internal(_) => "Internal",
        }
    }
}
