use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("`{field}` is invalid: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },
    #[error("module `{module}` does not hold content entries")]
    NotEntryBacked { module: String },
}

impl DomainError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    /// Field name for validation errors, used as the API hint.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::Validation { field, .. } => Some(field),
            Self::NotEntryBacked { .. } => None,
        }
    }
}
