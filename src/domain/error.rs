use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("domain validation failed: {message}")]
    Validation { message: String },
    #[error("unsupported {field} `{value}`")]
    Unsupported { field: &'static str, value: String },
}

impl DomainError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn unsupported(field: &'static str, value: impl Into<String>) -> Self {
        Self::Unsupported {
            field,
            value: value.into(),
        }
    }
}
