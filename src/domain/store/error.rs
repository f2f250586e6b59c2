use std::time::Duration;

use thiserror::Error;

/// Failure of a point read against the document store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Record '{key}' not found")]
    NotFound { key: String },

    #[error("Store unavailable: {message}")]
    Unavailable { message: String },
}

impl StoreError {
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    pub fn timeout(after: Duration) -> Self {
        Self::unavailable(format!("read timed out after {:?}", after))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Short label for metrics
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::Unavailable { .. } => "unavailable",
        }
    }
}
