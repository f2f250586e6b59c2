//! Message-only response bodies

use serde::{Deserialize, Serialize};

/// Body of every non-record response: `{"message": "..."}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Liveness reply for the heartbeat query parameter
    pub fn alive(service_name: &str) -> Self {
        Self::new(format!("{} is alive!", service_name))
    }
}
