//! Per-request lookup results

use bytes::Bytes;
use serde::Serialize;

/// Where a found record was served from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordOrigin {
    Cache,
    Store,
}

impl RecordOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cache => "cache",
            Self::Store => "store",
        }
    }
}

/// Final classification of a single lookup.
///
/// `payload` holds the serialized record exactly as it was cached or as it
/// will be cached, so cache and store hits produce identical bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome {
    Found { payload: Bytes, origin: RecordOrigin },
    NotFound,
    InvalidInput,
    UnsupportedOperation,
    /// Only produced when store faults are reported separately from misses
    StoreUnavailable,
    SystemError,
}

impl LookupOutcome {
    pub fn found(payload: impl Into<Bytes>, origin: RecordOrigin) -> Self {
        Self::Found {
            payload: payload.into(),
            origin,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found { .. })
    }

    pub fn origin(&self) -> Option<RecordOrigin> {
        match self {
            Self::Found { origin, .. } => Some(*origin),
            _ => None,
        }
    }

    /// HTTP status code the outcome maps to
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Found { .. } => 200,
            Self::InvalidInput => 400,
            Self::NotFound => 404,
            Self::UnsupportedOperation => 405,
            Self::SystemError => 500,
            Self::StoreUnavailable => 503,
        }
    }

    /// Caller-facing message for non-found outcomes
    pub fn message(&self) -> &'static str {
        match self {
            Self::Found { .. } => "Record found",
            Self::NotFound => "Record not found",
            Self::InvalidInput => "Invalid input",
            Self::UnsupportedOperation => "Method not supported",
            Self::StoreUnavailable => "Store unavailable",
            Self::SystemError => "System error",
        }
    }

    /// Low-cardinality label used in logs and metrics
    pub fn label(&self) -> &'static str {
        match self {
            Self::Found { .. } => "found",
            Self::NotFound => "not_found",
            Self::InvalidInput => "invalid_input",
            Self::UnsupportedOperation => "unsupported_operation",
            Self::StoreUnavailable => "store_unavailable",
            Self::SystemError => "system_error",
        }
    }
}
