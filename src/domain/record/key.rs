//! Lookup key value object

use std::fmt;

use crate::domain::DomainError;

/// Identifier of a single record.
///
/// The same value is used as the cache key, the document id and the document
/// partition key. A `LookupKey` is never empty, so holding one means the
/// request already passed input validation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LookupKey(String);

impl LookupKey {
    /// Validates and wraps a raw key
    pub fn new(raw: impl Into<String>) -> Result<Self, DomainError> {
        let raw = raw.into();

        if raw.is_empty() {
            return Err(DomainError::validation("Lookup key must not be empty"));
        }

        Ok(Self(raw))
    }

    /// Parses an optional query value, rejecting absent and empty keys
    pub fn parse(raw: Option<&str>) -> Result<Self, DomainError> {
        match raw {
            Some(value) => Self::new(value),
            None => Err(DomainError::validation("Lookup key is missing")),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl AsRef<str> for LookupKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LookupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
