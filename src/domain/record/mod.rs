//! Record domain - lookup keys, records and lookup outcomes

mod key;
mod outcome;

pub use key::LookupKey;
pub use outcome::{LookupOutcome, RecordOrigin};

/// A stored document. Its shape is owned by the document store.
pub type Record = serde_json::Value;
