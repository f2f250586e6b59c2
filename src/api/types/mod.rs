//! HTTP response types

pub mod message;

pub use message::MessageResponse;
