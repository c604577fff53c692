//! Core domain types
//!
//! Validated newtypes shared by the registry, discovery and proxy layers.

mod address;
mod duration;

use thiserror::Error;

pub use address::{DEFAULT_NODE_PORT, NodeAddress};
pub use duration::duration_serde;

/// Validation errors for domain types
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ValidationError {
    #[error("node address cannot be empty or whitespace")]
    EmptyNodeAddress,

    #[error("invalid node address: {0:?}")]
    InvalidNodeAddress(String),
}
