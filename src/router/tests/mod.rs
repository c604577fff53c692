//! Tests for the router module

use super::*;

mod concurrency;
mod registry;

/// Build a node list from literal addresses
pub(crate) fn nodes(addresses: &[&str]) -> Vec<NodeAddress> {
    addresses
        .iter()
        .map(|a| NodeAddress::new((*a).to_string()).unwrap())
        .collect()
}

/// Build a registry from literal addresses
pub(crate) fn registry(addresses: &[&str]) -> NodeRegistry {
    NodeRegistry::new(nodes(addresses)).unwrap()
}
