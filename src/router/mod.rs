//! Node registry and round-robin scheduling
//!
//! This module owns the balancer's only shared mutable state: the list of
//! known backend nodes and the selection cursor.
//!
//! # Overview
//!
//! `NodeRegistry` keeps `(nodes, cursor)` behind a single mutex. Discovery
//! replaces the whole node list; the proxy and discovery both pick nodes with
//! [`NodeRegistry::choose_node`]. Because the length read, modulo and
//! increment all happen under that one lock, a concurrent replacement can
//! never make a selection index past the end of the list it was computed for.
//!
//! # Usage
//!
//! ```
//! use roach_balancer::router::NodeRegistry;
//! use roach_balancer::types::NodeAddress;
//!
//! let nodes = vec![
//!     NodeAddress::new("a:26257".to_string()).unwrap(),
//!     NodeAddress::new("b:26257".to_string()).unwrap(),
//! ];
//! let registry = NodeRegistry::new(nodes).unwrap();
//!
//! assert_eq!(registry.choose_node().unwrap().as_str(), "a:26257");
//! assert_eq!(registry.choose_node().unwrap().as_str(), "b:26257");
//!
//! // Empty replacements never wipe the routing table
//! assert!(!registry.replace(Vec::new()));
//! assert_eq!(registry.count(), 2);
//! ```

mod round_robin;

pub use round_robin::RoundRobinCursor;

use std::sync::{Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tracing::debug;

use crate::types::NodeAddress;

/// Errors from constructing a registry
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum RegistryError {
    #[error("at least one bootstrap node is required")]
    EmptyBootstrap,
}

/// Node set and cursor, always read and written together
#[derive(Debug)]
struct RegistryState {
    nodes: Vec<NodeAddress>,
    cursor: RoundRobinCursor,
}

/// Concurrency-safe holder of the current backend node list
///
/// # Thread Safety
///
/// All operations take the same mutex. Critical sections are a clone, an
/// assignment or an index computation, so writers are never held up for
/// longer than a snapshot copy.
#[derive(Debug)]
pub struct NodeRegistry {
    state: Mutex<RegistryState>,
}

impl NodeRegistry {
    /// Create a registry from the bootstrap node list
    ///
    /// # Errors
    /// Returns [`RegistryError::EmptyBootstrap`] if `bootstrap` is empty.
    pub fn new(bootstrap: Vec<NodeAddress>) -> Result<Self, RegistryError> {
        if bootstrap.is_empty() {
            return Err(RegistryError::EmptyBootstrap);
        }

        Ok(Self {
            state: Mutex::new(RegistryState {
                nodes: bootstrap,
                cursor: RoundRobinCursor::new(),
            }),
        })
    }

    // A panic while holding the lock cannot leave the state half-written,
    // since every mutation is a single assignment or increment.
    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copy of the current node list, in stored order
    #[must_use]
    pub fn snapshot(&self) -> Vec<NodeAddress> {
        self.lock().nodes.clone()
    }

    /// Replace the node list if `nodes` is non-empty
    ///
    /// An empty list is a no-op so that total discovery failure keeps the
    /// last known good routing table. Returns whether the list was swapped.
    pub fn replace(&self, nodes: Vec<NodeAddress>) -> bool {
        if nodes.is_empty() {
            return false;
        }

        let mut state = self.lock();
        debug!(
            "Replacing node list ({} -> {} nodes)",
            state.nodes.len(),
            nodes.len()
        );
        state.nodes = nodes;
        true
    }

    /// Number of nodes the next selection will choose from
    #[must_use]
    pub fn count(&self) -> usize {
        self.lock().nodes.len()
    }

    /// Pick the next node in round-robin order
    ///
    /// Returns `None` only if the node list is empty, which construction and
    /// [`replace`](Self::replace) together rule out.
    #[must_use]
    pub fn choose_node(&self) -> Option<NodeAddress> {
        let mut state = self.lock();
        let RegistryState { nodes, cursor } = &mut *state;
        cursor.select(nodes).cloned()
    }

    /// Total number of selections made so far
    #[must_use]
    pub fn selections(&self) -> u64 {
        self.lock().cursor.position()
    }
}

#[cfg(test)]
mod tests;
