//! Round-robin node selection
//!
//! The cursor itself holds no lock. It is always advanced while the registry
//! mutex is held, so the length read, the modulo and the increment happen as
//! one step relative to any concurrent replacement of the node set.

use tracing::debug;

use crate::types::NodeAddress;

/// Monotonic selection counter for round-robin scheduling
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RoundRobinCursor {
    /// Total selections made over the process lifetime
    position: u64,
}

impl RoundRobinCursor {
    /// Create a cursor at position zero
    #[must_use]
    pub const fn new() -> Self {
        Self { position: 0 }
    }

    /// Number of selections made so far
    #[must_use]
    #[inline]
    pub const fn position(&self) -> u64 {
        self.position
    }

    /// Index the next selection would use for a set of `len` nodes
    #[must_use]
    #[inline]
    const fn peek(&self, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        Some((self.position % len as u64) as usize)
    }

    /// Select the next node and advance the cursor
    ///
    /// Returns `None` without advancing when `nodes` is empty.
    pub fn select<'a>(&mut self, nodes: &'a [NodeAddress]) -> Option<&'a NodeAddress> {
        let index = self.peek(nodes.len())?;
        self.position = self.position.wrapping_add(1);

        let node = &nodes[index];
        debug!("Round-robin selected node {} at index {}", node, index);

        Some(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nodes(names: &[&str]) -> Vec<NodeAddress> {
        names
            .iter()
            .map(|n| NodeAddress::new((*n).to_string()).unwrap())
            .collect()
    }

    #[test]
    fn test_round_robin_empty() {
        let mut cursor = RoundRobinCursor::new();
        assert!(cursor.select(&[]).is_none());
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn test_round_robin_single_node() {
        let mut cursor = RoundRobinCursor::new();
        let set = nodes(&["a:1"]);

        for _ in 0..3 {
            assert_eq!(cursor.select(&set).unwrap().as_str(), "a:1");
        }
        assert_eq!(cursor.position(), 3);
    }

    #[test]
    fn test_round_robin_rotation() {
        let mut cursor = RoundRobinCursor::new();
        let set = nodes(&["a:1", "b:1", "c:1"]);

        let picks: Vec<_> = (0..6)
            .map(|_| cursor.select(&set).unwrap().as_str().to_string())
            .collect();

        assert_eq!(picks, ["a:1", "b:1", "c:1", "a:1", "b:1", "c:1"]);
    }

    #[test]
    fn test_round_robin_wraps_counter() {
        let mut cursor = RoundRobinCursor { position: u64::MAX };
        let set = nodes(&["a:1", "b:1"]);

        // u64::MAX is odd, so index 1
        assert_eq!(cursor.select(&set).unwrap().as_str(), "b:1");
        assert_eq!(cursor.position(), 0);
        assert_eq!(cursor.select(&set).unwrap().as_str(), "a:1");
    }

    #[test]
    fn test_peek_does_not_advance() {
        let cursor = RoundRobinCursor { position: 7 };
        assert_eq!(cursor.peek(3), Some(1));
        assert_eq!(cursor.peek(0), None);
        assert_eq!(cursor.position(), 7);
    }
}
