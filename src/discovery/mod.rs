//! Periodic discovery of live cluster nodes
//!
//! Every cycle asks one already-known node for the cluster's own view of which
//! members are live, and replaces the registry's node list with the answer.
//! Trials fall through to the next known node on any failure, so one dead
//! node never blocks a refresh while some other known node is reachable.

mod cockroach;
mod descriptor;

pub use cockroach::{CockroachLivenessSource, LIVENESS_QUERY};
pub use descriptor::ConnectionDescriptor;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::config::DiscoveryConfig;
use crate::router::NodeRegistry;
use crate::types::{NodeAddress, ValidationError};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors from one discovery trial
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DiscoveryError {
    #[error("failed to connect to {node}: {source}")]
    Connect {
        node: NodeAddress,
        #[source]
        source: BoxError,
    },

    #[error("liveness query via {node} failed: {source}")]
    Query {
        node: NodeAddress,
        #[source]
        source: BoxError,
    },

    #[error("liveness query via {node} timed out after {timeout:?}")]
    Timeout { node: NodeAddress, timeout: Duration },

    #[error("node {node} reported an unusable address: {source}")]
    InvalidAddress {
        node: NodeAddress,
        #[source]
        source: ValidationError,
    },
}

impl DiscoveryError {
    /// The trial node this error came from
    #[must_use]
    pub fn node(&self) -> &NodeAddress {
        match self {
            Self::Connect { node, .. }
            | Self::Query { node, .. }
            | Self::Timeout { node, .. }
            | Self::InvalidAddress { node, .. } => node,
        }
    }
}

/// Source of the cluster's live membership, queried through one known node
///
/// Implementations carry their own credentials. The registry, scheduler and
/// proxy never depend on a concrete database driver, which lets tests script
/// the answers.
#[async_trait]
pub trait HealthQuerySource: Send + Sync {
    /// Ask `node` for the addresses of every live, unexpired cluster member
    async fn live_nodes(&self, node: &NodeAddress) -> Result<Vec<NodeAddress>, DiscoveryError>;
}

/// Result of one discovery cycle
#[derive(Debug)]
#[non_exhaustive]
pub enum RefreshOutcome {
    /// The registry now holds `nodes`, as reported by `queried`
    Replaced {
        queried: NodeAddress,
        nodes: Vec<NodeAddress>,
    },
    /// `queried` answered with no live nodes; the registry was left as is
    Unchanged { queried: NodeAddress },
    /// Every trial failed; the registry was left as is
    Failed { errors: Vec<DiscoveryError> },
}

/// Refreshes a [`NodeRegistry`] from a [`HealthQuerySource`]
pub struct Discovery {
    registry: Arc<NodeRegistry>,
    source: Arc<dyn HealthQuerySource>,
    config: DiscoveryConfig,
}

impl std::fmt::Debug for Discovery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Discovery")
            .field("registry", &self.registry)
            .field("source", &"<HealthQuerySource>")
            .field("config", &self.config)
            .finish()
    }
}

impl Discovery {
    /// Create a discovery driver for `registry`
    pub fn new(
        registry: Arc<NodeRegistry>,
        source: Arc<dyn HealthQuerySource>,
        config: DiscoveryConfig,
    ) -> Self {
        Self {
            registry,
            source,
            config,
        }
    }

    /// Nodes to try this cycle, in order
    ///
    /// The first trial comes from the round-robin scheduler so refresh load
    /// rotates through the cluster. The rest walk the current list from there,
    /// giving up to `count()` distinct nodes.
    #[must_use]
    pub fn trial_nodes(&self) -> Vec<NodeAddress> {
        let snapshot = self.registry.snapshot();
        let Some(first) = self.registry.choose_node() else {
            return Vec::new();
        };

        // The list may have been replaced between the two calls
        let start = snapshot.iter().position(|n| *n == first).unwrap_or(0);

        snapshot
            .iter()
            .cycle()
            .skip(start)
            .take(snapshot.len())
            .cloned()
            .collect()
    }

    /// Run one discovery cycle
    ///
    /// Never fails: errors are logged and reported in the outcome, and the
    /// registry is only touched by a successful non-empty answer.
    pub async fn refresh(&self) -> RefreshOutcome {
        let trials = self.trial_nodes();
        let mut errors = Vec::with_capacity(trials.len());

        for node in trials {
            debug!("Refreshing live node list via {}", node);

            let result = time::timeout(self.config.query_timeout, self.source.live_nodes(&node))
                .await
                .unwrap_or_else(|_| {
                    Err(DiscoveryError::Timeout {
                        node: node.clone(),
                        timeout: self.config.query_timeout,
                    })
                });

            match result {
                Ok(nodes) if nodes.is_empty() => {
                    warn!(
                        "Node {} reported no live nodes, keeping current list of {}",
                        node,
                        self.registry.count()
                    );
                    return RefreshOutcome::Unchanged { queried: node };
                }
                Ok(nodes) => {
                    self.registry.replace(nodes.clone());
                    info!("Refreshed active node list via {}: {:?}", node, nodes);
                    return RefreshOutcome::Replaced {
                        queried: node,
                        nodes,
                    };
                }
                Err(e) => {
                    warn!("Discovery trial failed: {}", e);
                    errors.push(e);
                }
            }
        }

        warn!(
            "All {} discovery trials failed, keeping current node list",
            errors.len()
        );
        RefreshOutcome::Failed { errors }
    }

    /// Spawn the refresh loop
    ///
    /// The first cycle runs immediately, then once per `interval`. The loop
    /// exits when `shutdown` turns true or its sender is dropped, abandoning
    /// any query in flight.
    pub fn spawn(self, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = time::interval(self.config.interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            info!(
                "Node discovery started (every {:?}, {} bootstrap nodes)",
                self.config.interval,
                self.registry.count()
            );

            loop {
                tokio::select! {
                    biased;
                    _ = crate::runtime::wait_for_shutdown(&mut shutdown) => break,
                    _ = interval.tick() => {
                        tokio::select! {
                            biased;
                            _ = crate::runtime::wait_for_shutdown(&mut shutdown) => break,
                            _ = self.refresh() => {}
                        }
                    }
                }
            }

            info!("Node discovery stopped");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    fn addr(s: &str) -> NodeAddress {
        NodeAddress::new(s.to_string()).unwrap()
    }

    fn addrs(list: &[&str]) -> Vec<NodeAddress> {
        list.iter().map(|s| addr(s)).collect()
    }

    /// Answers per node; unknown nodes fail to connect
    #[derive(Default)]
    struct ScriptedSource {
        answers: HashMap<NodeAddress, Vec<NodeAddress>>,
        calls: Mutex<Vec<NodeAddress>>,
    }

    impl ScriptedSource {
        fn answer(mut self, node: &str, live: &[&str]) -> Self {
            self.answers.insert(addr(node), addrs(live));
            self
        }

        fn calls(&self) -> Vec<NodeAddress> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl HealthQuerySource for ScriptedSource {
        async fn live_nodes(
            &self,
            node: &NodeAddress,
        ) -> Result<Vec<NodeAddress>, DiscoveryError> {
            self.calls.lock().unwrap().push(node.clone());
            self.answers
                .get(node)
                .cloned()
                .ok_or_else(|| DiscoveryError::Connect {
                    node: node.clone(),
                    source: "connection refused".into(),
                })
        }
    }

    fn discovery(
        bootstrap: &[&str],
        source: ScriptedSource,
    ) -> (Discovery, Arc<NodeRegistry>, Arc<ScriptedSource>) {
        let registry = Arc::new(NodeRegistry::new(addrs(bootstrap)).unwrap());
        let source = Arc::new(source);
        let discovery = Discovery::new(
            Arc::clone(&registry),
            Arc::clone(&source) as Arc<dyn HealthQuerySource>,
            DiscoveryConfig::default(),
        );
        (discovery, registry, source)
    }

    #[test]
    fn test_trial_nodes_are_distinct_rotation() {
        let (discovery, registry, _) = discovery(&["a:1", "b:1", "c:1"], ScriptedSource::default());
        let _ = registry.choose_node();

        // Cursor at 1, so trials start at b
        assert_eq!(discovery.trial_nodes(), addrs(&["b:1", "c:1", "a:1"]));
        // And the next cycle starts at c
        assert_eq!(discovery.trial_nodes(), addrs(&["c:1", "a:1", "b:1"]));
    }

    #[tokio::test]
    async fn test_refresh_replaces_on_first_success() {
        let source = ScriptedSource::default().answer("a:1", &["x:1", "y:1"]);
        let (discovery, registry, source) = discovery(&["a:1", "b:1"], source);

        let outcome = discovery.refresh().await;

        assert!(matches!(outcome, RefreshOutcome::Replaced { .. }));
        assert_eq!(registry.snapshot(), addrs(&["x:1", "y:1"]));
        assert_eq!(source.calls(), addrs(&["a:1"]));
    }

    #[tokio::test]
    async fn test_refresh_falls_through_failed_trial() {
        let source = ScriptedSource::default().answer("b:1", &["a2:1", "b2:1"]);
        let (discovery, registry, source) = discovery(&["a:1", "b:1"], source);

        let outcome = discovery.refresh().await;

        match outcome {
            RefreshOutcome::Replaced { queried, nodes } => {
                assert_eq!(queried, addr("b:1"));
                assert_eq!(nodes, addrs(&["a2:1", "b2:1"]));
            }
            other => panic!("expected replacement, got {other:?}"),
        }
        assert_eq!(registry.snapshot(), addrs(&["a2:1", "b2:1"]));
        assert_eq!(source.calls(), addrs(&["a:1", "b:1"]));
    }

    #[tokio::test]
    async fn test_refresh_empty_answer_keeps_registry() {
        let source = ScriptedSource::default().answer("A:1", &[]);
        let (discovery, registry, _) = discovery(&["A:1"], source);

        let outcome = discovery.refresh().await;

        assert!(matches!(outcome, RefreshOutcome::Unchanged { .. }));
        assert_eq!(registry.snapshot(), addrs(&["A:1"]));
        assert_eq!(registry.choose_node(), Some(addr("A:1")));
    }

    #[tokio::test]
    async fn test_refresh_all_trials_fail() {
        let (discovery, registry, source) =
            discovery(&["a:1", "b:1", "c:1"], ScriptedSource::default());

        let outcome = discovery.refresh().await;

        match outcome {
            RefreshOutcome::Failed { errors } => {
                assert_eq!(errors.len(), 3);
                assert_eq!(errors[0].node(), &addr("a:1"));
            }
            other => panic!("expected failure, got {other:?}"),
        }
        assert_eq!(registry.snapshot(), addrs(&["a:1", "b:1", "c:1"]));
        // Each known node tried exactly once
        assert_eq!(source.calls(), addrs(&["a:1", "b:1", "c:1"]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_times_out_slow_trial() {
        struct Stalled;

        #[async_trait]
        impl HealthQuerySource for Stalled {
            async fn live_nodes(
                &self,
                _node: &NodeAddress,
            ) -> Result<Vec<NodeAddress>, DiscoveryError> {
                std::future::pending().await
            }
        }

        let registry = Arc::new(NodeRegistry::new(addrs(&["a:1"])).unwrap());
        let discovery = Discovery::new(
            Arc::clone(&registry),
            Arc::new(Stalled),
            DiscoveryConfig::default(),
        );

        let outcome = discovery.refresh().await;

        match outcome {
            RefreshOutcome::Failed { errors } => {
                assert!(matches!(errors[0], DiscoveryError::Timeout { .. }));
            }
            other => panic!("expected timeout failure, got {other:?}"),
        }
    }

    #[test]
    fn test_discovery_error_messages() {
        let err = DiscoveryError::Timeout {
            node: addr("a:1"),
            timeout: Duration::from_secs(5),
        };
        assert!(err.to_string().contains("a:1"));
        assert!(err.to_string().contains("5s"));

        let err = DiscoveryError::InvalidAddress {
            node: addr("a:1"),
            source: ValidationError::EmptyNodeAddress,
        };
        assert!(err.to_string().contains("unusable address"));
    }
}
