//! The balancer: listener, accept loop and session dispatch
//!
//! ## Module structure
//!
//! - [`forwarding`]: two-way byte relay for one session
//! - `lifecycle`: accept loop, dialing, shutdown and drain

pub mod forwarding;
mod lifecycle;

pub use forwarding::{Direction, PipeOutcome, SessionSummary, pipe, run_session};

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::Result;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{Level, debug, error, info, warn};

use crate::config::{BalancerConfig, Config};
use crate::connection_error::ConnectionError;
use crate::discovery::{Discovery, HealthQuerySource};
use crate::router::NodeRegistry;
use crate::types::NodeAddress;

/// Log a per-client failure at the level the error calls for
fn log_connection_error(client: SocketAddr, err: &ConnectionError) {
    let level = err.log_level();
    if level == Level::ERROR {
        error!("Client {}: {}", client, err);
    } else if level == Level::WARN {
        warn!("Client {}: {}", client, err);
    } else {
        debug!("Client {}: {}", client, err);
    }
}

/// Transparent TCP load balancer in front of a CockroachDB cluster
///
/// Owns the node registry, the discovery task and the shutdown signal.
/// Discovery starts as soon as the balancer is created; the accept loop runs
/// in [`serve`](Self::serve).
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use roach_balancer::{Balancer, CockroachLivenessSource, create_default_config};
///
/// # async fn run() -> anyhow::Result<()> {
/// let config = create_default_config();
/// let source = Arc::new(CockroachLivenessSource::new(config.cluster.clone()));
/// let balancer = Balancer::start(&config, source)?;
///
/// let listener = balancer.listen("127.0.0.1:0").await?;
/// println!("listening on {}", listener.local_addr()?);
/// balancer.serve(listener).await;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Balancer {
    registry: Arc<NodeRegistry>,
    config: BalancerConfig,
    shutdown_tx: watch::Sender<bool>,
    discovery: Mutex<Option<JoinHandle<()>>>,
    active_sessions: AtomicUsize,
}

impl Balancer {
    /// Build the registry from the bootstrap nodes and start discovery
    ///
    /// Must be called inside a Tokio runtime. The first discovery cycle runs
    /// immediately.
    ///
    /// # Errors
    /// Returns error if `config` lists no bootstrap nodes
    pub fn start(config: &Config, source: Arc<dyn HealthQuerySource>) -> Result<Arc<Self>> {
        let registry = Arc::new(NodeRegistry::new(config.cluster.nodes.clone())?);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let discovery = Discovery::new(Arc::clone(&registry), source, config.discovery.clone())
            .spawn(shutdown_rx);

        info!(
            "Balancer started with {} bootstrap node(s): {:?}",
            registry.count(),
            config.cluster.nodes
        );

        Ok(Arc::new(Self {
            registry,
            config: config.balancer.clone(),
            shutdown_tx,
            discovery: Mutex::new(Some(discovery)),
            active_sessions: AtomicUsize::new(0),
        }))
    }

    /// Bind the client-facing listener
    ///
    /// Use `local_addr()` on the result to learn the port when binding port 0.
    ///
    /// # Errors
    /// Returns [`ConnectionError::Bind`], which callers should treat as fatal
    pub async fn listen(&self, address: &str) -> Result<TcpListener, ConnectionError> {
        let listener = TcpListener::bind(address)
            .await
            .map_err(|source| ConnectionError::Bind {
                address: address.to_string(),
                source,
            })?;

        match listener.local_addr() {
            Ok(local) => info!("Balancer listening on {}", local),
            Err(_) => info!("Balancer listening on {}", address),
        }

        Ok(listener)
    }

    /// The shared node registry
    #[must_use]
    pub fn registry(&self) -> &Arc<NodeRegistry> {
        &self.registry
    }

    /// Pick the next backend in round-robin order
    #[must_use]
    pub fn choose_node(&self) -> Option<NodeAddress> {
        self.registry.choose_node()
    }

    /// Number of sessions currently being proxied
    #[must_use]
    pub fn active_sessions(&self) -> usize {
        self.active_sessions.load(Ordering::Relaxed)
    }

    /// Request shutdown
    ///
    /// Stops the accept loop and the discovery task. In-flight sessions are
    /// left to finish on their own, up to the drain timeout. Idempotent.
    pub fn shutdown(&self) {
        if !self.shutdown_tx.send_replace(true) {
            info!("Shutdown requested");
        }
    }

    /// Check if shutdown has been requested
    #[must_use]
    pub fn is_shutting_down(&self) -> bool {
        *self.shutdown_tx.borrow()
    }

    fn take_discovery(&self) -> Option<JoinHandle<()>> {
        self.discovery
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}
