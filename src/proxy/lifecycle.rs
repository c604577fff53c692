//! Accept loop, session dispatch, and shutdown drain
//!
//! Private methods on `Balancer` that move a connection from `accept()` to a
//! finished session, plus the drain that runs once shutdown is requested.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::connection_error::ConnectionError;
use crate::constants::accept;
use crate::network::try_tune_stream;
use crate::runtime::wait_for_shutdown;
use crate::types::NodeAddress;

use super::{Balancer, log_connection_error};
use super::forwarding::run_session;

/// Decrements the active session count when a session task ends, however it ends
struct SessionGuard<'a>(&'a Balancer);

impl<'a> SessionGuard<'a> {
    fn enter(balancer: &'a Balancer) -> Self {
        balancer.active_sessions.fetch_add(1, Ordering::Relaxed);
        Self(balancer)
    }
}

impl Drop for SessionGuard<'_> {
    fn drop(&mut self) {
        self.0.active_sessions.fetch_sub(1, Ordering::Relaxed);
    }
}

impl Balancer {
    /// Accept clients on `listener` until shutdown, then drain
    ///
    /// Every accepted client gets the next node in round-robin order and its
    /// own session task. Accept errors are logged and the loop continues after
    /// a short pause. Returns once the listener is closed, sessions are drained
    /// (or aborted after the drain timeout) and discovery has stopped.
    pub async fn serve(self: Arc<Self>, listener: TcpListener) {
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let mut sessions = JoinSet::new();

        loop {
            tokio::select! {
                biased;

                _ = wait_for_shutdown(&mut shutdown_rx) => break,

                Some(finished) = sessions.join_next(), if !sessions.is_empty() => {
                    if let Err(e) = finished {
                        warn!("Session task failed: {}", e);
                    }
                }

                accepted = listener.accept() => match accepted {
                    Ok((client, client_addr)) => {
                        let Some(node) = self.choose_node() else {
                            log_connection_error(client_addr, &ConnectionError::NoNodes);
                            continue;
                        };
                        debug!("Accepted client {} -> {}", client_addr, node);

                        let balancer = Arc::clone(&self);
                        sessions.spawn(async move {
                            balancer.handle_connection(client, client_addr, node).await;
                        });
                    }
                    Err(e) => {
                        error!("Failed to accept connection: {}", e);
                        tokio::time::sleep(accept::ERROR_BACKOFF).await;
                    }
                },
            }
        }

        drop(listener);
        info!("Listener closed, draining {} session(s)", sessions.len());

        self.drain(&mut sessions).await;

        if let Some(discovery) = self.take_discovery() {
            if let Err(e) = discovery.await {
                warn!("Discovery task failed: {}", e);
            }
        }

        info!("Balancer stopped");
    }

    /// Wait for sessions to finish on their own, then abort the remainder
    async fn drain(&self, sessions: &mut JoinSet<()>) {
        let drain_timeout = self.config.drain_timeout;

        let drained = tokio::time::timeout(drain_timeout, async {
            while let Some(finished) = sessions.join_next().await {
                if let Err(e) = finished {
                    warn!("Session task failed: {}", e);
                }
            }
        })
        .await;

        if drained.is_err() {
            warn!(
                "{} session(s) still open after {:?}, closing them",
                sessions.len(),
                drain_timeout
            );
            sessions.shutdown().await;
        }
    }

    /// Dial `node` within the configured dial timeout
    pub(super) async fn dial(&self, node: &NodeAddress) -> Result<TcpStream, ConnectionError> {
        let timeout = self.config.dial_timeout;

        match tokio::time::timeout(timeout, TcpStream::connect(node.host_port())).await {
            Ok(Ok(stream)) => Ok(stream),
            Ok(Err(source)) => Err(ConnectionError::TcpConnect {
                node: node.clone(),
                source,
            }),
            Err(_) => Err(ConnectionError::DialTimeout {
                node: node.clone(),
                timeout,
            }),
        }
    }

    /// Proxy one client to `node`
    ///
    /// A dial failure closes the client (by dropping it) and ends the task.
    async fn handle_connection(&self, client: TcpStream, client_addr: SocketAddr, node: NodeAddress) {
        let _guard = SessionGuard::enter(self);

        let backend = match self.dial(&node).await {
            Ok(backend) => backend,
            Err(e) => {
                log_connection_error(client_addr, &e);
                return;
            }
        };

        try_tune_stream(&client, "client");
        try_tune_stream(&backend, "backend");

        let summary = run_session(client, client_addr, backend, node).await;
        debug!(
            "Session {} <-> {} closed: {} bytes up, {} bytes down",
            summary.client, summary.node, summary.client_to_backend, summary.backend_to_client
        );
    }
}
