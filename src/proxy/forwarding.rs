//! Byte forwarding between a client and its backend
//!
//! Each session is two independent one-way copies. A copy that ends, for any
//! reason, shuts down the write side of its destination and nothing else.
//! That is a half-close: the destination peer sees EOF but the socket stays
//! open, and the opposite copy keeps running until its own source reaches EOF
//! or errors. A peer that closes once it reads EOF ends the session promptly;
//! one that keeps talking after a half-close keeps its direction alive.
//! Neither copy ever cancels the other. Each socket is fully closed only when
//! both of its halves are dropped, at the end of [`run_session`].

use std::fmt;
use std::io;
use std::net::SocketAddr;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use super::log_connection_error;
use crate::connection_error::ConnectionError;
use crate::constants::buffer;
use crate::types::NodeAddress;

/// Which way a copy moves bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    ClientToBackend,
    BackendToClient,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ClientToBackend => "client->backend",
            Self::BackendToClient => "backend->client",
        })
    }
}

/// How one copy ended
#[derive(Debug)]
pub struct PipeOutcome {
    pub direction: Direction,
    /// Bytes fully written to the destination
    pub bytes: u64,
    /// Read or write error that ended the copy, `None` on clean EOF
    pub error: Option<io::Error>,
}

/// Copy `source` into `destination` until EOF or error, then shut `destination` down
///
/// For a TCP write half, `shutdown` sends FIN without closing the socket.
/// The source is left untouched; whoever owns the opposite copy owns it.
pub async fn pipe<R, W>(mut source: R, mut destination: W, direction: Direction) -> PipeOutcome
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = vec![0u8; buffer::COPY];
    let mut bytes = 0u64;

    let error = loop {
        let n = match source.read(&mut buf).await {
            Ok(0) => break None,
            Ok(n) => n,
            Err(e) => break Some(e),
        };

        if let Err(e) = destination.write_all(&buf[..n]).await {
            break Some(e);
        }
        bytes += n as u64;
    };

    if let Err(e) = destination.shutdown().await {
        debug!("{} shutdown after copy: {}", direction, e);
    }

    PipeOutcome {
        direction,
        bytes,
        error,
    }
}

/// Totals for one finished session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub client: SocketAddr,
    pub node: NodeAddress,
    pub client_to_backend: u64,
    pub backend_to_client: u64,
}

/// Relay between `client` and `backend` until both directions have ended
///
/// The two copies run as separate tasks owned by a session-local `JoinSet`.
/// Dropping this future (for instance when shutdown gives up draining)
/// aborts both copies and closes both sockets.
pub async fn run_session(
    client: TcpStream,
    client_addr: SocketAddr,
    backend: TcpStream,
    node: NodeAddress,
) -> SessionSummary {
    let (client_read, client_write) = client.into_split();
    let (backend_read, backend_write) = backend.into_split();

    let mut copies = JoinSet::new();
    copies.spawn(pipe(client_read, backend_write, Direction::ClientToBackend));
    copies.spawn(pipe(backend_read, client_write, Direction::BackendToClient));

    let mut summary = SessionSummary {
        client: client_addr,
        node,
        client_to_backend: 0,
        backend_to_client: 0,
    };

    while let Some(joined) = copies.join_next().await {
        let mut outcome = match joined {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("Copy task for client {} failed: {}", client_addr, e);
                continue;
            }
        };

        if let Some(e) = outcome.error.take() {
            debug!("{} for client {} ended with an error", outcome.direction, client_addr);
            log_connection_error(client_addr, &ConnectionError::from(e));
        }

        match outcome.direction {
            Direction::ClientToBackend => summary.client_to_backend = outcome.bytes,
            Direction::BackendToClient => summary.backend_to_client = outcome.bytes,
        }
    }

    summary
}
