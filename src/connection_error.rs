//! Connection error types for the balancer
//!
//! Distinguishes the startup-fatal bind failure from per-session dial
//! failures, which only ever cost the one client connection.

use std::fmt;
use std::time::Duration;

use crate::types::NodeAddress;

/// Errors that can occur while listening or dialing a backend
#[derive(Debug)]
#[non_exhaustive]
pub enum ConnectionError {
    /// Listener bind failed (fatal at startup)
    Bind {
        address: String,
        source: std::io::Error,
    },

    /// TCP connection to the chosen backend failed
    TcpConnect {
        node: NodeAddress,
        source: std::io::Error,
    },

    /// Backend did not accept the connection within the dial timeout
    DialTimeout { node: NodeAddress, timeout: Duration },

    /// Registry had no node to offer
    NoNodes,

    /// Read or write error that ended one direction of a session
    IoError(std::io::Error),
}

impl fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bind { address, source } => {
                write!(f, "Failed to bind {}: {}", address, source)
            }
            Self::TcpConnect { node, source } => {
                write!(f, "Failed to connect to node {}: {}", node, source)
            }
            Self::DialTimeout { node, timeout } => {
                write!(
                    f,
                    "Timed out after {:?} connecting to node {}",
                    timeout, node
                )
            }
            Self::NoNodes => write!(f, "No backend nodes available"),
            Self::IoError(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for ConnectionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Bind { source, .. } => Some(source),
            Self::TcpConnect { source, .. } => Some(source),
            Self::IoError(e) => Some(e),
            _ => None,
        }
    }
}

impl ConnectionError {
    /// Check if this error must stop the process
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Bind { .. })
    }

    /// Get the appropriate log level for this error
    #[must_use]
    pub fn log_level(&self) -> tracing::Level {
        match self {
            Self::Bind { .. } | Self::NoNodes => tracing::Level::ERROR,
            // Peers hanging up mid-session are routine
            Self::IoError(e)
                if matches!(
                    e.kind(),
                    std::io::ErrorKind::BrokenPipe | std::io::ErrorKind::ConnectionReset
                ) =>
            {
                tracing::Level::DEBUG
            }
            _ => tracing::Level::WARN,
        }
    }
}

impl From<std::io::Error> for ConnectionError {
    fn from(err: std::io::Error) -> Self {
        Self::IoError(err)
    }
}
