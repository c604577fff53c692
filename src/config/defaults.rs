//! Default values for configuration fields
//!
//! This module centralizes all default value functions used in serde deserialization.

use std::path::PathBuf;
use std::time::Duration;

use crate::constants::cluster;

/// Default listen host (all interfaces)
#[inline]
pub fn listen_host() -> String {
    "0.0.0.0".to_string()
}

/// Default listen port (CockroachDB's SQL port, so clients need no changes)
#[inline]
pub fn listen_port() -> u16 {
    26257
}

/// Default timeout for dialing a backend node
#[inline]
pub fn dial_timeout() -> Duration {
    Duration::from_secs(5)
}

/// Default time in-flight sessions get to finish on shutdown
#[inline]
pub fn drain_timeout() -> Duration {
    Duration::from_secs(30)
}

/// Default interval between discovery cycles
#[inline]
pub fn discovery_interval() -> Duration {
    Duration::from_secs(30)
}

/// Default bound on one liveness query, connect included
#[inline]
pub fn query_timeout() -> Duration {
    Duration::from_secs(5)
}

#[inline]
pub fn user() -> String {
    cluster::DEFAULT_USER.to_string()
}

#[inline]
pub fn certs_dir() -> PathBuf {
    PathBuf::from(cluster::DEFAULT_CERTS_DIR)
}

#[inline]
pub fn database() -> String {
    cluster::DEFAULT_DATABASE.to_string()
}
