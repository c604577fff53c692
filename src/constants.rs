//! Constants used throughout the balancer
//!
//! Centralizes tuning values so the proxy, discovery and config layers agree.

use std::time::Duration;

/// Buffer size constants
pub mod buffer {
    /// Page size for memory alignment (4KB = standard OS page)
    const PAGE_SIZE: usize = 4096;

    /// Per-direction copy buffer for proxied sessions (64KB)
    ///
    /// Matches the default socket receive window closely enough that one
    /// read normally drains everything the kernel has queued.
    pub const COPY: usize = 64 * 1024;

    const _COPY_ALIGNED: () = assert!(COPY % PAGE_SIZE == 0, "COPY must be page-aligned");
}

/// Socket tuning
pub mod socket {
    use super::Duration;

    /// Idle time before TCP keepalive probes start
    pub const KEEPALIVE_IDLE: Duration = Duration::from_secs(60);

    /// Interval between keepalive probes
    pub const KEEPALIVE_INTERVAL: Duration = Duration::from_secs(10);
}

/// Accept loop timing
pub mod accept {
    use super::Duration;

    /// Pause after a failed accept so fd exhaustion does not spin the loop
    pub const ERROR_BACKOFF: Duration = Duration::from_millis(50);
}

/// CockroachDB cluster conventions
pub mod cluster {
    /// Database name used for the liveness query
    pub const DEFAULT_DATABASE: &str = "defaultdb";

    /// Default SQL user
    pub const DEFAULT_USER: &str = "root";

    /// Default certificate directory
    pub const DEFAULT_CERTS_DIR: &str = "cert";

    /// CA certificate file name inside the certificate directory
    pub const CA_CERT_FILE: &str = "ca.crt";
}
