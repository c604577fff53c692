//! Configuration type definitions

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use super::defaults;
use crate::types::{NodeAddress, duration_serde};

/// Main balancer configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct Config {
    /// Listener and session settings
    #[serde(default)]
    pub balancer: BalancerConfig,
    /// Cluster credentials and bootstrap nodes
    #[serde(default)]
    pub cluster: ClusterConfig,
    /// Node discovery settings
    #[serde(default)]
    pub discovery: DiscoveryConfig,
}

/// Listener and session settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BalancerConfig {
    /// Host/IP to bind to
    pub host: String,
    /// Port to listen on (0 lets the OS choose)
    pub port: u16,
    /// Timeout for connecting to the chosen backend
    #[serde(with = "duration_serde")]
    pub dial_timeout: Duration,
    /// How long shutdown waits for in-flight sessions
    #[serde(with = "duration_serde")]
    pub drain_timeout: Duration,
}

impl BalancerConfig {
    /// Formatted listen address, e.g. `0.0.0.0:26257`
    #[must_use]
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for BalancerConfig {
    fn default() -> Self {
        Self {
            host: defaults::listen_host(),
            port: defaults::listen_port(),
            dial_timeout: defaults::dial_timeout(),
            drain_timeout: defaults::drain_timeout(),
        }
    }
}

/// Cluster credentials and bootstrap nodes
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClusterConfig {
    /// SQL user for the liveness query
    pub user: String,
    /// Directory holding `ca.crt`, `client.<user>.key` and `client.<user>.crt`
    pub certs_dir: PathBuf,
    /// Database to connect to
    pub database: String,
    /// Nodes known at startup
    pub nodes: Vec<NodeAddress>,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            user: defaults::user(),
            certs_dir: defaults::certs_dir(),
            database: defaults::database(),
            nodes: Vec::new(),
        }
    }
}

/// Node discovery settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Interval between refresh cycles
    #[serde(with = "duration_serde")]
    pub interval: Duration,
    /// Bound on each trial query
    #[serde(with = "duration_serde")]
    pub query_timeout: Duration,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            interval: defaults::discovery_interval(),
            query_timeout: defaults::query_timeout(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = Config::default();

        assert_eq!(config.balancer.listen_addr(), "0.0.0.0:26257");
        assert_eq!(config.balancer.dial_timeout, Duration::from_secs(5));
        assert_eq!(config.cluster.user, "root");
        assert_eq!(config.cluster.certs_dir, PathBuf::from("cert"));
        assert_eq!(config.cluster.database, "defaultdb");
        assert!(config.cluster.nodes.is_empty());
        assert_eq!(config.discovery.interval, Duration::from_secs(30));
        assert_eq!(config.discovery.query_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_partial_sections_fill_defaults() {
        let config: Config = toml::from_str(
            r#"
[balancer]
port = 0

[cluster]
user = "maxroach"
nodes = ["10.0.0.1:26257", "10.0.0.2:26257"]

[discovery]
interval = 10
"#,
        )
        .unwrap();

        assert_eq!(config.balancer.port, 0);
        assert_eq!(config.balancer.host, "0.0.0.0");
        assert_eq!(config.cluster.user, "maxroach");
        assert_eq!(config.cluster.certs_dir, PathBuf::from("cert"));
        assert_eq!(config.cluster.nodes.len(), 2);
        assert_eq!(config.discovery.interval, Duration::from_secs(10));
        assert_eq!(config.discovery.query_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_invalid_node_rejected_at_parse() {
        let result = toml::from_str::<Config>(
            r#"
[cluster]
nodes = ["db:notaport"]
"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_config_round_trips_through_toml() {
        let mut config = Config::default();
        config.cluster.nodes = vec![NodeAddress::new("db:26257".to_string()).unwrap()];

        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();

        assert_eq!(parsed, config);
    }
}
