//! # roach-balancer
//!
//! A transparent TCP load balancer for CockroachDB clusters.
//!
//! Clients connect to the balancer exactly as they would to a node. Each
//! accepted connection is assigned the next known node in round-robin order
//! and bytes are relayed in both directions without being inspected. A
//! background task periodically asks the cluster which members are live and
//! refreshes the node list from the answer.
//!
//! ## Module structure
//!
//! - [`router`]: node registry and round-robin selection
//! - [`discovery`]: periodic live-node discovery behind [`HealthQuerySource`]
//! - [`proxy`]: listener, accept loop and byte forwarding
//! - [`config`]: TOML configuration, environment overrides and validation
//! - [`types`]: validated domain types

pub mod args;
pub mod config;
pub mod connection_error;
pub mod constants;
pub mod discovery;
pub mod logging;
pub mod network;
pub mod proxy;
pub mod router;
pub mod runtime;
pub mod types;

pub use args::Args;
pub use config::{
    BalancerConfig, ClusterConfig, Config, ConfigSource, DiscoveryConfig, create_default_config,
    load_config, load_config_with_fallback,
};
pub use connection_error::ConnectionError;
pub use discovery::{
    CockroachLivenessSource, Discovery, DiscoveryError, HealthQuerySource, RefreshOutcome,
};
pub use proxy::Balancer;
pub use router::{NodeRegistry, RegistryError};
pub use runtime::{RuntimeConfig, shutdown_signal};
pub use types::{NodeAddress, ValidationError};
