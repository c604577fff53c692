//! Configuration module
//!
//! This module handles all configuration types and loading
//! for the balancer.

mod defaults;
mod loading;
mod types;
mod validation;

pub use loading::{
    ConfigSource, apply_env_overrides, apply_overrides_from, create_default_config, load_config,
    load_config_with_fallback,
};
pub use types::{BalancerConfig, ClusterConfig, Config, DiscoveryConfig};
