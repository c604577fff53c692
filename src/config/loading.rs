//! Configuration loading from files and environment variables
//!
//! Environment variables take precedence over the config file so container
//! deployments can point the balancer at a cluster without editing files:
//! - `ROACH_BALANCER_NODES` - comma-separated bootstrap nodes
//! - `ROACH_BALANCER_USER` - SQL user for discovery
//! - `ROACH_BALANCER_CERTS_DIR` - certificate directory

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use super::types::Config;
use crate::types::NodeAddress;

const ENV_NODES: &str = "ROACH_BALANCER_NODES";
const ENV_USER: &str = "ROACH_BALANCER_USER";
const ENV_CERTS_DIR: &str = "ROACH_BALANCER_CERTS_DIR";

/// Where the effective configuration came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    /// Parsed from the given config file
    File,
    /// No config file; built-in defaults
    Defaults,
}

impl ConfigSource {
    /// Human-readable description for logs
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::File => "configuration file",
            Self::Defaults => "built-in defaults",
        }
    }
}

/// Apply overrides using `lookup` in place of the process environment
///
/// # Errors
/// Returns error if an overriding node address is invalid
pub fn apply_overrides_from<F>(config: &mut Config, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(nodes) = lookup(ENV_NODES) {
        let nodes = nodes
            .split(',')
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(|n| n.parse::<NodeAddress>())
            .collect::<Result<Vec<_>, _>>()
            .with_context(|| format!("Invalid node in {}", ENV_NODES))?;

        if !nodes.is_empty() {
            tracing::info!(
                "Using {} bootstrap node(s) from {} (overriding config file)",
                nodes.len(),
                ENV_NODES
            );
            config.cluster.nodes = nodes;
        }
    }

    if let Some(user) = lookup(ENV_USER).filter(|u| !u.trim().is_empty()) {
        config.cluster.user = user;
    }

    if let Some(dir) = lookup(ENV_CERTS_DIR).filter(|d| !d.trim().is_empty()) {
        config.cluster.certs_dir = PathBuf::from(dir);
    }

    Ok(())
}

/// Apply overrides from the process environment
///
/// # Errors
/// Returns error if `ROACH_BALANCER_NODES` holds an invalid address
pub fn apply_env_overrides(config: &mut Config) -> Result<()> {
    apply_overrides_from(config, |key| std::env::var(key).ok())
}

fn read_config_file(config_path: &Path) -> Result<Config> {
    let config_content = std::fs::read_to_string(config_path).map_err(|e| {
        anyhow::anyhow!(
            "Failed to read config file '{}': {}",
            config_path.display(),
            e
        )
    })?;

    toml::from_str(&config_content).map_err(|e| {
        anyhow::anyhow!(
            "Failed to parse config file '{}': {}",
            config_path.display(),
            e
        )
    })
}

/// Load and validate configuration from a TOML file, with environment overrides
///
/// # Errors
/// Returns error if the file cannot be read or parsed, or fails validation
pub fn load_config(config_path: impl AsRef<Path>) -> Result<Config> {
    let mut config = read_config_file(config_path.as_ref())?;
    apply_env_overrides(&mut config)?;
    config.validate()?;
    Ok(config)
}

/// Load configuration from `config_path` if it exists, else start from defaults
///
/// Environment overrides are applied either way. The result is NOT validated,
/// so callers can layer command-line arguments on top before calling
/// [`Config::validate`].
///
/// # Errors
/// Returns error if an existing file cannot be read or parsed
pub fn load_config_with_fallback(config_path: impl AsRef<Path>) -> Result<(Config, ConfigSource)> {
    let path = config_path.as_ref();

    let (mut config, source) = if path.exists() {
        (read_config_file(path)?, ConfigSource::File)
    } else {
        tracing::debug!(
            "Config file '{}' not found, using defaults",
            path.display()
        );
        (Config::default(), ConfigSource::Defaults)
    };

    apply_env_overrides(&mut config)?;
    Ok((config, source))
}

/// Create an example configuration pointing at a local single-node cluster
#[must_use]
pub fn create_default_config() -> Config {
    let mut config = Config::default();
    config.cluster.nodes =
        vec![NodeAddress::new("localhost:26257".to_string()).expect("literal address is valid")];
    config
}
