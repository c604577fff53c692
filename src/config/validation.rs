//! Configuration validation
//!
//! This module provides validation logic for the configuration to ensure
//! all settings are valid before the balancer starts.

use anyhow::Result;
use std::time::Duration;

use super::types::Config;

const MIN_RECOMMENDED_INTERVAL: Duration = Duration::from_secs(5);

impl Config {
    /// Validate configuration for correctness
    ///
    /// Node addresses are already validated by their type. This checks the
    /// remaining semantic constraints:
    /// - At least one bootstrap node
    /// - Non-zero discovery interval and query timeout
    /// - Non-zero dial timeout
    pub fn validate(&self) -> Result<()> {
        if self.cluster.nodes.is_empty() {
            return Err(anyhow::anyhow!(
                "Configuration must have at least one bootstrap node"
            ));
        }

        if self.discovery.interval.is_zero() {
            return Err(anyhow::anyhow!("Discovery interval must be greater than zero"));
        }

        if self.discovery.query_timeout.is_zero() {
            return Err(anyhow::anyhow!(
                "Discovery query timeout must be greater than zero"
            ));
        }

        if self.balancer.dial_timeout.is_zero() {
            return Err(anyhow::anyhow!("Dial timeout must be greater than zero"));
        }

        if self.discovery.interval < MIN_RECOMMENDED_INTERVAL {
            tracing::warn!(
                "Discovery interval {:?} is below {:?}. \
                 Every cycle opens a TLS connection to a node; consider a longer interval.",
                self.discovery.interval,
                MIN_RECOMMENDED_INTERVAL
            );
        }

        if self.discovery.query_timeout > self.discovery.interval {
            tracing::warn!(
                "Discovery query timeout {:?} exceeds the interval {:?}; \
                 slow cycles will delay the next refresh.",
                self.discovery.query_timeout,
                self.discovery.interval
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::create_default_config;

    #[test]
    fn test_default_example_is_valid() {
        assert!(create_default_config().validate().is_ok());
    }

    #[test]
    fn test_no_nodes_rejected() {
        let err = Config::default().validate().unwrap_err();
        assert!(err.to_string().contains("bootstrap node"));
    }

    #[test]
    fn test_zero_interval_rejected() {
        let mut config = create_default_config();
        config.discovery.interval = Duration::ZERO;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_query_timeout_rejected() {
        let mut config = create_default_config();
        config.discovery.query_timeout = Duration::ZERO;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_dial_timeout_rejected() {
        let mut config = create_default_config();
        config.balancer.dial_timeout = Duration::ZERO;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_short_interval_only_warns() {
        let mut config = create_default_config();
        config.discovery.interval = Duration::from_secs(1);
        config.discovery.query_timeout = Duration::from_secs(1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_port_zero_allowed() {
        let mut config = create_default_config();
        config.balancer.port = 0;
        assert!(config.validate().is_ok());
    }
}
