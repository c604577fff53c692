//! Backend node addresses

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ValidationError;

/// Default CockroachDB SQL port, used when an address carries no port
pub const DEFAULT_NODE_PORT: u16 = 26257;

/// Address of one backend node, as `host:port`
///
/// Opaque beyond equality: the balancer never interprets it except to dial it
/// or to hand host and port to the discovery driver. Validation only rejects
/// strings that could never be dialed (empty, embedded whitespace, bad port).
///
/// # Examples
/// ```
/// use roach_balancer::types::NodeAddress;
///
/// let node = NodeAddress::new("10.0.0.1:26257".to_string()).unwrap();
/// assert_eq!(node.as_str(), "10.0.0.1:26257");
/// assert_eq!(node.host_port(), ("10.0.0.1", 26257));
///
/// assert!(NodeAddress::new("".to_string()).is_err());
/// assert!(NodeAddress::new("db:notaport".to_string()).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct NodeAddress(String);

impl NodeAddress {
    /// Create a node address after validation
    pub fn new(address: String) -> Result<Self, ValidationError> {
        if address.trim().is_empty() {
            return Err(ValidationError::EmptyNodeAddress);
        }
        if address.chars().any(char::is_whitespace) {
            return Err(ValidationError::InvalidNodeAddress(address));
        }
        split_host_port(&address)?;
        Ok(Self(address))
    }

    /// Get the address as a string slice
    #[must_use]
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Host and port for this address, defaulting the port to 26257
    ///
    /// IPv6 hosts are returned without their brackets.
    #[must_use]
    pub fn host_port(&self) -> (&str, u16) {
        // Validated at construction
        split_host_port(&self.0).unwrap_or((self.0.as_str(), DEFAULT_NODE_PORT))
    }
}

fn split_host_port(address: &str) -> Result<(&str, u16), ValidationError> {
    let invalid = || ValidationError::InvalidNodeAddress(address.to_string());

    let (host, port) = if let Some(rest) = address.strip_prefix('[') {
        let (host, tail) = rest.split_once(']').ok_or_else(invalid)?;
        match tail {
            "" => (host, None),
            _ => (host, Some(tail.strip_prefix(':').ok_or_else(invalid)?)),
        }
    } else {
        match address.matches(':').count() {
            0 => (address, None),
            1 => {
                let (host, port) = address.rsplit_once(':').ok_or_else(invalid)?;
                (host, Some(port))
            }
            // Bare IPv6 literal
            _ => (address, None),
        }
    };

    if host.is_empty() {
        return Err(invalid());
    }

    let port = match port {
        None => DEFAULT_NODE_PORT,
        Some(p) => match p.parse::<u16>() {
            Ok(0) | Err(_) => return Err(invalid()),
            Ok(port) => port,
        },
    };

    Ok((host, port))
}

impl AsRef<str> for NodeAddress {
    #[inline]
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for NodeAddress {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_string())
    }
}

impl TryFrom<String> for NodeAddress {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl<'de> Deserialize<'de> for NodeAddress {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::new(s).map_err(serde::de::Error::custom)
    }
}
