//! Command-line arguments for the balancer binary
//!
//! Every flag is optional. Flags given on the command line override the
//! config file and environment; absent flags leave them untouched.

use clap::Parser;
use std::path::PathBuf;

use crate::config::Config;
use crate::types::NodeAddress;

/// Transparent TCP load balancer for CockroachDB
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// SQL user for discovery queries (overrides config file)
    #[arg(long)]
    pub user: Option<String>,

    /// Directory holding ca.crt and client.<user>.{key,crt} (overrides config file)
    #[arg(long)]
    pub certs_dir: Option<PathBuf>,

    /// Bootstrap node as host:port; repeat for several nodes
    ///
    /// When given, replaces the node list from the config file entirely.
    #[arg(long = "node", value_name = "HOST:PORT")]
    pub nodes: Vec<NodeAddress>,

    /// Port to listen on (overrides config file)
    #[arg(short, long, env = "ROACH_BALANCER_PORT")]
    pub port: Option<u16>,

    /// Host to bind to (overrides config file)
    #[arg(long, env = "ROACH_BALANCER_HOST")]
    pub host: Option<String>,

    /// Configuration file path; missing file means built-in defaults
    #[arg(
        short,
        long,
        default_value = "roach-balancer.toml",
        env = "ROACH_BALANCER_CONFIG"
    )]
    pub config: PathBuf,

    /// Number of worker threads (default: CPU cores, 1 for single-threaded)
    #[arg(short, long, env = "ROACH_BALANCER_THREADS")]
    pub threads: Option<usize>,

    /// Also write logs to this file
    #[arg(long, env = "ROACH_BALANCER_LOG_FILE")]
    pub log_file: Option<PathBuf>,
}

impl Args {
    /// Layer the command-line overrides onto `config`
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(user) = &self.user {
            config.cluster.user.clone_from(user);
        }
        if let Some(dir) = &self.certs_dir {
            config.cluster.certs_dir.clone_from(dir);
        }
        if !self.nodes.is_empty() {
            config.cluster.nodes.clone_from(&self.nodes);
        }
        if let Some(port) = self.port {
            config.balancer.port = port;
        }
        if let Some(host) = &self.host {
            config.balancer.host.clone_from(host);
        }
    }
}
