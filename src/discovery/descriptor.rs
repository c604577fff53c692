//! Per-node connection descriptors for the liveness query

use sqlx::postgres::{PgConnectOptions, PgSslMode};
use std::path::PathBuf;

use crate::config::ClusterConfig;
use crate::constants::cluster::CA_CERT_FILE;
use crate::types::NodeAddress;

/// Everything needed to open an authenticated connection to one node
///
/// TLS is always `require`. Client key and certificate follow the CockroachDB
/// naming convention `client.<user>.key` / `client.<user>.crt` inside the
/// certificate directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionDescriptor {
    pub user: String,
    pub node: NodeAddress,
    pub database: String,
    pub root_cert: PathBuf,
    pub client_key: PathBuf,
    pub client_cert: PathBuf,
}

impl ConnectionDescriptor {
    /// Build the descriptor for `node` from cluster credentials
    #[must_use]
    pub fn new(cluster: &ClusterConfig, node: &NodeAddress) -> Self {
        let certs = &cluster.certs_dir;
        Self {
            user: cluster.user.clone(),
            node: node.clone(),
            database: cluster.database.clone(),
            root_cert: certs.join(CA_CERT_FILE),
            client_key: certs.join(format!("client.{}.key", cluster.user)),
            client_cert: certs.join(format!("client.{}.crt", cluster.user)),
        }
    }

    /// Equivalent `postgresql://` connection URL, for logs and external tools
    #[must_use]
    pub fn to_url(&self) -> String {
        format!(
            "postgresql://{}@{}/{}?sslmode=require&sslrootcert={}&sslkey={}&sslcert={}",
            self.user,
            self.node,
            self.database,
            self.root_cert.display(),
            self.client_key.display(),
            self.client_cert.display(),
        )
    }

    /// Driver options for this descriptor
    #[must_use]
    pub fn connect_options(&self) -> PgConnectOptions {
        let (host, port) = self.node.host_port();
        PgConnectOptions::new_without_pgpass()
            .host(host)
            .port(port)
            .username(&self.user)
            .database(&self.database)
            .ssl_mode(PgSslMode::Require)
            .ssl_root_cert(&self.root_cert)
            .ssl_client_key(&self.client_key)
            .ssl_client_cert(&self.client_cert)
            .application_name("roach-balancer")
    }
}
