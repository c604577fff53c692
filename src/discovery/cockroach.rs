//! CockroachDB liveness source
//!
//! Asks a node for the cluster's gossip liveness records over the Postgres
//! wire protocol and returns the SQL address of every member whose liveness
//! record is live and not yet expired.

use async_trait::async_trait;
use sqlx::{Connection, PgConnection};
use tracing::debug;

use super::{ConnectionDescriptor, DiscoveryError, HealthQuerySource};
use crate::config::ClusterConfig;
use crate::types::NodeAddress;

/// Live, unexpired cluster members
///
/// `expiration` is an HLC timestamp rendered as `<wall nanos>,<logical>`;
/// only the wall time is compared against `now()`.
pub const LIVENESS_QUERY: &str = "\
SELECT address FROM (
    SELECT address,
        CASE WHEN split_part(expiration, ',', 1)::DECIMAL > now()::DECIMAL
            THEN true
            ELSE false
        END AS is_available,
        ifnull(is_live, false) AS is_live
    FROM crdb_internal.gossip_liveness
    LEFT JOIN crdb_internal.gossip_nodes USING (node_id)
) AS a
WHERE a.is_available = true AND a.is_live = true";

/// [`HealthQuerySource`] backed by a real CockroachDB cluster
#[derive(Debug, Clone)]
pub struct CockroachLivenessSource {
    cluster: ClusterConfig,
}

impl CockroachLivenessSource {
    /// Create a source using the credentials in `cluster`
    #[must_use]
    pub fn new(cluster: ClusterConfig) -> Self {
        Self { cluster }
    }
}

#[async_trait]
impl HealthQuerySource for CockroachLivenessSource {
    async fn live_nodes(&self, node: &NodeAddress) -> Result<Vec<NodeAddress>, DiscoveryError> {
        let descriptor = ConnectionDescriptor::new(&self.cluster, node);
        debug!("Querying cluster liveness via {}", descriptor.to_url());

        let mut conn = PgConnection::connect_with(&descriptor.connect_options())
            .await
            .map_err(|e| DiscoveryError::Connect {
                node: node.clone(),
                source: Box::new(e),
            })?;

        let rows = sqlx::query_scalar::<_, String>(LIVENESS_QUERY)
            .fetch_all(&mut conn)
            .await;

        if let Err(e) = conn.close().await {
            debug!("Error closing discovery connection to {}: {}", node, e);
        }

        let addresses = rows.map_err(|e| DiscoveryError::Query {
            node: node.clone(),
            source: Box::new(e),
        })?;

        addresses
            .into_iter()
            .map(|address| {
                NodeAddress::new(address).map_err(|source| DiscoveryError::InvalidAddress {
                    node: node.clone(),
                    source,
                })
            })
            .collect()
    }
}
