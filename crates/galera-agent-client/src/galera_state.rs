//! Cluster state inspection.

use crate::client::Client;
use crate::error::Result;
use galera_agent_core::ClusterStateRecord;
use reqwest::Method;

/// `/api/galerastate` on one agent
pub struct GaleraStateApi<'a> {
    client: &'a Client,
}

impl<'a> GaleraStateApi<'a> {
    pub(crate) const fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Fetch the node's `grastate.dat`.
    ///
    /// # Errors
    /// Returns status 404 when the node has no cluster state.
    pub async fn get(&self) -> Result<ClusterStateRecord> {
        let response = self
            .client
            .send_empty(Method::GET, "/api/galerastate")
            .await?;
        Client::decode(response).await
    }
}
