//! Bootstrap operations.

use crate::client::Client;
use crate::error::Result;
use galera_agent_core::BootstrapSeed;
use reqwest::Method;

const PATH: &str = "/api/bootstrap";

/// `/api/bootstrap` on one agent
pub struct BootstrapApi<'a> {
    client: &'a Client,
}

impl<'a> BootstrapApi<'a> {
    pub(crate) const fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Make the node bootstrap a new cluster from `seed`.
    ///
    /// # Errors
    /// Returns status 400 for an invalid seed and 412 when the node has no
    /// cluster state yet.
    pub async fn enable(&self, seed: &BootstrapSeed) -> Result<()> {
        self.client.send(Method::PUT, PATH, Some(seed)).await?;
        Ok(())
    }

    /// Remove the bootstrap directive.
    ///
    /// # Errors
    /// Returns status 404 if bootstrap was not enabled; see
    /// [`crate::ClientError::is_not_found`].
    pub async fn disable(&self) -> Result<()> {
        self.client.send_empty(Method::DELETE, PATH).await?;
        Ok(())
    }
}
