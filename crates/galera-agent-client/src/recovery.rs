//! Recovery operations.

use crate::client::Client;
use crate::error::Result;
use galera_agent_core::RecoveredPosition;
use reqwest::Method;

const PATH: &str = "/api/recovery";

/// `/api/recovery` on one agent
pub struct RecoveryApi<'a> {
    client: &'a Client,
}

impl<'a> RecoveryApi<'a> {
    pub(crate) const fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Restart the engine in recovery mode and return its last position.
    ///
    /// This blocks for as long as the agent polls the recovery log.
    ///
    /// # Errors
    /// Returns status 500 when no position could be recovered.
    pub async fn start(&self) -> Result<RecoveredPosition> {
        let response = self.client.send_empty(Method::PUT, PATH).await?;
        Client::decode(response).await
    }

    /// Remove the recovery directive.
    ///
    /// # Errors
    /// Returns status 404 if recovery was not started.
    pub async fn stop(&self) -> Result<()> {
        self.client.send_empty(Method::DELETE, PATH).await?;
        Ok(())
    }
}
