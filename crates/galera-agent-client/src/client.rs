//! Core client implementation.

use crate::bootstrap::BootstrapApi;
use crate::error::{ClientError, Result};
use crate::galera_state::GaleraStateApi;
use crate::recovery::RecoveryApi;
use reqwest::{Client as HttpClient, Method, RequestBuilder, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Client for one Galera agent.
///
/// ```no_run
/// use galera_agent_client::Client;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = Client::new("http://mariadb-0.mariadb-internal:5555")?;
/// let position = client.recovery().start().await?;
/// client.bootstrap().enable(&position.into()).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Client {
    base_url: String,
    http: HttpClient,
    token: Option<String>,
}

impl Client {
    /// Create a client for the agent at `base_url`.
    ///
    /// # Errors
    /// Returns an error if the URL is not http(s) or the HTTP client cannot
    /// be built.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let base_url = base_url.into();
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ClientError::InvalidUrl(format!(
                "URL must start with http:// or https://, got: {base_url}"
            )));
        }

        let http = HttpClient::builder().timeout(DEFAULT_TIMEOUT).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
            token: None,
        })
    }

    /// Send `Authorization: Bearer <token>` with every request
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Replace the default one minute request timeout.
    ///
    /// Recovery waits for the engine, so the timeout should cover the
    /// agent's reload and poll budget.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be rebuilt.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.http = HttpClient::builder().timeout(timeout).build()?;
        Ok(self)
    }

    #[must_use]
    pub const fn bootstrap(&self) -> BootstrapApi<'_> {
        BootstrapApi::new(self)
    }

    #[must_use]
    pub const fn galera_state(&self) -> GaleraStateApi<'_> {
        GaleraStateApi::new(self)
    }

    #[must_use]
    pub const fn recovery(&self) -> RecoveryApi<'_> {
        RecoveryApi::new(self)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .http
            .request(method, self.url(path))
            .header(reqwest::header::ACCEPT, "application/json");
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    pub(crate) async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<Response> {
        let mut builder = self.request(method, path);
        if let Some(body) = body {
            builder = builder.json(body);
        }
        let response = builder.send().await?;
        check_status(response).await
    }

    pub(crate) async fn send_empty(&self, method: Method, path: &str) -> Result<Response> {
        self.send::<()>(method, path, None).await
    }

    pub(crate) async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Turn a non-2xx response into [`ClientError::Api`], using the agent's
/// `{"message": ...}` body when there is one.
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|json| json["message"].as_str().map(str::to_string))
        .unwrap_or(body);

    Err(ClientError::Api {
        status: status.as_u16(),
        message,
    })
}
