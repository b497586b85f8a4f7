//! Authentication middleware for the agent API
//!
//! Callers present a bearer token. With Kubernetes auth enabled the token is
//! validated through a `TokenReview` and must belong to the operator's
//! ServiceAccount.

use crate::api_error::ErrorBody;
use async_trait::async_trait;
use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use k8s_openapi::api::authentication::v1::{TokenReview, TokenReviewSpec};
use kube::Api;
use kube::api::PostParams;
use std::sync::Arc;
use thiserror::Error;
use tracing::{Span, debug, warn};

/// Authenticated caller, stored in the request extensions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    pub username: String,
}

#[derive(Debug, Error)]
pub enum AuthError {
    /// Missing, malformed or rejected token
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Valid token of an identity that may not call the agent
    #[error("forbidden: {0}")]
    Forbidden(String),
    /// The token could not be checked
    #[error("error verifying token: {0}")]
    Internal(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (
            status,
            axum::Json(ErrorBody {
                message: self.to_string(),
            }),
        )
            .into_response()
    }
}

/// Validates a bearer token and resolves the caller behind it
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<CallerIdentity, AuthError>;
}

/// The only ServiceAccount allowed to call the agent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustedServiceAccount {
    pub name: String,
    pub namespace: String,
}

impl TrustedServiceAccount {
    #[must_use]
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
        }
    }

    /// Username the API server reports for this ServiceAccount
    #[must_use]
    pub fn username(&self) -> String {
        format!("system:serviceaccount:{}:{}", self.namespace, self.name)
    }
}

/// [`TokenVerifier`] backed by the Kubernetes `TokenReview` API
pub struct KubernetesTokenVerifier {
    client: kube::Client,
    trusted: TrustedServiceAccount,
}

impl KubernetesTokenVerifier {
    #[must_use]
    pub const fn new(client: kube::Client, trusted: TrustedServiceAccount) -> Self {
        Self { client, trusted }
    }
}

#[async_trait]
impl TokenVerifier for KubernetesTokenVerifier {
    async fn verify(&self, token: &str) -> Result<CallerIdentity, AuthError> {
        let review = TokenReview {
            spec: TokenReviewSpec {
                token: Some(token.to_string()),
                ..Default::default()
            },
            ..Default::default()
        };

        let reviews: Api<TokenReview> = Api::all(self.client.clone());
        let reviewed = reviews
            .create(&PostParams::default(), &review)
            .await
            .map_err(|e| {
                warn!("TokenReview request failed: {}", e);
                AuthError::Internal(e.to_string())
            })?;

        let status = reviewed
            .status
            .ok_or_else(|| AuthError::Internal("TokenReview has no status".to_string()))?;
        if !status.authenticated.unwrap_or(false) {
            return Err(AuthError::Unauthorized(
                status
                    .error
                    .unwrap_or_else(|| "token not authenticated".to_string()),
            ));
        }

        let username = status
            .user
            .and_then(|u| u.username)
            .ok_or_else(|| AuthError::Unauthorized("token has no username".to_string()))?;
        check_trusted(&username, &self.trusted)?;

        Ok(CallerIdentity { username })
    }
}

fn check_trusted(username: &str, trusted: &TrustedServiceAccount) -> Result<(), AuthError> {
    if username == trusted.username() {
        Ok(())
    } else {
        Err(AuthError::Forbidden(format!(
            "'{username}' is not the trusted ServiceAccount"
        )))
    }
}

fn bearer_token(headers: &HeaderMap) -> Result<String, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| AuthError::Unauthorized("missing authorization header".to_string()))?
        .to_str()
        .map_err(|_| AuthError::Unauthorized("invalid authorization header".to_string()))?;

    match value.split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() => {
            Ok(token.trim().to_string())
        }
        _ => Err(AuthError::Unauthorized(
            "authorization header is not a bearer token".to_string(),
        )),
    }
}

/// Authentication middleware layer
pub async fn auth_layer(
    State(verifier): State<Arc<dyn TokenVerifier>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let token = bearer_token(request.headers())?;
    let caller = verifier.verify(&token).await?;

    Span::current().record("caller", caller.username.as_str());
    debug!(caller = %caller.username, "request authenticated");

    request.extensions_mut().insert(caller);
    Ok(next.run(request).await)
}
