//! API error type.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

/// JSON error body returned by every API route
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
}

/// Error returned by handlers, rendered as `{"message": ...}`
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

pub type Result<T> = std::result::Result<T, ApiError>;

impl ApiError {
    #[must_use]
    pub fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            message: msg.into(),
        }
    }

    #[must_use]
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, msg)
    }

    #[must_use]
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, msg)
    }

    #[must_use]
    pub fn too_many_requests() -> Self {
        Self::new(StatusCode::TOO_MANY_REQUESTS, "too many requests")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(status = self.status.as_u16(), "{}", self.message);
        } else {
            debug!(status = self.status.as_u16(), "{}", self.message);
        }
        (
            self.status,
            axum::Json(ErrorBody {
                message: self.message,
            }),
        )
            .into_response()
    }
}

impl From<galera_agent_core::Error> for ApiError {
    fn from(err: galera_agent_core::Error) -> Self {
        let status = StatusCode::from_u16(err.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Self::new(status, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use galera_agent_core::Error;

    #[test]
    fn test_core_error_status() {
        let cases = [
            (Error::validation("clusterUUID must not be empty"), 400),
            (Error::NotFound("bootstrap config".into()), 404),
            (Error::PreconditionFailed("no cluster state".into()), 412),
            (Error::RecoveryTimedOut { retries: 10 }, 500),
            (Error::ProcessNotFound("mariadbd".into()), 500),
            (Error::format("invalid seqno"), 500),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status.as_u16(), status);
        }
    }

    #[tokio::test]
    async fn test_error_body() {
        let response = ApiError::from(Error::NotFound("bootstrap config".into())).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body, serde_json::json!({"message": "bootstrap config not found"}));
    }
}
