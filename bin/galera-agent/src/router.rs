//! Router and middleware stack

use crate::api_error::ApiError;
use crate::auth_middleware::{TokenVerifier, auth_layer};
use crate::handlers::{self, AppState};
use axum::{
    Router,
    body::Body,
    error_handling::HandleErrorLayer,
    http::Request,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, put},
};
use std::any::Any;
use std::sync::Arc;
use std::time::Duration;
use tower::{BoxError, ServiceBuilder};
use tower::buffer::BufferLayer;
use tower::limit::RateLimitLayer;
use tower::load_shed::LoadShedLayer;
use tower::load_shed::error::Overloaded;
use tower_http::CompressionLevel;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

/// Requests queued in front of the rate limiter before load shedding
const RATE_LIMIT_BUFFER: usize = 1024;

/// Router configuration
#[derive(Clone)]
pub struct RouterOptions {
    /// Response compression level
    pub compress_level: i32,
    /// Allow this many API requests per period, across all callers
    pub rate_limit: Option<(u64, Duration)>,
    /// Require a verified bearer token on API routes
    pub auth: Option<Arc<dyn TokenVerifier>>,
}

impl Default for RouterOptions {
    fn default() -> Self {
        Self {
            compress_level: 5,
            rate_limit: None,
            auth: None,
        }
    }
}

impl RouterOptions {
    #[must_use]
    pub const fn with_compress_level(mut self, level: i32) -> Self {
        self.compress_level = level;
        self
    }

    /// Enable rate limiting; a zero count or period leaves it disabled
    #[must_use]
    pub fn with_rate_limit(mut self, requests: u64, per: Duration) -> Self {
        self.rate_limit = (requests > 0 && !per.is_zero()).then_some((requests, per));
        self
    }

    #[must_use]
    pub fn with_auth(mut self, verifier: Arc<dyn TokenVerifier>) -> Self {
        self.auth = Some(verifier);
        self
    }
}

/// Build the agent router.
///
/// `/health` is served outside `/api` and bypasses auth and rate limiting.
#[must_use]
pub fn router(agent: AppState, options: RouterOptions) -> Router {
    let mut api = Router::new()
        .route(
            "/bootstrap",
            put(handlers::enable_bootstrap).delete(handlers::disable_bootstrap),
        )
        .route("/galerastate", get(handlers::get_galera_state))
        .route(
            "/recovery",
            put(handlers::start_recovery).delete(handlers::stop_recovery),
        )
        .with_state(agent);

    if let Some(verifier) = options.auth {
        api = api.layer(middleware::from_fn_with_state(verifier, auth_layer));
    }
    let api = api.layer(TraceLayer::new_for_http().make_span_with(request_span));

    let app = match options.rate_limit {
        Some((requests, per)) => {
            // One limiter for the whole API, not one per route
            let limited = ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle_overload))
                .layer(BufferLayer::new(RATE_LIMIT_BUFFER))
                .layer(LoadShedLayer::new())
                .layer(RateLimitLayer::new(requests, per))
                .service(api);
            Router::new().nest_service("/api", limited)
        }
        None => Router::new().nest("/api", api),
    };

    app.route("/health", get(handlers::health))
        .layer(CompressionLayer::new().quality(CompressionLevel::Precise(options.compress_level)))
        .layer(CatchPanicLayer::custom(panic_response))
}

fn request_span(request: &Request<Body>) -> tracing::Span {
    tracing::info_span!(
        "request",
        method = %request.method(),
        uri = %request.uri(),
        caller = tracing::field::Empty,
    )
}

async fn handle_overload(err: BoxError) -> ApiError {
    if err.is::<Overloaded>() {
        ApiError::too_many_requests()
    } else {
        ApiError::internal(format!("unhandled middleware error: {err}"))
    }
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    ApiError::internal(format!("handler panicked: {detail}")).into_response()
}
