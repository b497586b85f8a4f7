//! Galera Agent - HTTP API of the sidecar running next to a MariaDB Galera node
//!
//! The operator calls this API to read the node's cluster state, recover its
//! last durable position and choose the node that bootstraps the cluster.

pub mod api_error;
pub mod auth_middleware;
pub mod handlers;
pub mod router;

pub use api_error::{ApiError, ErrorBody};
pub use auth_middleware::{KubernetesTokenVerifier, TokenVerifier, TrustedServiceAccount};
pub use handlers::AppState;
pub use router::{RouterOptions, router};
