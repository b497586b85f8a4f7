//! HTTP handlers for the agent API.
//!
//! Orchestrator calls run in their own task. A client that disconnects
//! drops the handler future, but an exclusive section that has started
//! still runs to the end and releases the gate.

use crate::api_error::{ApiError, Result};
use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use galera_agent_core::{Agent, BootstrapSeed, ClusterStateRecord, RecoveredPosition};
use std::future::Future;
use std::sync::Arc;

/// Shared handler state
pub type AppState = Arc<Agent>;

async fn detached<T, F>(op: F) -> Result<T>
where
    T: Send + 'static,
    F: Future<Output = galera_agent_core::Result<T>> + Send + 'static,
{
    tokio::spawn(op)
        .await
        .map_err(|e| ApiError::internal(format!("orchestrator task failed: {e}")))?
        .map_err(ApiError::from)
}

/// GET /health
pub async fn health() -> StatusCode {
    StatusCode::OK
}

/// PUT /api/bootstrap
///
/// # Errors
/// 400 for a malformed or invalid seed, 412 when the node has no cluster
/// state, 500 when writing files or reloading the engine fails.
pub async fn enable_bootstrap(
    State(agent): State<AppState>,
    body: std::result::Result<Json<BootstrapSeed>, JsonRejection>,
) -> Result<StatusCode> {
    let Json(seed) = body.map_err(|e| ApiError::bad_request(e.body_text()))?;

    detached(async move { agent.bootstrap.enable(&seed).await }).await?;
    Ok(StatusCode::OK)
}

/// DELETE /api/bootstrap
///
/// # Errors
/// 404 when bootstrap is not enabled.
pub async fn disable_bootstrap(State(agent): State<AppState>) -> Result<StatusCode> {
    detached(async move { agent.bootstrap.disable().await }).await?;
    Ok(StatusCode::OK)
}

/// GET /api/galerastate
///
/// # Errors
/// 404 when `grastate.dat` does not exist, 500 when it cannot be decoded.
pub async fn get_galera_state(State(agent): State<AppState>) -> Result<Json<ClusterStateRecord>> {
    let state = agent.state.get().await?;
    Ok(Json(state))
}

/// PUT /api/recovery
///
/// # Errors
/// 500 when no position could be recovered.
pub async fn start_recovery(State(agent): State<AppState>) -> Result<Json<RecoveredPosition>> {
    let position = detached(async move { agent.recovery.start().await }).await?;
    Ok(Json(position))
}

/// DELETE /api/recovery
///
/// # Errors
/// 404 when recovery is not in progress.
pub async fn stop_recovery(State(agent): State<AppState>) -> Result<StatusCode> {
    detached(async move { agent.recovery.stop().await }).await?;
    Ok(StatusCode::OK)
}
