//! Process-wide shared/exclusive lock over the engine's files.
//!
//! Bootstrap and recovery mutate directive files and the cluster state, so
//! they run exclusively; state reads run shared and never observe a half
//! applied mutation. One gate is created at startup and cloned into every
//! orchestrator.

use std::sync::Arc;
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Clone, Default)]
pub struct ExclusionGate {
    lock: Arc<RwLock<()>>,
}

impl ExclusionGate {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for the exclusive section
    pub async fn exclusive(&self) -> RwLockWriteGuard<'_, ()> {
        self.lock.write().await
    }

    /// Wait for a shared section
    pub async fn shared(&self) -> RwLockReadGuard<'_, ()> {
        self.lock.read().await
    }
}
