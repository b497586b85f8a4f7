//! Read-only access to the persisted cluster state

use crate::error::Result;
use crate::filemanager::StateStore;
use crate::galera::{ClusterStateRecord, GALERA_STATE_FILE_NAME};
use crate::gate::ExclusionGate;
use std::sync::Arc;
use tracing::debug;

pub struct StateReader {
    store: Arc<dyn StateStore>,
    gate: ExclusionGate,
}

impl StateReader {
    #[must_use]
    pub fn new(store: Arc<dyn StateStore>, gate: ExclusionGate) -> Self {
        Self { store, gate }
    }

    /// Read `grastate.dat` under the shared gate.
    ///
    /// Readers run concurrently with each other but never overlap a
    /// bootstrap or recovery in progress.
    ///
    /// # Errors
    /// Returns [`crate::Error::NotFound`] when the file is absent and
    /// [`crate::Error::Format`] when it cannot be decoded.
    pub async fn get(&self) -> Result<ClusterStateRecord> {
        let _guard = self.gate.shared().await;
        debug!("reading galera state");

        let bytes = self.store.read_state(GALERA_STATE_FILE_NAME)?;
        ClusterStateRecord::decode(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::filemanager::MemoryStore;

    #[tokio::test]
    async fn test_get() {
        let store = Arc::new(MemoryStore::new());
        let reader = StateReader::new(store.clone(), ExclusionGate::new());

        assert!(reader.get().await.unwrap_err().is_not_found());

        store
            .write_state(
                GALERA_STATE_FILE_NAME,
                b"# GALERA saved state\nversion: 2.1\nuuid: abc\nseqno: 5\nsafe_to_bootstrap: 1\n",
            )
            .unwrap();
        let record = reader.get().await.unwrap();
        assert_eq!(record.cluster_uuid, "abc");
        assert_eq!(record.sequence_number, 5);
        assert!(record.safe_to_bootstrap);
    }

    #[tokio::test]
    async fn test_get_corrupt() {
        let store = Arc::new(MemoryStore::new());
        store
            .write_state(GALERA_STATE_FILE_NAME, b"version: 2.1\nseqno: five\n")
            .unwrap();

        let err = StateReader::new(store, ExclusionGate::new())
            .get()
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Format(_)));
    }

    #[tokio::test]
    async fn test_get_waits_for_exclusive_section() {
        let store = Arc::new(MemoryStore::new());
        let gate = ExclusionGate::new();
        let reader = Arc::new(StateReader::new(store.clone(), gate.clone()));

        let guard = gate.exclusive().await;
        let pending = tokio::spawn({
            let reader = reader.clone();
            async move { reader.get().await }
        });
        tokio::task::yield_now().await;

        // Written while the reader is blocked: it must see the result only
        store
            .write_state(
                GALERA_STATE_FILE_NAME,
                b"version: 2.1\nuuid: abc\nseqno: 5\nsafe_to_bootstrap: 1\n",
            )
            .unwrap();
        assert!(!pending.is_finished());
        drop(guard);

        let record = pending.await.unwrap().unwrap();
        assert_eq!(record.sequence_number, 5);
    }
}
