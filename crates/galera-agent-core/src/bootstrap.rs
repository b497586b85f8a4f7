//! Bootstrap orchestration
//!
//! Enabling bootstrap marks this node as the safe seed of a new cluster:
//! `grastate.dat` gets the seed position and `safe_to_bootstrap: 1`, the
//! bootstrap directive is installed and the engine is restarted to pick it
//! up.

use crate::config::ReloadOptions;
use crate::error::{Error, Result};
use crate::filemanager::{StateStore, ignore_not_found};
use crate::galera::{
    BOOTSTRAP_FILE, BOOTSTRAP_FILE_NAME, BootstrapSeed, ClusterStateRecord,
    GALERA_STATE_FILE_NAME, RECOVERY_FILE_NAME,
};
use crate::gate::ExclusionGate;
use crate::mariadbd::{Reloader, reload_with_retry};
use std::sync::Arc;
use tracing::{debug, info};

pub struct Bootstrap {
    store: Arc<dyn StateStore>,
    reloader: Arc<dyn Reloader>,
    gate: ExclusionGate,
    reload_options: ReloadOptions,
}

impl Bootstrap {
    #[must_use]
    pub fn new(
        store: Arc<dyn StateStore>,
        reloader: Arc<dyn Reloader>,
        gate: ExclusionGate,
    ) -> Self {
        Self {
            store,
            reloader,
            gate,
            reload_options: ReloadOptions::bootstrap(),
        }
    }

    #[must_use]
    pub fn with_reload_options(mut self, options: ReloadOptions) -> Self {
        self.reload_options = options;
        self
    }

    /// Make this node the bootstrap seed.
    ///
    /// The seed is validated and the cluster state is read before anything
    /// is written. A failed reload is returned, but the state and directive
    /// changes are kept: calling `enable` again converges.
    ///
    /// # Errors
    /// - [`Error::Validation`] for a malformed seed
    /// - [`Error::PreconditionFailed`] when there is no `grastate.dat`
    /// - [`Error::Format`] when `grastate.dat` is corrupt
    /// - I/O and reload errors
    pub async fn enable(&self, seed: &BootstrapSeed) -> Result<()> {
        seed.validate()?;

        let _guard = self.gate.exclusive().await;
        debug!(
            cluster_uuid = %seed.cluster_uuid,
            seqno = seed.sequence_number,
            "enabling bootstrap"
        );

        let mut state = self.current_state()?;

        ignore_not_found(self.store.delete_config(RECOVERY_FILE_NAME))?;

        state.cluster_uuid.clone_from(&seed.cluster_uuid);
        state.sequence_number = seed.sequence_number;
        state.safe_to_bootstrap = true;
        self.store
            .write_state(GALERA_STATE_FILE_NAME, &state.encode()?)?;

        self.store
            .write_config(BOOTSTRAP_FILE_NAME, BOOTSTRAP_FILE.as_bytes())?;

        info!("reloading {} process", self.reloader.process_name());
        reload_with_retry(&self.reloader, &self.reload_options).await?;

        info!(
            cluster_uuid = %seed.cluster_uuid,
            seqno = seed.sequence_number,
            "bootstrap enabled"
        );
        Ok(())
    }

    /// Remove the bootstrap directive.
    ///
    /// # Errors
    /// Returns [`Error::NotFound`] if bootstrap was not enabled.
    pub async fn disable(&self) -> Result<()> {
        let _guard = self.gate.exclusive().await;
        debug!("disabling bootstrap");

        self.store
            .delete_config(BOOTSTRAP_FILE_NAME)
            .map_err(|e| {
                if e.is_not_found() {
                    Error::NotFound("bootstrap config".to_string())
                } else {
                    e
                }
            })
    }

    fn current_state(&self) -> Result<ClusterStateRecord> {
        match self.store.read_state(GALERA_STATE_FILE_NAME) {
            Ok(bytes) => ClusterStateRecord::decode(&bytes),
            Err(e) if e.is_not_found() => Err(Error::PreconditionFailed(
                "no cluster state to bootstrap from".to_string(),
            )),
            Err(e) => Err(e),
        }
    }
}
