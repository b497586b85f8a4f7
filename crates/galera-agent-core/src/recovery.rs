//! Recovery orchestration
//!
//! Starting the engine with `wsrep_recover=ON` makes it write its last
//! durable position to the error log and exit. The orchestrator installs the
//! recovery directive, restarts the engine, polls the log for the position
//! and removes the directive again so the next start is a normal one.

use crate::config::{RecoveryOptions, ReloadOptions};
use crate::error::{Error, Result};
use crate::filemanager::{StateStore, ignore_not_found};
use crate::galera::{
    BOOTSTRAP_FILE_NAME, PositionParser, RECOVERY_FILE, RECOVERY_FILE_NAME,
    RECOVERY_LOG_FILE_NAME, RecoveredPosition,
};
use crate::gate::ExclusionGate;
use crate::mariadbd::{Reloader, reload_with_retry};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub struct Recovery {
    store: Arc<dyn StateStore>,
    reloader: Arc<dyn Reloader>,
    parser: Arc<dyn PositionParser>,
    gate: ExclusionGate,
    reload_options: ReloadOptions,
    recovery_options: RecoveryOptions,
}

impl Recovery {
    #[must_use]
    pub fn new(
        store: Arc<dyn StateStore>,
        reloader: Arc<dyn Reloader>,
        parser: Arc<dyn PositionParser>,
        gate: ExclusionGate,
    ) -> Self {
        Self {
            store,
            reloader,
            parser,
            gate,
            reload_options: ReloadOptions::recovery(),
            recovery_options: RecoveryOptions::default(),
        }
    }

    #[must_use]
    pub fn with_reload_options(mut self, options: ReloadOptions) -> Self {
        self.reload_options = options;
        self
    }

    #[must_use]
    pub fn with_recovery_options(mut self, options: RecoveryOptions) -> Self {
        self.recovery_options = options;
        self
    }

    /// Run the engine in recovery mode and return the position it reports.
    ///
    /// A failed reload is only logged: the engine may already be restarting
    /// on its own, and polling decides the outcome. The recovery directive is
    /// removed whatever the poll outcome.
    ///
    /// # Errors
    /// - [`Error::RecoveryTimedOut`] when no position shows up in time
    /// - [`Error::Format`] when the logged position is malformed
    /// - I/O errors from preparing or cleaning up directive files
    pub async fn start(&self) -> Result<RecoveredPosition> {
        let _guard = self.gate.exclusive().await;
        debug!("starting recovery");

        ignore_not_found(self.store.delete_config(BOOTSTRAP_FILE_NAME))?;
        ignore_not_found(self.store.delete_state(RECOVERY_LOG_FILE_NAME))?;
        self.store
            .write_config(RECOVERY_FILE_NAME, RECOVERY_FILE.as_bytes())?;

        info!("reloading {} process", self.reloader.process_name());
        if let Err(e) = reload_with_retry(&self.reloader, &self.reload_options).await {
            error!("error reloading {} process: {e}", self.reloader.process_name());
        }

        let recovered = self.poll_position().await;
        let cleanup = ignore_not_found(self.store.delete_config(RECOVERY_FILE_NAME));

        match (recovered, cleanup) {
            (Ok(position), Ok(())) => {
                info!(
                    cluster_uuid = %position.cluster_uuid,
                    seqno = position.sequence_number,
                    "recovered galera position"
                );
                Ok(position)
            }
            (Err(e), Ok(())) | (Ok(_), Err(e)) => Err(e),
            (Err(e), Err(cleanup_err)) => {
                error!("error deleting recovery config: {cleanup_err}");
                Err(e)
            }
        }
    }

    /// Remove the recovery directive without restarting the engine.
    ///
    /// # Errors
    /// Returns [`Error::NotFound`] if recovery was not started.
    pub async fn stop(&self) -> Result<()> {
        let _guard = self.gate.exclusive().await;
        debug!("stopping recovery");

        self.store.delete_config(RECOVERY_FILE_NAME).map_err(|e| {
            if e.is_not_found() {
                Error::NotFound("recovery config".to_string())
            } else {
                e
            }
        })
    }

    async fn poll_position(&self) -> Result<RecoveredPosition> {
        let max_retries = self.recovery_options.retries;
        for retry in 1..=max_retries {
            tokio::time::sleep(self.recovery_options.wait).await;

            let log = match self.store.read_state(RECOVERY_LOG_FILE_NAME) {
                Ok(log) => log,
                Err(e) => {
                    warn!(retry, max_retries, "error reading recovery log: {e}");
                    continue;
                }
            };

            match self.parser.parse(&log)? {
                Some(position) => return Ok(position),
                None => debug!(retry, max_retries, "recovery log has no position yet"),
            }
        }
        Err(Error::RecoveryTimedOut {
            retries: max_retries,
        })
    }
}
