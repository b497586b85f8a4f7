//! Agent wiring
//!
//! All orchestrators of one agent share a single [`ExclusionGate`]; building
//! them through [`Agent`] guarantees that.

use crate::bootstrap::Bootstrap;
use crate::config::{RecoveryOptions, ReloadOptions};
use crate::filemanager::StateStore;
use crate::galera::{PositionParser, WsrepPositionParser};
use crate::gate::ExclusionGate;
use crate::mariadbd::Reloader;
use crate::recovery::Recovery;
use crate::state_reader::StateReader;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Retry policies for every orchestrator
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentOptions {
    pub bootstrap_reload: ReloadOptions,
    pub recovery_reload: ReloadOptions,
    pub recovery: RecoveryOptions,
}

impl Default for AgentOptions {
    fn default() -> Self {
        Self {
            bootstrap_reload: ReloadOptions::bootstrap(),
            recovery_reload: ReloadOptions::recovery(),
            recovery: RecoveryOptions::default(),
        }
    }
}

/// The agent's orchestrators over one store, one reloader and one gate
pub struct Agent {
    pub bootstrap: Bootstrap,
    pub recovery: Recovery,
    pub state: StateReader,
}

impl Agent {
    /// Wire an agent with the MariaDB recovery log parser
    #[must_use]
    pub fn new(
        store: Arc<dyn StateStore>,
        reloader: Arc<dyn Reloader>,
        options: AgentOptions,
    ) -> Self {
        Self::with_parser(store, reloader, Arc::new(WsrepPositionParser::new()), options)
    }

    #[must_use]
    pub fn with_parser(
        store: Arc<dyn StateStore>,
        reloader: Arc<dyn Reloader>,
        parser: Arc<dyn PositionParser>,
        options: AgentOptions,
    ) -> Self {
        let gate = ExclusionGate::new();
        Self {
            bootstrap: Bootstrap::new(store.clone(), reloader.clone(), gate.clone())
                .with_reload_options(options.bootstrap_reload),
            recovery: Recovery::new(store.clone(), reloader, parser, gate.clone())
                .with_reload_options(options.recovery_reload)
                .with_recovery_options(options.recovery),
            state: StateReader::new(store, gate),
        }
    }
}
