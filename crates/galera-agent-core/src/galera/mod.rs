//! Galera on-disk formats
//!
//! - `grastate.dat`: the node's persisted cluster state
//! - directive files: config snippets the engine reads at startup
//! - the recovery log the engine writes when started with `wsrep_recover`

pub mod gtid;
pub mod position;
pub mod state;

pub use gtid::Gtid;
pub use position::{BootstrapSeed, PositionParser, RecoveredPosition};
#[cfg(feature = "agent")]
pub use position::WsrepPositionParser;
pub use state::ClusterStateRecord;

/// Cluster state file, in the state directory
pub const GALERA_STATE_FILE_NAME: &str = "grastate.dat";

/// Bootstrap directive, in the config directory
pub const BOOTSTRAP_FILE_NAME: &str = "1-bootstrap.cnf";

/// Recovery directive, in the config directory
pub const RECOVERY_FILE_NAME: &str = "2-recovery.cnf";

/// Log written by the engine in recovery mode, in the state directory.
/// Must match `log_error` in [`RECOVERY_FILE`].
pub const RECOVERY_LOG_FILE_NAME: &str = "mariadb.err";

/// Makes the engine start a new cluster from this node
pub const BOOTSTRAP_FILE: &str = r#"[galera]
wsrep_new_cluster="ON"
"#;

/// Makes the engine log its recovered position and exit
pub const RECOVERY_FILE: &str = r#"[galera]
log_error=mariadb.err
wsrep_recover="ON"
"#;
