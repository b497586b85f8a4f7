//! Galera Agent Core - bootstrap and recovery of a Galera node
//!
//! This crate holds everything the agent does to a MariaDB Galera node:
//! the `grastate.dat` codec, scoped access to the engine's config and state
//! directories, engine reload, and the bootstrap and recovery orchestrators
//! that tie them together under one exclusion gate.
//!
//! With `default-features = false` only the wire types, options and the
//! `grastate.dat` codec are built, for API clients.

pub mod config;
pub mod error;
pub mod galera;

#[cfg(feature = "agent")]
pub mod agent;
#[cfg(feature = "agent")]
pub mod bootstrap;
#[cfg(feature = "agent")]
pub mod filemanager;
#[cfg(feature = "agent")]
pub mod gate;
#[cfg(feature = "agent")]
pub mod mariadbd;
#[cfg(feature = "agent")]
pub mod recovery;
#[cfg(feature = "agent")]
pub mod state_reader;

pub use config::{RecoveryOptions, ReloadOptions};
pub use error::{Error, Result};
pub use galera::{BootstrapSeed, ClusterStateRecord, Gtid, RecoveredPosition};

#[cfg(feature = "agent")]
pub use agent::{Agent, AgentOptions};
#[cfg(feature = "agent")]
pub use bootstrap::Bootstrap;
#[cfg(feature = "agent")]
pub use filemanager::{FileManager, MemoryStore, StateStore};
#[cfg(feature = "agent")]
pub use gate::ExclusionGate;
#[cfg(feature = "agent")]
pub use mariadbd::{ProcessReloader, Reloader};
#[cfg(feature = "agent")]
pub use recovery::Recovery;
#[cfg(feature = "agent")]
pub use state_reader::StateReader;
