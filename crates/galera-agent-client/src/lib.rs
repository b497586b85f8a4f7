//! Typed client for the Galera agent API.
//!
//! An operator talks to the agent running next to each MariaDB Galera node
//! to inspect its cluster state, recover its last position and pick the
//! bootstrap seed.
//!
//! ```no_run
//! use galera_agent_client::{Client, ClientError};
//!
//! # async fn example() -> Result<(), ClientError> {
//! let client = Client::new("http://localhost:5555")?.with_token("sa-token");
//!
//! match client.bootstrap().disable().await {
//!     Ok(()) => println!("bootstrap disabled"),
//!     Err(e) if e.is_not_found() => println!("bootstrap was not enabled"),
//!     Err(e) => return Err(e),
//! }
//! # Ok(())
//! # }
//! ```

mod bootstrap;
mod client;
mod error;
mod galera_state;
mod recovery;

pub use bootstrap::BootstrapApi;
pub use client::Client;
pub use error::{ClientError, Result};
pub use galera_agent_core::{BootstrapSeed, ClusterStateRecord, Gtid, RecoveredPosition};
pub use galera_state::GaleraStateApi;
pub use recovery::RecoveryApi;
