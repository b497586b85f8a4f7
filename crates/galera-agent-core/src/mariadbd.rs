//! Engine process reload
//!
//! The engine only reads directive files at startup. Reloading means killing
//! the running `mariadbd` and letting the container/process supervisor start
//! it again.

use crate::config::ReloadOptions;
use crate::error::{Error, Result};
use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;
use std::sync::Arc;
use sysinfo::System;
use tracing::{debug, info, warn};

/// Executable name of the engine process
pub const MARIADBD_PROCESS_NAME: &str = "mariadbd";

/// Signal used to make the supervisor restart the engine
pub const RELOAD_SIGNAL: Signal = Signal::SIGKILL;

/// Asks the engine process to restart.
///
/// Implemented for plain closures so tests can script reload outcomes.
pub trait Reloader: Send + Sync {
    /// Make one reload attempt.
    ///
    /// # Errors
    /// Returns [`Error::ProcessNotFound`] when the engine is not running and
    /// [`Error::Signal`] when it could not be signalled.
    fn reload(&self) -> Result<()>;

    /// Name of the process being reloaded, for diagnostics
    fn process_name(&self) -> &str {
        MARIADBD_PROCESS_NAME
    }
}

impl<F> Reloader for F
where
    F: Fn() -> Result<()> + Send + Sync,
{
    fn reload(&self) -> Result<()> {
        self()
    }
}

/// [`Reloader`] that finds the engine in the OS process table and signals it
#[derive(Debug, Clone)]
pub struct ProcessReloader {
    process_name: String,
    signal: Signal,
}

impl ProcessReloader {
    /// Reloader for `mariadbd` using [`RELOAD_SIGNAL`]
    #[must_use]
    pub fn new() -> Self {
        Self {
            process_name: MARIADBD_PROCESS_NAME.to_string(),
            signal: RELOAD_SIGNAL,
        }
    }

    /// Target a different executable name
    #[must_use]
    pub fn with_process_name(mut self, name: impl Into<String>) -> Self {
        self.process_name = name.into();
        self
    }

    fn find_pid(&self) -> Option<u32> {
        let mut system = System::new();
        system.refresh_processes();
        system
            .processes_by_exact_name(&self.process_name)
            .map(|p| p.pid().as_u32())
            .min()
    }
}

impl Default for ProcessReloader {
    fn default() -> Self {
        Self::new()
    }
}

impl Reloader for ProcessReloader {
    fn reload(&self) -> Result<()> {
        let pid = self
            .find_pid()
            .ok_or_else(|| Error::ProcessNotFound(self.process_name.clone()))?;

        let raw_pid = i32::try_from(pid).map_err(|_| Error::Signal {
            process: self.process_name.clone(),
            pid,
            reason: "pid out of range".to_string(),
        })?;
        kill(Pid::from_raw(raw_pid), self.signal).map_err(|errno| Error::Signal {
            process: self.process_name.clone(),
            pid,
            reason: errno.to_string(),
        })?;

        debug!(pid, signal = ?self.signal, "signalled {}", self.process_name);
        Ok(())
    }

    fn process_name(&self) -> &str {
        &self.process_name
    }
}

/// Reload the engine, retrying while its process is absent.
///
/// The engine may be between restarts when the first attempt lands, so
/// [`Error::ProcessNotFound`] is retried up to `opts.retries` attempts with
/// `opts.wait` between them. Any other failure is returned immediately.
///
/// Each attempt runs on the blocking pool: finding the process scans the
/// OS process table.
///
/// # Errors
/// Returns the first non-retryable error, or [`Error::RetriesExhausted`].
pub async fn reload_with_retry(
    reloader: &Arc<dyn Reloader>,
    opts: &ReloadOptions,
) -> Result<()> {
    for attempt in 1..=opts.retries {
        match reload_once(reloader).await {
            Ok(()) => {
                info!(attempt, "{} process reloaded", reloader.process_name());
                return Ok(());
            }
            Err(e) if e.is_retryable() => {
                warn!(
                    retry = attempt,
                    max_retries = opts.retries,
                    "error reloading {} process: {e}",
                    reloader.process_name()
                );
                if attempt < opts.retries {
                    tokio::time::sleep(opts.wait).await;
                }
            }
            Err(e) => return Err(e),
        }
    }
    Err(Error::RetriesExhausted {
        process: reloader.process_name().to_string(),
        retries: opts.retries,
    })
}

async fn reload_once(reloader: &Arc<dyn Reloader>) -> Result<()> {
    let reloader = Arc::clone(reloader);
    tokio::task::spawn_blocking(move || reloader.reload())
        .await
        .map_err(|e| Error::internal(format!("reload task failed: {e}")))?
}
