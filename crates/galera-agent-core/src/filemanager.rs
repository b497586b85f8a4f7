//! Scoped file access to the engine's config and state directories
//!
//! The orchestrators never touch the filesystem directly; they go through a
//! [`StateStore`] so tests can run against [`MemoryStore`].

use crate::error::{Error, Result};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// File access by logical name, scoped to two root directories.
///
/// Missing files are reported as [`Error::NotFound`], any other failure as
/// [`Error::Io`].
pub trait StateStore: Send + Sync {
    /// Read a file from the state directory
    fn read_state(&self, name: &str) -> Result<Vec<u8>>;

    /// Create or replace a file in the state directory
    fn write_state(&self, name: &str, bytes: &[u8]) -> Result<()>;

    /// Delete a file from the state directory
    fn delete_state(&self, name: &str) -> Result<()>;

    /// Read a file from the config directory
    fn read_config(&self, name: &str) -> Result<Vec<u8>>;

    /// Create or replace a file in the config directory
    fn write_config(&self, name: &str, bytes: &[u8]) -> Result<()>;

    /// Delete a file from the config directory
    fn delete_config(&self, name: &str) -> Result<()>;
}

/// Treat a missing file as success.
///
/// # Errors
/// Returns every error except [`Error::NotFound`].
pub fn ignore_not_found(result: Result<()>) -> Result<()> {
    match result {
        Err(e) if e.is_not_found() => Ok(()),
        other => other,
    }
}

/// [`StateStore`] backed by the engine's directories on disk
#[derive(Debug, Clone)]
pub struct FileManager {
    config_dir: PathBuf,
    state_dir: PathBuf,
}

impl FileManager {
    /// Create a file manager over existing directories.
    ///
    /// # Errors
    /// Returns [`Error::Io`] if either directory cannot be accessed.
    pub fn new(config_dir: impl Into<PathBuf>, state_dir: impl Into<PathBuf>) -> Result<Self> {
        let config_dir = config_dir.into();
        let state_dir = state_dir.into();
        check_dir(&config_dir, "config")?;
        check_dir(&state_dir, "state")?;
        Ok(Self {
            config_dir,
            state_dir,
        })
    }

    /// Config directory root
    #[must_use]
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// State directory root
    #[must_use]
    pub fn state_dir(&self) -> &Path {
        &self.state_dir
    }
}

fn check_dir(dir: &Path, kind: &str) -> Result<()> {
    let metadata = std::fs::metadata(dir).map_err(|e| {
        Error::Io(std::io::Error::new(
            e.kind(),
            format!("error reading {kind} directory {}: {e}", dir.display()),
        ))
    })?;
    if !metadata.is_dir() {
        return Err(Error::Io(std::io::Error::new(
            ErrorKind::NotADirectory,
            format!("{kind} directory {} is not a directory", dir.display()),
        )));
    }
    Ok(())
}

fn scoped(root: &Path, name: &str) -> Result<PathBuf> {
    // Names are fixed constants today; reject anything that could escape the root.
    if name.is_empty() || name.contains('/') || name == "." || name == ".." {
        return Err(Error::internal(format!("invalid file name: '{name}'")));
    }
    Ok(root.join(name))
}

fn map_io(err: std::io::Error, path: &Path) -> Error {
    if err.kind() == ErrorKind::NotFound {
        Error::NotFound(path.display().to_string())
    } else {
        Error::Io(std::io::Error::new(
            err.kind(),
            format!("{}: {err}", path.display()),
        ))
    }
}

fn read(root: &Path, name: &str) -> Result<Vec<u8>> {
    let path = scoped(root, name)?;
    std::fs::read(&path).map_err(|e| map_io(e, &path))
}

fn write(root: &Path, name: &str, bytes: &[u8]) -> Result<()> {
    let path = scoped(root, name)?;
    std::fs::write(&path, bytes).map_err(|e| map_io(e, &path))
}

fn delete(root: &Path, name: &str) -> Result<()> {
    let path = scoped(root, name)?;
    std::fs::remove_file(&path).map_err(|e| map_io(e, &path))
}

impl StateStore for FileManager {
    fn read_state(&self, name: &str) -> Result<Vec<u8>> {
        read(&self.state_dir, name)
    }

    fn write_state(&self, name: &str, bytes: &[u8]) -> Result<()> {
        write(&self.state_dir, name, bytes)
    }

    fn delete_state(&self, name: &str) -> Result<()> {
        delete(&self.state_dir, name)
    }

    fn read_config(&self, name: &str) -> Result<Vec<u8>> {
        read(&self.config_dir, name)
    }

    fn write_config(&self, name: &str, bytes: &[u8]) -> Result<()> {
        write(&self.config_dir, name, bytes)
    }

    fn delete_config(&self, name: &str) -> Result<()> {
        delete(&self.config_dir, name)
    }
}

/// In-memory [`StateStore`], used by tests and local experiments
#[derive(Debug, Default)]
pub struct MemoryStore {
    config: RwLock<HashMap<String, Vec<u8>>>,
    state: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a config file exists
    #[must_use]
    pub fn has_config(&self, name: &str) -> bool {
        self.config.read().contains_key(name)
    }

    /// Whether a state file exists
    #[must_use]
    pub fn has_state(&self, name: &str) -> bool {
        self.state.read().contains_key(name)
    }
}

fn mem_read(files: &RwLock<HashMap<String, Vec<u8>>>, name: &str) -> Result<Vec<u8>> {
    files
        .read()
        .get(name)
        .cloned()
        .ok_or_else(|| Error::NotFound(name.to_string()))
}

fn mem_delete(files: &RwLock<HashMap<String, Vec<u8>>>, name: &str) -> Result<()> {
    files
        .write()
        .remove(name)
        .map(|_| ())
        .ok_or_else(|| Error::NotFound(name.to_string()))
}

impl StateStore for MemoryStore {
    fn read_state(&self, name: &str) -> Result<Vec<u8>> {
        mem_read(&self.state, name)
    }

    fn write_state(&self, name: &str, bytes: &[u8]) -> Result<()> {
        self.state.write().insert(name.to_string(), bytes.to_vec());
        Ok(())
    }

    fn delete_state(&self, name: &str) -> Result<()> {
        mem_delete(&self.state, name)
    }

    fn read_config(&self, name: &str) -> Result<Vec<u8>> {
        mem_read(&self.config, name)
    }

    fn write_config(&self, name: &str, bytes: &[u8]) -> Result<()> {
        self.config.write().insert(name.to_string(), bytes.to_vec());
        Ok(())
    }

    fn delete_config(&self, name: &str) -> Result<()> {
        mem_delete(&self.config, name)
    }
}
