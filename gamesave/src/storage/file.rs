use std::ffi::{OsStr, OsString};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::sync::Mutex;

use super::StorageError;
use crate::config::StorageConfiguration;

/// The on-disk save slot.
///
/// Saves are written to a staging file beside the target and renamed over
/// it, so a reader only ever sees a complete save. Writers are serialized
/// so two saves cannot share the staging file; whichever save takes the
/// lock last is what stays on disk.
pub struct StateFile {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl StateFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn from_config(config: &StorageConfiguration) -> Self {
        Self::new(config.state_file.clone())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the saved state with `state`. On error the previous save, if
    /// any, is left as it was.
    pub async fn persist(&self, state: &str) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;
        let staging = self.staging_path();

        if let Err(source) = fs::write(&staging, state.as_bytes()).await {
            // A partial write may have created the file
            let _ = fs::remove_file(&staging).await;
            return Err(StorageError::Write {
                path: staging,
                source,
            });
        }

        if let Err(source) = fs::rename(&staging, &self.path).await {
            let _ = fs::remove_file(&staging).await;
            return Err(StorageError::Write {
                path: self.path.clone(),
                source,
            });
        }

        Ok(())
    }

    /// Read the saved state back. Returns `Ok(None)` if nothing has been
    /// saved yet.
    pub async fn load(&self) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(&self.path).await {
            Ok(state) => Ok(Some(state)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Read {
                path: self.path.clone(),
                source,
            }),
        }
    }

    /// `.<name>.partial` beside the target. The leading dot keeps it out of
    /// static file serving.
    pub(crate) fn staging_path(&self) -> PathBuf {
        let mut name = OsString::from(".");
        name.push(
            self.path
                .file_name()
                .unwrap_or_else(|| OsStr::new("gamestate")),
        );
        name.push(".partial");
        self.path.with_file_name(name)
    }
}
