//! Persistence for the single saved game state. There is exactly one save
//! slot: every successful save replaces the whole file.

mod file;

use std::path::PathBuf;

use thiserror::Error;

pub use file::StateFile;

/// Errors encountered while reading or writing the saved game state.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Could not write game state to {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Could not read game state from {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
}
