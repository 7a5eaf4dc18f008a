use std::convert::Infallible;
use std::sync::Arc;

use thiserror::Error;
use warp::{http::StatusCode, hyper::body::Bytes, Reply};

use crate::storage::{StateFile, StorageError};

/// Reasons a save request did not result in a write.
#[derive(Debug, Error)]
pub enum SaveError {
    #[error("Payload is not valid UTF-8 text: {0}")]
    NotText(#[from] std::str::Utf8Error),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl SaveError {
    /// The status the client sees. The response body is always empty.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotText(_) => StatusCode::BAD_REQUEST,
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Handles `POST /save`. By the time this runs warp has already enforced the
/// `Content-Length` limit and read exactly that many bytes.
pub async fn handle_save(
    body: Bytes,
    state_file: Arc<StateFile>,
) -> Result<impl Reply, Infallible> {
    let status = match save(&body, &state_file).await {
        Ok(()) => {
            info!(
                "Saved {} bytes of game state to {}",
                body.len(),
                state_file.path().display()
            );
            StatusCode::OK
        }
        Err(e) => {
            error!("Game state was not saved: {e}");
            e.status()
        }
    };

    Ok(warp::reply::with_status(warp::reply(), status))
}

async fn save(body: &[u8], state_file: &StateFile) -> Result<(), SaveError> {
    let state = std::str::from_utf8(body)?;
    state_file.persist(state).await?;
    Ok(())
}
