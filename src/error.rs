use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{error, warn};

/// Errors surfaced by the pin engine and the services around it.
#[derive(Debug, thiserror::Error)]
pub enum SongPinError {
    #[error("{0}")]
    NotFound(String),

    /// The acting member does not own the entity it tried to change.
    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    InvalidInput(String),

    /// A collaborator (e.g. the token cache) could not be reached.
    #[error("{0}")]
    ExternalDependencyFailure(String),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

pub type SongPinResult<T> = Result<T, SongPinError>;

impl SongPinError {
    pub fn kind(&self) -> &'static str {
        match self {
            SongPinError::NotFound(_) => "NOT_FOUND",
            SongPinError::Unauthorized(_) => "UNAUTHORIZED",
            SongPinError::InvalidInput(_) => "INVALID_INPUT",
            SongPinError::ExternalDependencyFailure(_) => "EXTERNAL_DEPENDENCY_FAILURE",
            SongPinError::Store(_) => "INTERNAL",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            SongPinError::NotFound(_) => StatusCode::NOT_FOUND,
            SongPinError::Unauthorized(_) => StatusCode::FORBIDDEN,
            SongPinError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            SongPinError::ExternalDependencyFailure(_) => StatusCode::SERVICE_UNAVAILABLE,
            SongPinError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<rusqlite::Error> for SongPinError {
    fn from(err: rusqlite::Error) -> Self {
        SongPinError::Store(err.into())
    }
}

impl IntoResponse for SongPinError {
    fn into_response(self) -> Response {
        let message = match &self {
            SongPinError::Store(err) => {
                error!("Store failure: {:#}", err);
                "Internal server error".to_string()
            }
            SongPinError::ExternalDependencyFailure(msg) => {
                warn!("External dependency failure: {}", msg);
                msg.clone()
            }
            other => other.to_string(),
        };
        let body = json!({ "error": self.kind(), "message": message });
        (self.status_code(), Json(body)).into_response()
    }
}
