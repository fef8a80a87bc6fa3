use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum AppError {
    /// Unknown ticker, missing file, or empty provider result
    #[error("{0}")]
    NotFound(String),

    /// Bad calendar date or past-date prediction request
    #[error("{0}")]
    InvalidInput(String),

    /// Provider failure surfaced directly to the caller
    #[error("{0}")]
    Upstream(String),

    #[error("IO error: {0}")]
    Io(String),

    /// Model invocation failure or any unexpected error
    #[error("{0}")]
    Internal(String),
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err.to_string())
    }
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidInput(_) | AppError::Upstream(_) => StatusCode::BAD_REQUEST,
            AppError::Io(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Every failure is a JSON body with a human-readable message
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(serde_json::json!({ "detail": self.to_string() }));
        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
