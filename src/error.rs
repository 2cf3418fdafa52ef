use std::path::PathBuf;

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

/// Errors raised while answering a single request.
///
/// Every variant maps to a status code and a short plain-text body. Bodies never
/// carry filesystem detail: an ignored path and a missing path produce the same
/// response.
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Not found")]
    NotFound,

    #[error("Access denied")]
    PathTraversal,

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::NotFound => StatusCode::NOT_FOUND,
            ServerError::PathTraversal => StatusCode::FORBIDDEN,
            ServerError::InvalidPath(_) => StatusCode::BAD_REQUEST,
            ServerError::Io(_) | ServerError::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn public_message(&self) -> &'static str {
        match self {
            ServerError::NotFound => "Not found",
            ServerError::PathTraversal => "Access denied",
            ServerError::InvalidPath(_) => "Bad request",
            ServerError::Io(_) | ServerError::Task(_) => "Internal server error",
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }

        (
            status,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            self.public_message(),
        )
            .into_response()
    }
}

/// Errors that stop the server before it binds a socket.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Root directory does not exist: {}", .0.display())]
    RootNotFound(PathBuf),

    #[error("Root path is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("Failed to read settings file {}: {source}", path.display())]
    ReadSettings {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid settings file {}: {source}", path.display())]
    ParseSettings {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid bind address {0}")]
    InvalidAddress(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ServerError::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(ServerError::PathTraversal.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            ServerError::InvalidPath("%zz".to_string()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServerError::Io(std::io::Error::other("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_io_error_body_does_not_leak_detail() {
        let err = ServerError::Io(std::io::Error::other("/secret/location unreadable"));
        assert_eq!(err.public_message(), "Internal server error");
    }
}
