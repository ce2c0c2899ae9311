use axum::{
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::config::ConfigError;

/// Outcome kinds of a storage-root operation. The file store folds these
/// into absent/boolean results before anything reaches a user.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("File not found")]
    NotFound,
    #[error("File already exists")]
    AlreadyExists,
    #[error("Invalid file name: {0:?}")]
    InvalidName(String),
    #[error("Storage root is not a directory")]
    NotADirectory,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    pub(crate) fn from_io(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => StoreError::NotFound,
            std::io::ErrorKind::AlreadyExists => StoreError::AlreadyExists,
            _ => StoreError::Io(err),
        }
    }
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("File not available")]
    FileUnavailable,
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::FileUnavailable => (
                StatusCode::BAD_REQUEST,
                [(header::CONTENT_DISPOSITION, "")],
            )
                .into_response(),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
        }
    }
}

#[derive(Error, Debug)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("could not initialize the file storage at {path}: {source}")]
    Storage {
        path: String,
        #[source]
        source: StoreError,
    },
    #[error("could not bind {addr}: {source}")]
    Bind {
        addr: std::net::SocketAddr,
        #[source]
        source: std::io::Error,
    },
    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_kinds_map_to_store_errors() {
        let not_found = std::io::Error::from(std::io::ErrorKind::NotFound);
        assert!(matches!(StoreError::from_io(not_found), StoreError::NotFound));

        let exists = std::io::Error::from(std::io::ErrorKind::AlreadyExists);
        assert!(matches!(StoreError::from_io(exists), StoreError::AlreadyExists));

        let denied = std::io::Error::from(std::io::ErrorKind::PermissionDenied);
        assert!(matches!(StoreError::from_io(denied), StoreError::Io(_)));
    }

    #[test]
    fn unavailable_file_is_a_bare_bad_request() {
        let response = ApiError::FileUnavailable.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers().get(header::CONTENT_DISPOSITION).unwrap(),
            ""
        );
    }
}
