//! Error types for file serving

use hyper::StatusCode;
use std::io;
use thiserror::Error;

/// Why a file could not be served
#[derive(Error, Debug)]
pub enum ServeError {
    /// Path does not resolve to an existing file or directory
    #[error("not found")]
    NotFound,

    /// Filesystem refused access
    #[error("permission denied")]
    Forbidden,

    /// Any other I/O failure
    #[error("IO error: {0}")]
    Io(#[source] io::Error),
}

impl From<io::Error> for ServeError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound | io::ErrorKind::NotADirectory => Self::NotFound,
            io::ErrorKind::PermissionDenied => Self::Forbidden,
            _ => Self::Io(err),
        }
    }
}

impl ServeError {
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Body text, in the `<code> <reason>` form clients expect
    pub const fn message(&self) -> &'static str {
        match self {
            Self::NotFound => "404 page not found",
            Self::Forbidden => "403 Forbidden",
            Self::Io(_) => "500 Internal Server Error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_mapping() {
        let err = ServeError::from(io::Error::from(io::ErrorKind::NotFound));
        assert!(matches!(err, ServeError::NotFound));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);

        let err = ServeError::from(io::Error::from(io::ErrorKind::PermissionDenied));
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
        assert_eq!(err.message(), "403 Forbidden");

        let err = ServeError::from(io::Error::other("disk on fire"));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "IO error: disk on fire");
    }
}
