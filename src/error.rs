//! Delivery error types

use hyper::header::HeaderMap;
use hyper::StatusCode;
use std::io;
use thiserror::Error;

/// Failures that end the delivery of a resource before its body starts
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("invalid range")]
    MalformedRange,

    #[error("invalid range: failed to overlap")]
    UnsatisfiableRange { size: u64 },

    #[error("not found: {0}")]
    NotFound(#[source] io::Error),

    #[error("permission denied: {0}")]
    PermissionDenied(#[source] io::Error),

    #[error("size mismatch: resource declares {declared} bytes but source holds {actual}")]
    SizeMismatch { declared: u64, actual: u64 },

    #[error("i/o error: {0}")]
    Io(#[source] io::Error),
}

impl DeliveryError {
    /// Status code the error is rendered with
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::MalformedRange | Self::UnsatisfiableRange { .. } => {
                StatusCode::RANGE_NOT_SATISFIABLE
            }
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::PermissionDenied(_) => StatusCode::FORBIDDEN,
            Self::SizeMismatch { .. } | Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<io::Error> for DeliveryError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound(err),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(err),
            _ => Self::Io(err),
        }
    }
}

/// A delivery failure together with the response headers set before it happened
///
/// The headers (`Last-Modified`, `Content-Range: bytes */size`, ...) belong on the rendered
/// error response.
#[derive(Debug)]
pub struct ServeError {
    pub error: DeliveryError,
    pub headers: HeaderMap,
}

impl ServeError {
    pub const fn new(error: DeliveryError, headers: HeaderMap) -> Self {
        Self { error, headers }
    }

    pub const fn status(&self) -> StatusCode {
        self.error.status()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_mapping() {
        let cases = [
            (io::ErrorKind::NotFound, StatusCode::NOT_FOUND),
            (io::ErrorKind::PermissionDenied, StatusCode::FORBIDDEN),
            (io::ErrorKind::Other, StatusCode::INTERNAL_SERVER_ERROR),
            (io::ErrorKind::UnexpectedEof, StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (kind, status) in cases {
            assert_eq!(DeliveryError::from(io::Error::from(kind)).status(), status);
        }
    }

    #[test]
    fn test_range_errors() {
        assert_eq!(
            DeliveryError::MalformedRange.status(),
            StatusCode::RANGE_NOT_SATISFIABLE
        );
        let err = DeliveryError::UnsatisfiableRange { size: 10 };
        assert_eq!(err.status(), StatusCode::RANGE_NOT_SATISFIABLE);
        assert_eq!(err.to_string(), "invalid range: failed to overlap");
    }
}
