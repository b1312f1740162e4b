//! Unified error types for sitewatch.
//!
//! Display strings carry a stable code prefix so log lines and API
//! responses can be grepped by failure class.

use tokio_rusqlite::rusqlite;

/// Unified error type shared by the store, the coordinator and the routes.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A record with this URL already exists.
    #[error("CONFLICT: domain already exists: {0}")]
    Conflict(String),

    /// No record for the given URL.
    #[error("NOT_FOUND: {0}")]
    NotFound(String),

    /// Database operation failed.
    #[error("STORE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("STORE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// An upstream site could not be reached at all.
    #[error("UNREACHABLE: {0}")]
    Unreachable(String),

    /// An upstream site answered with a non-success status.
    #[error("UPSTREAM_HTTP: {status} {status_text}")]
    Upstream { status: u16, status_text: String },
}

impl Error {
    /// Upstream status carried by this error, if any.
    pub fn upstream_status(&self) -> Option<(u16, &str)> {
        match self {
            Error::Upstream { status, status_text } => Some((*status, status_text.as_str())),
            _ => None,
        }
    }
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::Conflict("https://example.com/".to_string());
        assert!(err.to_string().starts_with("CONFLICT"));
        assert!(err.to_string().contains("https://example.com/"));
    }

    #[test]
    fn test_upstream_status() {
        let err = Error::Upstream { status: 503, status_text: "Service Unavailable".into() };
        assert_eq!(err.upstream_status(), Some((503, "Service Unavailable")));
        assert_eq!(err.to_string(), "UPSTREAM_HTTP: 503 Service Unavailable");

        let err = Error::NotFound("x".into());
        assert!(err.upstream_status().is_none());
    }

    #[test]
    fn test_rusqlite_error_maps_to_database() {
        let err: Error = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(matches!(err, Error::Database(_)));
        assert!(err.to_string().starts_with("STORE_ERROR"));
    }
}
