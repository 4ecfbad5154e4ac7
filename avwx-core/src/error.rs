use std::io;

use thiserror::Error;

/// The core result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong while resolving an airport or fetching
/// weather for it.
///
/// Provider failures are split three ways so callers can tell a slow
/// provider (`Timeout`) from an unreachable one (`Network`) from one that
/// answered with garbage (`BadResponse`).
#[derive(Debug, Error)]
pub enum Error {
    #[error("no airport matches '{0}'")]
    NotFound(String),

    #[error("invalid airport record: {0}")]
    InvalidRecord(String),

    #[error("provider request timed out after {0} seconds")]
    Timeout(u64),

    #[error("network error: {0}")]
    Network(String),

    #[error("unexpected provider response: {0}")]
    BadResponse(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },
}

impl Error {
    /// Wrap an I/O error with a short description of what was being done.
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        Error::Io { context: context.into(), source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_and_network_are_distinct() {
        let timeout = Error::Timeout(10);
        let network = Error::Network("connection refused".to_string());
        assert!(matches!(timeout, Error::Timeout(10)));
        assert!(matches!(network, Error::Network(_)));
        assert!(timeout.to_string().contains("timed out"));
        assert!(network.to_string().contains("connection refused"));
    }

    #[test]
    fn io_error_keeps_context() {
        let err = Error::io("reading airports.json", io::Error::new(io::ErrorKind::NotFound, "gone"));
        assert!(err.to_string().contains("reading airports.json"));
    }
}
