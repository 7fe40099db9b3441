//! Error handling for the PVS6 logger.

/// A specialized `Result` type for PVS6 logger operations.
pub type Result<T> = std::result::Result<T, PvsError>;

/// Failures of the two-step login handshake with the PVS.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The serial number could not be read and no default was configured
    #[error("no serial number available and no default serial configured")]
    NoSerial,

    /// The login endpoint answered with a non-200 status
    #[error("login rejected with status {status}")]
    Rejected { status: u16 },

    /// The login response did not carry a `session` field
    #[error("login response did not contain a session token")]
    MissingSession,

    /// The request never produced a response
    #[error("network error during authentication: {0}")]
    Network(String),

    /// The response body could not be decoded
    #[error("invalid authentication response: {0}")]
    InvalidResponse(String),
}

/// A line that failed the syntax check, with its 1-based position in the batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidLine {
    pub position: usize,
    pub line: String,
}

/// The main error type for a collection cycle.
#[derive(Debug, thiserror::Error)]
pub enum PvsError {
    /// Authentication against the PVS failed
    #[error("authentication failed: {0}")]
    Auth(#[from] AuthError),

    /// The variable snapshot could not be retrieved
    #[error("failed to fetch snapshot: {0}")]
    Fetch(String),

    /// One or more generated lines failed validation; nothing was sent
    #[error("{} invalid line(s) in batch, write aborted", invalid.len())]
    Validation { invalid: Vec<InvalidLine> },

    /// Writing to InfluxDB failed
    #[error("InfluxDB write failed: {message}")]
    Sink {
        status: Option<u16>,
        message: String,
    },

    /// A sink self-test step failed
    #[error("diagnostic failed: {0}")]
    Diagnostic(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

impl PvsError {
    /// Create a new fetch error
    pub fn fetch_error(msg: impl Into<String>) -> Self {
        Self::Fetch(msg.into())
    }

    /// Create a sink error from a transport failure (no HTTP status)
    pub fn sink_error(msg: impl Into<String>) -> Self {
        Self::Sink {
            status: None,
            message: msg.into(),
        }
    }

    /// Create a sink error from an HTTP error response
    pub fn sink_status(status: u16, body: impl Into<String>) -> Self {
        Self::Sink {
            status: Some(status),
            message: format!("status {}: {}", status, body.into()),
        }
    }

    /// Create a new diagnostic error
    pub fn diagnostic_error(msg: impl Into<String>) -> Self {
        Self::Diagnostic(msg.into())
    }

    /// Create a new configuration error
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_counts_lines() {
        let err = PvsError::Validation {
            invalid: vec![
                InvalidLine {
                    position: 1,
                    line: "bad".to_string(),
                },
                InvalidLine {
                    position: 3,
                    line: "".to_string(),
                },
            ],
        };
        assert_eq!(err.to_string(), "2 invalid line(s) in batch, write aborted");
    }

    #[test]
    fn test_auth_error_converts() {
        let err: PvsError = AuthError::Rejected { status: 401 }.into();
        assert!(matches!(err, PvsError::Auth(AuthError::Rejected { status: 401 })));
        assert_eq!(
            err.to_string(),
            "authentication failed: login rejected with status 401"
        );
    }

    #[test]
    fn test_sink_status_message() {
        let err = PvsError::sink_status(400, "unable to parse");
        match err {
            PvsError::Sink { status, message } => {
                assert_eq!(status, Some(400));
                assert_eq!(message, "status 400: unable to parse");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
