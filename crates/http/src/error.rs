use thiserror::Error;

/// The single error value a router catches from a failed handler
/// invocation: an optional status code plus a message, raised before any
/// partial response has been sent.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct HttpError {
    pub status: Option<u16>,
    pub message: String,
}

impl HttpError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
        }
    }

    pub fn with_status(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            message: message.into(),
        }
    }
}

impl From<lariat_core::CoreError> for HttpError {
    fn from(err: lariat_core::CoreError) -> Self {
        HttpError::with_status(500, err.to_string())
    }
}
