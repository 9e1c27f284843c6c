//! Error types for the nottif-client crate.

use thiserror::Error;

/// A REST call did not produce a usable 2xx response.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connect, TLS, timeout or body-read failure.
    #[error("request to {path} failed: {source}")]
    Transport {
        path: String,
        #[source]
        source: reqwest::Error,
    },

    /// The backend answered with a non-2xx status. `message` carries the
    /// `{"error": "..."}` text from the body when there was one.
    #[error("{path} returned HTTP {status}")]
    Status {
        path: String,
        status: u16,
        message: Option<String>,
    },

    /// 2xx, but the body itself reports that the operation failed
    /// (`{"ok": false, "error": "..."}`).
    #[error("{path} reported failure: {}", .message.as_deref().unwrap_or("no reason given"))]
    Rejected {
        path: String,
        message: Option<String>,
    },

    /// 2xx, but the body is not what the endpoint promises.
    #[error("could not decode {path} response: {reason}")]
    Decode { path: String, reason: String },

    /// Rejected before anything was sent.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl FetchError {
    /// Server-supplied error text, if the backend sent one.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            FetchError::Status { message, .. } | FetchError::Rejected { message, .. } => {
                message.as_deref()
            }
            _ => None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// The live event stream stopped. Always terminal for that stream instance.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("event stream connect failed: {0}")]
    Connect(String),

    #[error("event stream rejected with HTTP {status}")]
    Rejected { status: u16 },

    #[error("event stream transport error: {0}")]
    Transport(String),

    #[error("event stream closed by server")]
    Closed,
}
