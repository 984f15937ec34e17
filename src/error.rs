//! Error types for the CouchRest client.
//!
//! Every fallible operation in the crate returns [`Result<T>`]. Transport
//! failures are never retried or masked at this layer: a non-2xx response is
//! surfaced as [`CouchError::Transport`] with the status and body the server
//! sent, so callers can tell "no rows" apart from "the query failed".
//!
//! Parse failures while streaming are deliberately *not* represented here.
//! They degrade to raw-line passthrough (line-framed endpoints) or are dropped
//! (structural lines of array-framed endpoints); see [`crate::client::parser`].

use thiserror::Error;

/// Errors produced by the CouchRest client.
#[derive(Error, Debug)]
pub enum CouchError {
    /// A caller-supplied argument was rejected before any request was made.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The server answered with a non-2xx status.
    #[error("HTTP {status}: {body}{}", with_context(.context))]
    Transport {
        /// HTTP status code
        status: u16,
        /// Raw response body
        body: String,
        /// Request URL and payload, only populated in debug mode
        context: Option<String>,
    },

    /// Connection-level failure (DNS, refused connection, broken body stream).
    #[error("HTTP error: {0}")]
    Http(String),

    /// JSON encoding or decoding failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The server URL could not be parsed.
    #[error("Invalid URL: {0}")]
    Url(String),

    /// The reader task stopped before the stream finished.
    #[error("Stream closed unexpectedly")]
    StreamClosed,
}

impl CouchError {
    /// Shorthand for [`CouchError::InvalidArgument`].
    pub fn invalid(msg: impl Into<String>) -> Self {
        CouchError::InvalidArgument(msg.into())
    }

    /// HTTP status carried by a transport error.
    pub fn status(&self) -> Option<u16> {
        match self {
            CouchError::Transport { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True for a `404 Not Found` response.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

impl From<reqwest::Error> for CouchError {
    fn from(e: reqwest::Error) -> Self {
        CouchError::Http(e.to_string())
    }
}

impl From<url::ParseError> for CouchError {
    fn from(e: url::ParseError) -> Self {
        CouchError::Url(e.to_string())
    }
}

fn with_context(context: &Option<String>) -> String {
    context.as_deref().map(|c| format!("\n{}", c)).unwrap_or_default()
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, CouchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_display_without_context() {
        let err = CouchError::Transport {
            status: 404,
            body: r#"{"error":"not_found"}"#.to_string(),
            context: None,
        };
        assert_eq!(err.to_string(), r#"HTTP 404: {"error":"not_found"}"#);
        assert!(err.is_not_found());
    }

    #[test]
    fn test_transport_display_with_context() {
        let err = CouchError::Transport {
            status: 409,
            body: "conflict".to_string(),
            context: Some("Error while sending a PUT request http://x/db/doc".to_string()),
        };
        let text = err.to_string();
        assert!(text.starts_with("HTTP 409: conflict\n"));
        assert!(text.contains("PUT request http://x/db/doc"));
        assert_eq!(err.status(), Some(409));
    }

    #[test]
    fn test_invalid_argument() {
        let err = CouchError::invalid("_design docs require a name");
        assert_eq!(err.to_string(), "Invalid argument: _design docs require a name");
        assert_eq!(err.status(), None);
    }

    #[test]
    fn test_from_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: CouchError = json_err.into();
        assert!(matches!(err, CouchError::Json(_)));
    }
}
