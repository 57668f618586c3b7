//! Error types for REST calls.
//!
//! Every failure is returned as a value. The one failure that still carries a usable
//! result is [`Error::UnexpectedStatus`]: the populated [`Response`] travels inside it,
//! so the status and body of a rejected exchange stay inspectable.

use crate::Response;
use http::StatusCode;
use std::borrow::Cow;

/// The main error type for REST calls.
///
/// # Examples
///
/// ```no_run
/// use rested::{Error, Opts, Session};
///
/// # fn example() -> Result<(), Error> {
/// let session = Session::new();
/// let opts = Opts::new().expected_status(200);
///
/// match session.get("https://api.example.com/items", None, None, Some(&opts)) {
///     Ok(response) => println!("Body: {}", response.raw_text()),
///     Err(Error::UnexpectedStatus { expected, response }) => {
///         eprintln!("Wanted {}, got {}: {}", expected, response.status(), response.raw_text());
///     }
///     Err(e) => eprintln!("Other error: {}", e),
/// }
/// # Ok(())
/// # }
/// ```
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The URL could not be parsed or uses a scheme the transport cannot speak.
    ///
    /// No request is attempted.
    #[error("Invalid URL {url:?}: {reason}")]
    InvalidUrl {
        /// The URL as supplied by the caller
        url: String,
        /// Why it was rejected
        reason: String,
    },

    /// The request payload cannot be represented as JSON.
    ///
    /// Raised before any network activity.
    #[error("Payload cannot be serialized to JSON: {0}")]
    UnmarshalableType(#[source] serde_json::Error),

    /// A network-level failure (connection refused, DNS, protocol mismatch, timeout).
    ///
    /// The `reqwest::Error` is kept as-is and never retried.
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a status other than the one requested in [`crate::Opts`].
    ///
    /// # Fields
    ///
    /// * `expected` - The status the caller asked for
    /// * `response` - The full response, body included
    #[error("Unexpected status {}: expected {expected}", .response.status())]
    UnexpectedStatus {
        /// The status the caller expected
        expected: u16,
        /// The response that was actually received
        response: Box<Response>,
    },

    /// The response body could not be decoded into the requested type.
    #[error("Failed to decode response body: {0}")]
    Decode(#[source] serde_json::Error),

    /// Invalid configuration was provided, such as a malformed header.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl Error {
    /// Returns `true` for [`Error::UnexpectedStatus`].
    pub fn is_unexpected_status(&self) -> bool {
        matches!(self, Error::UnexpectedStatus { .. })
    }

    /// Returns the HTTP status code if this error carries a response.
    pub fn status(&self) -> Option<StatusCode> {
        self.response().map(Response::status)
    }

    /// Returns the raw response body if this error carries a response.
    pub fn raw_response(&self) -> Option<Cow<'_, str>> {
        self.response().map(Response::raw_text)
    }

    /// Borrows the response attached to an [`Error::UnexpectedStatus`].
    pub fn response(&self) -> Option<&Response> {
        match self {
            Error::UnexpectedStatus { response, .. } => Some(response),
            _ => None,
        }
    }

    /// Takes the response out of an [`Error::UnexpectedStatus`].
    ///
    /// # Examples
    ///
    /// ```
    /// use rested::Error;
    ///
    /// let err = Error::Configuration("bad header".to_string());
    /// assert!(err.into_response().is_none());
    /// ```
    pub fn into_response(self) -> Option<Response> {
        match self {
            Error::UnexpectedStatus { response, .. } => Some(*response),
            _ => None,
        }
    }
}

/// A specialized `Result` type for REST calls.
///
/// This is a convenience alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderMap;
    use std::time::Duration;
    use url::Url;

    fn response(status: u16, body: &str) -> Response {
        Response::new(
            StatusCode::from_u16(status).unwrap(),
            HeaderMap::new(),
            Url::parse("http://localhost/").unwrap(),
            body.to_string(),
            Duration::from_millis(5),
        )
    }

    #[test]
    fn test_unexpected_status_exposes_response() {
        let err = Error::UnexpectedStatus {
            expected: 200,
            response: Box::new(response(500, "boom")),
        };

        assert!(err.is_unexpected_status());
        assert_eq!(err.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
        assert_eq!(err.raw_response().as_deref(), Some("boom"));
        assert_eq!(
            err.to_string(),
            "Unexpected status 500 Internal Server Error: expected 200"
        );

        let response = err.into_response().unwrap();
        assert_eq!(response.raw_text(), "boom");
    }

    #[test]
    fn test_other_errors_have_no_response() {
        let err = Error::InvalidUrl {
            url: "://foo".to_string(),
            reason: "relative URL without a base".to_string(),
        };

        assert!(!err.is_unexpected_status());
        assert!(err.status().is_none());
        assert!(err.raw_response().is_none());
    }
}
