//! Response wrapper with deferred JSON decoding.
//!
//! A [`Response`] is created once the transport has delivered a complete exchange,
//! whatever its status. The body is read exactly once and kept as raw bytes; decoding
//! happens on demand and may be repeated against the same stored body.

use crate::codec::Target;
use crate::{Error, Result};
use http::{HeaderMap, StatusCode};
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use url::Url;

/// A completed HTTP exchange.
///
/// # Examples
///
/// ```no_run
/// use rested::{Params, Session};
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct User {
///     id: u64,
///     name: String,
/// }
///
/// # fn example() -> Result<(), rested::Error> {
/// let session = Session::new();
/// let params = Params::new().with("id", "123");
/// let response = session.get("https://api.example.com/users", Some(&params), None, None)?;
///
/// println!("Status: {}", response.status());
/// println!("Body: {}", response.raw_text());
///
/// let user: User = response.unmarshall()?;
/// println!("User {}: {}", user.id, user.name);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    url: Url,
    raw_body: Vec<u8>,
    latency: Duration,
    decoded: AtomicBool,
}

impl Response {
    /// Creates a new `Response`.
    ///
    /// This is typically called by the session once the body has been read.
    pub fn new(
        status: StatusCode,
        headers: HeaderMap,
        url: Url,
        raw_body: impl Into<Vec<u8>>,
        latency: Duration,
    ) -> Self {
        Self {
            status,
            headers,
            url,
            raw_body: raw_body.into(),
            latency,
            decoded: AtomicBool::new(false),
        }
    }

    /// The HTTP status code.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns `true` for 2xx statuses.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// The body as text; empty if the server sent none.
    ///
    /// Borrowed as-is when the body is valid UTF-8. Invalid sequences are replaced
    /// with U+FFFD; use [`Response::raw_body`] for the exact bytes.
    pub fn raw_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.raw_body)
    }

    /// The body bytes exactly as received.
    pub fn raw_body(&self) -> &[u8] {
        &self.raw_body
    }

    /// The response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns a header value by name, if present and valid UTF-8.
    ///
    /// # Examples
    ///
    /// ```
    /// # use rested::Response;
    /// # use http::{HeaderMap, HeaderValue, StatusCode};
    /// # use std::time::Duration;
    /// let mut headers = HeaderMap::new();
    /// headers.insert("content-type", HeaderValue::from_static("application/json"));
    ///
    /// let response = Response::new(
    ///     StatusCode::OK,
    ///     headers,
    ///     url::Url::parse("http://localhost/").unwrap(),
    ///     String::new(),
    ///     Duration::from_millis(10),
    /// );
    ///
    /// assert_eq!(response.header("content-type"), Some("application/json"));
    /// ```
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)?.to_str().ok()
    }

    /// The final URL of the exchange, after redirects.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Time from sending the request until the body was fully read.
    pub fn latency(&self) -> Duration {
        self.latency
    }

    /// Returns `true` once the body has been decoded successfully at least once.
    pub fn was_decoded(&self) -> bool {
        self.decoded.load(Ordering::Relaxed)
    }

    /// Decodes the stored body as JSON.
    ///
    /// Can be called any number of times; every call decodes the same stored bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] if the body is not valid JSON or does not match `T`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use rested::Response;
    /// # use http::{HeaderMap, StatusCode};
    /// # use std::time::Duration;
    /// let response = Response::new(
    ///     StatusCode::OK,
    ///     HeaderMap::new(),
    ///     url::Url::parse("http://localhost/").unwrap(),
    ///     "[1, 2, 3]".to_string(),
    ///     Duration::from_millis(10),
    /// );
    ///
    /// let first: Vec<u32> = response.unmarshall().unwrap();
    /// let second: Vec<u32> = response.unmarshall().unwrap();
    /// assert_eq!(first, second);
    /// ```
    pub fn unmarshall<T>(&self) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let value = serde_json::from_slice(&self.raw_body).map_err(|e| self.decode_failed(e))?;
        self.decoded.store(true, Ordering::Relaxed);
        Ok(value)
    }

    /// Decodes the stored body as JSON into an existing value.
    ///
    /// The target is left untouched on failure.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] under the same conditions as [`Response::unmarshall`].
    pub fn unmarshall_into(&self, target: &mut dyn Target) -> Result<()> {
        target
            .decode_json(&self.raw_body)
            .map_err(|e| self.decode_failed(e))?;
        self.decoded.store(true, Ordering::Relaxed);
        Ok(())
    }

    fn decode_failed(&self, e: serde_json::Error) -> Error {
        tracing::error!(
            error = %e,
            status = self.status.as_u16(),
            raw_response = %self.raw_text(),
            "Failed to decode response"
        );
        Error::Decode(e)
    }
}

impl Clone for Response {
    fn clone(&self) -> Self {
        Self {
            status: self.status,
            headers: self.headers.clone(),
            url: self.url.clone(),
            raw_body: self.raw_body.clone(),
            latency: self.latency,
            decoded: AtomicBool::new(self.was_decoded()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Default, Deserialize, PartialEq)]
    struct Item {
        id: u32,
        name: String,
    }

    fn response(body: &str) -> Response {
        Response::new(
            StatusCode::OK,
            HeaderMap::new(),
            Url::parse("http://localhost/items").unwrap(),
            body.to_string(),
            Duration::from_millis(1),
        )
    }

    #[test]
    fn test_unmarshall_is_repeatable() {
        let response = response(r#"{"id":4,"name":"four"}"#);
        assert!(!response.was_decoded());

        let mut first = Item::default();
        let mut second = Item::default();
        response.unmarshall_into(&mut first).unwrap();
        response.unmarshall_into(&mut second).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.name, "four");
        assert!(response.was_decoded());
        assert_eq!(response.raw_text(), r#"{"id":4,"name":"four"}"#);
    }

    #[test]
    fn test_unmarshall_mismatched_shape() {
        let response = response(r#"{"id":"not a number"}"#);
        let result = response.unmarshall::<Item>();
        assert!(matches!(result, Err(Error::Decode(_))));
        assert!(!response.was_decoded());
    }

    #[test]
    fn test_unmarshall_empty_body_fails() {
        let response = response("");
        assert_eq!(response.raw_text(), "");
        assert!(matches!(
            response.unmarshall::<serde_json::Value>(),
            Err(Error::Decode(_))
        ));
    }

    #[test]
    fn test_clone_keeps_decoded_flag() {
        let response = response("true");
        let _: bool = response.unmarshall().unwrap();
        let copy = response.clone();
        assert!(copy.was_decoded());
        assert_eq!(copy.status(), StatusCode::OK);
    }

    #[test]
    fn test_non_utf8_body_is_kept_verbatim() {
        let bytes = vec![b'o', b'k', 0xff, 0xfe];
        let response = Response::new(
            StatusCode::OK,
            HeaderMap::new(),
            Url::parse("http://localhost/blob").unwrap(),
            bytes.clone(),
            Duration::from_millis(1),
        );

        assert_eq!(response.raw_body(), bytes.as_slice());
        assert_eq!(response.raw_text(), "ok\u{fffd}\u{fffd}");
        assert!(matches!(response.raw_text(), Cow::Owned(_)));
        assert!(matches!(
            response.unmarshall::<serde_json::Value>(),
            Err(Error::Decode(_))
        ));
    }

    #[test]
    fn test_utf8_body_is_borrowed() {
        let response = response(r#"{"id":1,"name":"ü"}"#);
        assert!(matches!(response.raw_text(), Cow::Borrowed(_)));
        let item: Item = response.unmarshall().unwrap();
        assert_eq!(item.name, "ü");
    }
}
