//! Per-request types: query parameters, the options bundle and the request descriptor.

use crate::codec::Payload;
use crate::{Error, Result};
use http::{HeaderMap, HeaderName, HeaderValue, Method};
use std::collections::BTreeMap;
use std::time::Duration;
use url::Url;

/// Query-string parameters.
///
/// Keys are unique. Encoding is canonical: keys come out sorted regardless of
/// insertion order.
///
/// # Examples
///
/// ```
/// use rested::Params;
///
/// let params = Params::new().with("page", "2").with("per_page", "50");
/// assert_eq!(params.get("page"), Some("2"));
///
/// let same: Params = [("per_page", "50"), ("page", "2")].into();
/// assert_eq!(params, same);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(BTreeMap<String, String>);

impl Params {
    /// Creates an empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a parameter, replacing any previous value for the key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(key.into(), value.into())
    }

    /// Builder-style [`Params::insert`].
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Returns the value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the parameters in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K, V> FromIterator<(K, V)> for Params
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for Params
where
    K: Into<String>,
    V: Into<String>,
{
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

/// Per-request options.
///
/// # Examples
///
/// ```
/// use rested::Opts;
/// use std::time::Duration;
///
/// let opts = Opts::new()
///     .expected_status(201)
///     .timeout(Duration::from_secs(5))
///     .header("X-Request-Id", "abc-123")
///     .unwrap();
///
/// assert_eq!(opts.expected_status, Some(201));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Opts {
    /// If set, any other response status fails with [`Error::UnexpectedStatus`].
    ///
    /// Compared against the raw numeric code, so a value no server can send never matches.
    pub expected_status: Option<u16>,

    /// Headers for this request only. They override session headers of the same name.
    pub headers: HeaderMap,

    /// Whole-request timeout, overriding the session's.
    pub timeout: Option<Duration>,
}

impl Opts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Expects the given status. `0` clears the expectation.
    pub fn expected_status(mut self, status: u16) -> Self {
        self.expected_status = (status != 0).then_some(status);
        self
    }

    /// Adds a header to this request.
    ///
    /// # Errors
    ///
    /// Returns an error if the header name or value is invalid.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Result<Self> {
        let (name, value) = parse_header(name.as_ref(), value.as_ref())?;
        self.headers.insert(name, value);
        Ok(self)
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Everything needed to issue one call.
///
/// The verb methods on [`crate::Session`] build one of these; use it directly with
/// [`crate::Session::send`] for methods that have no dedicated helper.
///
/// # Examples
///
/// ```no_run
/// use http::Method;
/// use rested::{Request, Session};
///
/// # fn example() -> Result<(), rested::Error> {
/// let session = Session::new();
/// let request = Request::new(Method::OPTIONS, "https://api.example.com/items");
/// let response = session.send(request, None)?;
/// println!("Allow: {:?}", response.header("allow"));
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Request<'a> {
    pub method: Method,
    pub url: &'a str,
    pub params: Option<&'a Params>,
    pub payload: Option<&'a dyn Payload>,
    pub opts: Option<&'a Opts>,
}

impl<'a> Request<'a> {
    pub fn new(method: Method, url: &'a str) -> Self {
        Self {
            method,
            url,
            params: None,
            payload: None,
            opts: None,
        }
    }

    pub fn params(mut self, params: Option<&'a Params>) -> Self {
        self.params = params;
        self
    }

    pub fn payload(mut self, payload: Option<&'a dyn Payload>) -> Self {
        self.payload = payload;
        self
    }

    pub fn opts(mut self, opts: Option<&'a Opts>) -> Self {
        self.opts = opts;
        self
    }

    /// Parses the URL and merges the query parameters into it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`] if the URL does not parse or its scheme is
    /// neither `http` nor `https`.
    pub fn target_url(&self) -> Result<Url> {
        let mut url = Url::parse(self.url).map_err(|e| Error::InvalidUrl {
            url: self.url.to_string(),
            reason: e.to_string(),
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::InvalidUrl {
                url: self.url.to_string(),
                reason: format!("unsupported scheme {:?}", url.scheme()),
            });
        }

        if let Some(params) = self.params {
            merge_query(&mut url, params);
        }

        Ok(url)
    }

    /// Serializes the payload, if any.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnmarshalableType`] if the payload has no JSON form.
    pub fn body(&self) -> Result<Option<Vec<u8>>> {
        self.payload
            .map(|payload| payload.to_json().map_err(Error::UnmarshalableType))
            .transpose()
    }

    pub(crate) fn expected_status(&self) -> Option<u16> {
        self.opts.and_then(|opts| opts.expected_status)
    }
}

impl std::fmt::Debug for Request<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Request")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("params", &self.params)
            .field("has_payload", &self.payload.is_some())
            .field("opts", &self.opts)
            .finish()
    }
}

/// Existing query values are kept; keys present in `params` are replaced. The result
/// is re-encoded with keys in sorted order.
fn merge_query(url: &mut Url, params: &Params) {
    let mut query: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (key, value) in url.query_pairs() {
        query
            .entry(key.into_owned())
            .or_default()
            .push(value.into_owned());
    }
    for (key, value) in params.iter() {
        query.insert(key.to_string(), vec![value.to_string()]);
    }

    if query.is_empty() {
        url.set_query(None);
        return;
    }

    let mut pairs = url.query_pairs_mut();
    pairs.clear();
    for (key, values) in &query {
        for value in values {
            pairs.append_pair(key, value);
        }
    }
}

pub(crate) fn parse_header(name: &str, value: &str) -> Result<(HeaderName, HeaderValue)> {
    let name = HeaderName::try_from(name)
        .map_err(|e| Error::Configuration(format!("Invalid header name: {}", e)))?;
    let value = HeaderValue::try_from(value)
        .map_err(|e| Error::Configuration(format!("Invalid header value: {}", e)))?;
    Ok((name, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{ser::Error as _, Serialize, Serializer};

    struct Opaque;

    impl Serialize for Opaque {
        fn serialize<S: Serializer>(&self, _serializer: S) -> std::result::Result<S::Ok, S::Error> {
            Err(S::Error::custom("functions cannot be serialized"))
        }
    }

    #[test]
    fn test_missing_scheme_is_invalid() {
        let err = Request::new(Method::GET, "://foobar.com")
            .target_url()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidUrl { .. }));
    }

    #[test]
    fn test_unsupported_scheme_is_invalid() {
        let err = Request::new(Method::GET, "foo://bar.com")
            .target_url()
            .unwrap_err();
        match err {
            Error::InvalidUrl { url, reason } => {
                assert_eq!(url, "foo://bar.com");
                assert!(reason.contains("foo"));
            }
            other => panic!("Expected InvalidUrl, got {:?}", other),
        }
    }

    #[test]
    fn test_url_without_params_is_untouched() {
        let url = Request::new(Method::GET, "http://localhost/a?z=1&a=2")
            .target_url()
            .unwrap();
        assert_eq!(url.as_str(), "http://localhost/a?z=1&a=2");
    }

    #[test]
    fn test_params_are_sorted_and_encoded() {
        let params = Params::new().with("q", "rust lang").with("a", "1&2");
        let url = Request::new(Method::GET, "http://localhost/search")
            .params(Some(&params))
            .target_url()
            .unwrap();
        assert_eq!(url.query(), Some("a=1%262&q=rust+lang"));
    }

    #[test]
    fn test_params_merge_with_existing_query() {
        let params: Params = [("page", "3"), ("limit", "10")].into();
        let url = Request::new(Method::GET, "http://localhost/items?page=1&sort=asc&tag=a&tag=b")
            .params(Some(&params))
            .target_url()
            .unwrap();
        assert_eq!(
            url.query(),
            Some("limit=10&page=3&sort=asc&tag=a&tag=b")
        );
    }

    #[test]
    fn test_empty_params_drop_empty_query() {
        let params = Params::new();
        let url = Request::new(Method::GET, "http://localhost/items?")
            .params(Some(&params))
            .target_url()
            .unwrap();
        assert_eq!(url.query(), None);
    }

    #[test]
    fn test_body_serializes_payload() {
        let payload = serde_json::json!({"Foo": 111, "Bar": "foo"});
        let body = Request::new(Method::POST, "http://localhost/")
            .payload(Some(&payload))
            .body()
            .unwrap()
            .unwrap();
        let echoed: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(echoed, payload);
    }

    #[test]
    fn test_body_absent_without_payload() {
        let body = Request::new(Method::DELETE, "http://localhost/").body().unwrap();
        assert!(body.is_none());
    }

    #[test]
    fn test_unserializable_payload() {
        let err = Request::new(Method::POST, "http://localhost/")
            .payload(Some(&Opaque))
            .body()
            .unwrap_err();
        assert!(matches!(err, Error::UnmarshalableType(_)));
    }

    #[test]
    fn test_opts_expected_status() {
        assert_eq!(Opts::new().expected_status(200).expected_status, Some(200));
        assert_eq!(Opts::new().expected_status(42).expected_status, Some(42));
        assert_eq!(Opts::new().expected_status(1000).expected_status, Some(1000));
        assert_eq!(Opts::new().expected_status(0).expected_status, None);
    }

    #[test]
    fn test_opts_rejects_bad_header() {
        let err = Opts::new().header("bad header", "value").unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }
}
