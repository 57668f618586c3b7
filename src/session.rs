//! Sessions: shared configuration plus the request/response cycle.
//!
//! The [`Session`] type is the main entry point for making calls. Use
//! [`SessionBuilder`] to configure headers, logging, auth, timeouts and cookies.

use crate::{
    codec::{Payload, Target},
    request::{parse_header, Opts, Params, Request},
    Error, Response, Result,
};
use http::{header, HeaderMap, HeaderValue, Method};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A reusable holder of configuration shared across calls.
///
/// Cloning is cheap and clones share the same transport. Headers are fixed at build
/// time, so a session can be used from several threads at once.
///
/// # Examples
///
/// ```no_run
/// use rested::{Opts, Params, Session};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize)]
/// struct CreateUser {
///     name: String,
/// }
///
/// #[derive(Debug, Default, Deserialize)]
/// struct User {
///     id: u64,
///     name: String,
/// }
///
/// # fn example() -> Result<(), rested::Error> {
/// let session = Session::builder()
///     .default_header("Authorization", "Bearer token")?
///     .log(true)
///     .build()?;
///
/// // GET with query parameters, decoded into `user`
/// let mut user = User::default();
/// let params = Params::new().with("id", "123");
/// session.get("https://api.example.com/users", Some(&params), Some(&mut user), None)?;
/// println!("User: {}", user.name);
///
/// // POST, insisting on 201
/// let new_user = CreateUser { name: "Alice".to_string() };
/// let opts = Opts::new().expected_status(201);
/// let mut created = User::default();
/// session.post("https://api.example.com/users", Some(&new_user), Some(&mut created), Some(&opts))?;
/// println!("Created user with ID: {}", created.id);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    http_client: reqwest::blocking::Client,
    default_headers: HeaderMap,
    basic_auth: Option<(String, Option<String>)>,
    log: bool,
}

impl Session {
    /// Creates a session with no default headers and logging off.
    pub fn new() -> Self {
        Self::from_parts(reqwest::blocking::Client::new(), HeaderMap::new(), None, false)
    }

    /// Creates a new `SessionBuilder` for configuring a session.
    pub fn builder() -> SessionBuilder {
        SessionBuilder::new()
    }

    fn from_parts(
        http_client: reqwest::blocking::Client,
        default_headers: HeaderMap,
        basic_auth: Option<(String, Option<String>)>,
        log: bool,
    ) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                http_client,
                default_headers,
                basic_auth,
                log,
            }),
        }
    }

    /// Headers sent with every request.
    pub fn headers(&self) -> &HeaderMap {
        &self.inner.default_headers
    }

    /// Whether requests and responses are traced in full.
    pub fn log_enabled(&self) -> bool {
        self.inner.log
    }

    /// Performs one call described by `request`.
    ///
    /// Every verb method funnels through here. The steps, in order: parse the URL and
    /// merge query parameters, serialize the payload, attach headers, execute, capture
    /// status and body, check the expected status, then decode into `result`.
    ///
    /// # Errors
    ///
    /// * [`Error::InvalidUrl`] and [`Error::UnmarshalableType`] before any network I/O
    /// * [`Error::Transport`] when the exchange itself fails
    /// * [`Error::UnexpectedStatus`] carrying the full response on a status mismatch
    /// * [`Error::Decode`] when `result` is given and the body does not decode into it
    ///
    /// Decoding is skipped for an empty body, leaving `result` untouched.
    pub fn send(&self, request: Request<'_>, result: Option<&mut dyn Target>) -> Result<Response> {
        let url = request.target_url()?;
        let body = request.body()?;

        tracing::debug!(
            method = %request.method,
            url = %url,
            "Executing HTTP request"
        );

        let mut headers = self.inner.default_headers.clone();
        if body.is_some() {
            headers.insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/json"),
            );
        }
        if let Some(opts) = request.opts {
            for (name, value) in &opts.headers {
                headers.insert(name.clone(), value.clone());
            }
        }
        let has_authorization = headers.contains_key(header::AUTHORIZATION);

        let mut builder = self
            .inner
            .http_client
            .request(request.method.clone(), url)
            .headers(headers);

        // An explicit Authorization header wins over session credentials.
        if let Some((username, password)) = &self.inner.basic_auth {
            if !has_authorization {
                builder = builder.basic_auth(username, password.as_ref());
            }
        }

        if let Some(body) = body {
            builder = builder.body(body);
        }

        if let Some(timeout) = request.opts.and_then(|opts| opts.timeout) {
            builder = builder.timeout(timeout);
        }

        let http_request = builder.build()?;
        if self.inner.log {
            trace_request(&http_request);
        }

        let start_time = Instant::now();
        let http_response = self.inner.http_client.execute(http_request)?;
        let status = http_response.status();
        let headers = http_response.headers().clone();
        let final_url = http_response.url().clone();
        let raw_body = http_response.bytes()?.to_vec();
        let latency = start_time.elapsed();

        let response = Response::new(status, headers, final_url, raw_body, latency);
        if self.inner.log {
            trace_response(&response);
        } else {
            tracing::debug!(
                status = status.as_u16(),
                latency_ms = latency.as_millis(),
                "Received HTTP response"
            );
        }

        if let Some(expected) = request.expected_status() {
            if response.status().as_u16() != expected {
                tracing::warn!(
                    expected = expected,
                    status = response.status().as_u16(),
                    method = %request.method,
                    url = %response.url(),
                    "Unexpected response status"
                );
                return Err(Error::UnexpectedStatus {
                    expected,
                    response: Box::new(response),
                });
            }
        }

        if let Some(target) = result {
            if !response.raw_body().is_empty() {
                response.unmarshall_into(target)?;
            }
        }

        Ok(response)
    }

    /// Makes a GET request.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use rested::{Params, Session};
    /// use serde::Deserialize;
    ///
    /// #[derive(Default, Deserialize)]
    /// struct Page { items: Vec<String> }
    ///
    /// # fn example() -> Result<(), rested::Error> {
    /// let session = Session::new();
    /// let params: Params = [("page", "2")].into();
    /// let mut page = Page::default();
    /// let response = session.get("https://api.example.com/items", Some(&params), Some(&mut page), None)?;
    /// println!("{} items, status {}", page.items.len(), response.status());
    /// # Ok(())
    /// # }
    /// ```
    pub fn get(
        &self,
        url: &str,
        params: Option<&Params>,
        result: Option<&mut dyn Target>,
        opts: Option<&Opts>,
    ) -> Result<Response> {
        let request = Request::new(Method::GET, url).params(params).opts(opts);
        self.send(request, result)
    }

    /// Makes a POST request with an optional JSON payload.
    pub fn post(
        &self,
        url: &str,
        payload: Option<&dyn Payload>,
        result: Option<&mut dyn Target>,
        opts: Option<&Opts>,
    ) -> Result<Response> {
        let request = Request::new(Method::POST, url).payload(payload).opts(opts);
        self.send(request, result)
    }

    /// Makes a PUT request with an optional JSON payload.
    pub fn put(
        &self,
        url: &str,
        payload: Option<&dyn Payload>,
        result: Option<&mut dyn Target>,
        opts: Option<&Opts>,
    ) -> Result<Response> {
        let request = Request::new(Method::PUT, url).payload(payload).opts(opts);
        self.send(request, result)
    }

    /// Makes a PATCH request with an optional JSON payload.
    pub fn patch(
        &self,
        url: &str,
        payload: Option<&dyn Payload>,
        result: Option<&mut dyn Target>,
        opts: Option<&Opts>,
    ) -> Result<Response> {
        let request = Request::new(Method::PATCH, url).payload(payload).opts(opts);
        self.send(request, result)
    }

    /// Makes a DELETE request.
    pub fn delete(
        &self,
        url: &str,
        params: Option<&Params>,
        result: Option<&mut dyn Target>,
        opts: Option<&Opts>,
    ) -> Result<Response> {
        let request = Request::new(Method::DELETE, url).params(params).opts(opts);
        self.send(request, result)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("default_headers", &redact_headers(&self.inner.default_headers))
            .field("basic_auth", &self.inner.basic_auth.as_ref().map(|(user, _)| user))
            .field("log", &self.inner.log)
            .finish_non_exhaustive()
    }
}

static SENSITIVE_HEADERS: [header::HeaderName; 4] = [
    header::AUTHORIZATION,
    header::PROXY_AUTHORIZATION,
    header::COOKIE,
    header::SET_COOKIE,
];

/// Marks credential-bearing headers sensitive so their `Debug` output is masked.
fn redact_headers(headers: &HeaderMap) -> HeaderMap {
    let mut redacted = headers.clone();
    for (name, value) in redacted.iter_mut() {
        if SENSITIVE_HEADERS.contains(name) {
            value.set_sensitive(true);
        }
    }
    redacted
}

fn trace_request(request: &reqwest::blocking::Request) {
    let body = request
        .body()
        .and_then(|body| body.as_bytes())
        .map(String::from_utf8_lossy)
        .unwrap_or_default();

    tracing::info!(
        method = %request.method(),
        url = %request.url(),
        headers = ?redact_headers(request.headers()),
        body = %body,
        "Outgoing request"
    );
}

fn trace_response(response: &Response) {
    tracing::info!(
        status = response.status().as_u16(),
        latency_ms = response.latency().as_millis(),
        headers = ?redact_headers(response.headers()),
        body = %response.raw_text(),
        "Received HTTP response"
    );
}

/// Builder for configuring and creating a [`Session`].
///
/// # Examples
///
/// ```no_run
/// use rested::SessionBuilder;
/// use std::time::Duration;
///
/// # fn example() -> Result<(), rested::Error> {
/// let session = SessionBuilder::new()
///     .default_header("Accept", "application/json")?
///     .user_agent("my-app/1.0")?
///     .basic_auth("alice", Some("secret"))
///     .timeout(Duration::from_secs(30))
///     .cookie_store(true)
///     .log(true)
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct SessionBuilder {
    default_headers: HeaderMap,
    basic_auth: Option<(String, Option<String>)>,
    timeout: Option<Duration>,
    cookie_store: bool,
    log: bool,
}

impl SessionBuilder {
    /// Creates a new `SessionBuilder` with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a header that will be included in all requests.
    ///
    /// # Errors
    ///
    /// Returns an error if the header name or value is invalid.
    pub fn default_header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Result<Self> {
        let (name, value) = parse_header(name.as_ref(), value.as_ref())?;
        self.default_headers.insert(name, value);
        Ok(self)
    }

    /// Adds every header in `headers`, replacing earlier values of the same name.
    pub fn default_headers(mut self, headers: HeaderMap) -> Self {
        for (name, value) in headers {
            if let Some(name) = name {
                self.default_headers.insert(name, value);
            }
        }
        self
    }

    /// Sets the `User-Agent` header.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not a valid header value.
    pub fn user_agent(self, value: impl AsRef<str>) -> Result<Self> {
        self.default_header(header::USER_AGENT.as_str(), value)
    }

    /// Sends HTTP basic auth credentials with every request.
    pub fn basic_auth(mut self, username: impl Into<String>, password: Option<&str>) -> Self {
        self.basic_auth = Some((username.into(), password.map(str::to_string)));
        self
    }

    /// Sets the whole-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Keeps cookies set by servers and sends them back on later requests.
    pub fn cookie_store(mut self, enabled: bool) -> Self {
        self.cookie_store = enabled;
        self
    }

    /// Traces every request and response in full at `info` level.
    pub fn log(mut self, enabled: bool) -> Self {
        self.log = enabled;
        self
    }

    /// Builds the configured `Session`.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be created.
    pub fn build(self) -> Result<Session> {
        let mut http_client = reqwest::blocking::Client::builder().cookie_store(self.cookie_store);
        if let Some(timeout) = self.timeout {
            http_client = http_client.timeout(timeout);
        }

        let http_client = http_client.build().map_err(|e| {
            Error::Configuration(format!("Failed to build HTTP client: {}", e))
        })?;

        Ok(Session::from_parts(
            http_client,
            self.default_headers,
            self.basic_auth,
            self.log,
        ))
    }
}
