//! # Rested - a small helper for JSON REST APIs
//!
//! Rested removes the boilerplate around calling JSON REST endpoints: it builds the
//! URL with query parameters, serializes payloads to JSON, checks the status code
//! against an expectation and decodes the body into your types. The HTTP exchange
//! itself is delegated to a blocking `reqwest` client.
//!
//! ## Quick Start
//!
//! ```no_run
//! use rested::{Opts, Params};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize)]
//! struct CreateUser {
//!     name: String,
//!     email: String,
//! }
//!
//! #[derive(Debug, Default, Deserialize)]
//! struct User {
//!     id: u64,
//!     name: String,
//!     email: String,
//! }
//!
//! fn main() -> Result<(), rested::Error> {
//!     // GET with query parameters
//!     let params = Params::new().with("email", "alice@example.com");
//!     let mut user = User::default();
//!     let response = rested::get("https://api.example.com/users", Some(&params), Some(&mut user), None)?;
//!     println!("User {} (status {})", user.name, response.status());
//!
//!     // POST, failing unless the server answers 201
//!     let new_user = CreateUser {
//!         name: "Alice".to_string(),
//!         email: "alice@example.com".to_string(),
//!     };
//!     let opts = Opts::new().expected_status(201);
//!     let response = rested::post("https://api.example.com/users", Some(&new_user), None, Some(&opts))?;
//!     let created: User = response.unmarshall()?;
//!     println!("Created user with ID: {}", created.id);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Sessions
//!
//! The top-level functions build a fresh default [`Session`] per call. Build one
//! yourself to share headers, credentials, cookies and logging across calls:
//!
//! ```no_run
//! use rested::Session;
//!
//! # fn example() -> Result<(), rested::Error> {
//! let session = Session::builder()
//!     .default_header("Authorization", "Bearer token")?
//!     .cookie_store(true)
//!     .log(true)
//!     .build()?;
//!
//! let response = session.delete("https://api.example.com/users/42", None, None, None)?;
//! println!("Deleted: {}", response.status());
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! A status mismatch still hands back the response:
//!
//! ```no_run
//! use rested::{Error, Opts};
//! use serde::Deserialize;
//!
//! #[derive(Debug, Deserialize)]
//! struct ApiError {
//!     message: String,
//! }
//!
//! # fn example() -> Result<(), Error> {
//! let opts = Opts::new().expected_status(200);
//! match rested::get("https://api.example.com/endpoint", None, None, Some(&opts)) {
//!     Ok(response) => println!("Success: {}", response.raw_text()),
//!     Err(Error::UnexpectedStatus { response, .. }) => {
//!         let body: ApiError = response.unmarshall()?;
//!         eprintln!("HTTP {}: {}", response.status(), body.message);
//!     }
//!     Err(e) => eprintln!("Other error: {}", e),
//! }
//! # Ok(())
//! # }
//! ```

mod codec;
mod error;
mod request;
mod response;
mod session;

pub use codec::{Payload, Target};
pub use error::{Error, Result};
pub use request::{Opts, Params, Request};
pub use response::Response;
pub use session::{Session, SessionBuilder};

/// Makes a GET request with a default [`Session`].
pub fn get(
    url: &str,
    params: Option<&Params>,
    result: Option<&mut dyn Target>,
    opts: Option<&Opts>,
) -> Result<Response> {
    Session::builder().build()?.get(url, params, result, opts)
}

/// Makes a POST request with a default [`Session`].
pub fn post(
    url: &str,
    payload: Option<&dyn Payload>,
    result: Option<&mut dyn Target>,
    opts: Option<&Opts>,
) -> Result<Response> {
    Session::builder().build()?.post(url, payload, result, opts)
}

/// Makes a PUT request with a default [`Session`].
pub fn put(
    url: &str,
    payload: Option<&dyn Payload>,
    result: Option<&mut dyn Target>,
    opts: Option<&Opts>,
) -> Result<Response> {
    Session::builder().build()?.put(url, payload, result, opts)
}

/// Makes a PATCH request with a default [`Session`].
pub fn patch(
    url: &str,
    payload: Option<&dyn Payload>,
    result: Option<&mut dyn Target>,
    opts: Option<&Opts>,
) -> Result<Response> {
    Session::builder().build()?.patch(url, payload, result, opts)
}

/// Makes a DELETE request with a default [`Session`].
pub fn delete(
    url: &str,
    params: Option<&Params>,
    result: Option<&mut dyn Target>,
    opts: Option<&Opts>,
) -> Result<Response> {
    Session::builder().build()?.delete(url, params, result, opts)
}
