//! Error types.
//!
//! Two families live here. [`Error`] is the status-coded error a method (or a
//! [`Matcher`](crate::Matcher)) returns to choose the HTTP status of its
//! error response. [`ServeError`] surfaces infrastructure failures of the
//! bundled [`Server`](crate::Server): parsing the bind address, binding the
//! port.

use std::error::Error as StdError;

use http::StatusCode;

/// An opaque, thread-safe error. Methods and matchers report failures as
/// anything convertible into this.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// An error that carries an explicit HTTP status code.
///
/// The display text is the wrapped error's, and the wrapped error is the
/// [`source`](std::error::Error::source), so cause chains stay intact.
///
/// ```rust
/// use http::StatusCode;
/// use structhttp::Error;
///
/// let err = Error::new(StatusCode::CONFLICT, "already exists");
/// assert_eq!(err.status(), StatusCode::CONFLICT);
/// assert_eq!(err.to_string(), "already exists");
/// ```
#[derive(Debug, thiserror::Error)]
#[error("{source}")]
pub struct Error {
    status: StatusCode,
    #[source]
    source: BoxError,
}

impl Error {
    pub fn new(status: StatusCode, source: impl Into<BoxError>) -> Self {
        Self { status, source: source.into() }
    }

    /// `400 Bad Request` wrapping `source`.
    pub fn bad_request(source: impl Into<BoxError>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, source)
    }

    /// `404 Not Found` wrapping `source`.
    pub fn not_found(source: impl Into<BoxError>) -> Self {
        Self::new(StatusCode::NOT_FOUND, source)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn into_inner(self) -> BoxError {
        self.source
    }
}

/// Finds the status code an error asks for.
///
/// Walks `err` and its [`source`](std::error::Error::source) chain and returns
/// the status of the first [`Error`] found, so an `Error` wrapped inside
/// another error type still decides the response status.
pub fn status_code_of(err: &(dyn StdError + 'static)) -> Option<StatusCode> {
    let mut current = Some(err);
    while let Some(e) = current {
        if let Some(coded) = e.downcast_ref::<Error>() {
            return Some(coded.status());
        }
        current = e.source();
    }
    None
}

/// Failure of the bundled [`Server`](crate::Server).
#[derive(Debug, thiserror::Error)]
pub enum ServeError {
    #[error("invalid bind address `{addr}`: {source}")]
    Addr {
        addr: String,
        #[source]
        source: std::net::AddrParseError,
    },

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}
