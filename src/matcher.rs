//! Request-to-method matching.
//!
//! For each incoming request the [`Handler`](crate::Handler) asks its
//! [`Matcher`] about every exposed method in turn, until one answers
//! [`Match::Matched`] or [`Match::Rejected`].
//!
//! The matcher only sees a method's application-data parameters
//! ([`DataShape`]s); `Context` and `Request` parameters are filled in by the
//! handler.

use http::Method;

use crate::error::{BoxError, Error};
use crate::request::Request;
use crate::shape::{Argument, DataShape};

/// A matcher's answer for one request and one method.
#[derive(Debug)]
pub enum Match {
    /// The request is not for this method; try the next one.
    NoMatch,
    /// The request is for this method. One argument per data parameter, in
    /// declaration order, each of exactly the declared type.
    Matched(Vec<Argument>),
    /// The request is for this method but its arguments could not be
    /// extracted. The error is written as the response; the method is not
    /// called.
    Rejected(BoxError),
}

/// Decides which method a request targets and extracts its arguments.
///
/// Closures with the same signature as [`Matcher::matches`] are matchers:
///
/// ```rust
/// use structhttp::{Argument, DataShape, DefaultMatcher, Match, Matcher, Request};
///
/// // `GET /thing/{id}` goes to `GetThing`, everything else to the default.
/// let matcher = |req: &Request, method: &str, extra: &[DataShape]| {
///     if method == "GetThing" && req.method() == http::Method::GET {
///         return match req.path().strip_prefix("/thing/") {
///             Some(id) if extra.len() == 1 => Match::Matched(vec![Argument::new(id.to_owned())]),
///             _ => Match::NoMatch,
///         };
///     }
///     DefaultMatcher.matches(req, method, extra)
/// };
/// ```
pub trait Matcher: Send + Sync + 'static {
    fn matches(&self, request: &Request, method: &str, extra: &[DataShape]) -> Match;
}

impl<F> Matcher for F
where
    F: Fn(&Request, &str, &[DataShape]) -> Match + Send + Sync + 'static,
{
    fn matches(&self, request: &Request, method: &str, extra: &[DataShape]) -> Match {
        (self)(request, method, extra)
    }
}

/// The built-in matching convention.
///
/// - The request must be `POST /<MethodName>`; the name is compared exactly,
///   and the leading slash may be omitted.
/// - A method without data parameters matches with no arguments.
/// - A method with one data parameter gets the request body decoded as JSON
///   into the parameter's type. A body that does not decode rejects the
///   request with `400 Bad Request`.
/// - A method with more than one data parameter never matches.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultMatcher;

impl Matcher for DefaultMatcher {
    fn matches(&self, request: &Request, method: &str, extra: &[DataShape]) -> Match {
        let path = request.path();
        if request.method() != Method::POST || path.strip_prefix('/').unwrap_or(path) != method {
            return Match::NoMatch;
        }

        match extra {
            [] => Match::Matched(Vec::new()),
            [shape] => match shape.decode_json(request.body()) {
                Ok(arg) => Match::Matched(vec![arg]),
                Err(err) => Match::Rejected(Error::bad_request(DecodeError(err)).into()),
            },
            _ => Match::NoMatch,
        }
    }
}

/// The request body is not a valid document for the parameter.
#[derive(Debug, thiserror::Error)]
#[error("failed to decode request body: {0}")]
pub struct DecodeError(#[source] pub serde_json::Error);
