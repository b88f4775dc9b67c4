//! Incoming HTTP request type.

use bytes::Bytes;
use http::{HeaderMap, Method, Uri};

use crate::context::Context;

/// An incoming HTTP request with its body fully buffered.
///
/// This is what a [`Matcher`](crate::Matcher) inspects, and what a method
/// receives when it declares a `Request` parameter. Cloning is cheap: the
/// body is reference-counted.
#[derive(Clone, Debug)]
pub struct Request {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
    context: Context,
}

impl Request {
    /// Converts a buffered `http::Request`.
    ///
    /// The [`Context`] is taken from the request extensions when the host put
    /// one there; otherwise a new one is created.
    pub fn from_http(req: http::Request<Bytes>) -> Self {
        let (mut parts, body) = req.into_parts();
        let context = parts.extensions.remove::<Context>().unwrap_or_default();
        Self {
            method: parts.method,
            uri: parts.uri,
            headers: parts.headers,
            body,
            context,
        }
    }

    pub fn method(&self) -> &Method { &self.method }
    pub fn uri(&self) -> &Uri { &self.uri }
    pub fn path(&self) -> &str { self.uri.path() }
    pub fn headers(&self) -> &HeaderMap { &self.headers }
    pub fn body(&self) -> &Bytes { &self.body }
    pub fn context(&self) -> &Context { &self.context }

    /// Case-insensitive header lookup. Values that are not visible ASCII
    /// are treated as absent.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}
