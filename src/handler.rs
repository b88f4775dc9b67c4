//! The request handler.
//!
//! # What happens to a request
//!
//! ```text
//! http::Request ──buffer body──▶ Request
//!        ↓ for each exposed method, in registration order
//! matcher.matches(&req, name, data shapes)
//!        ├─ NoMatch      → next method (none left → 404)
//!        ├─ Rejected(e)  → error response, method not called
//!        └─ Matched(args)
//!               ↓ bind Context / Request / Data<T> in declared order
//!        method.invoke(&target, args) → Outcome → Response
//! ```
//!
//! The method table is built once and never changes, so a [`Handler`] is
//! shared across connections and requests without locking. Whatever
//! synchronization the target needs is its own business.

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Body;
use tracing::{debug, warn};

use crate::encode;
use crate::error::{BoxError, Error};
use crate::matcher::{DefaultMatcher, Match, Matcher};
use crate::method::{ExposedMethod, Expose, Methods};
use crate::param::Binder;
use crate::request::Request;
use crate::response::Response;

/// Serves the methods of a target object over HTTP.
///
/// ```rust,no_run
/// use structhttp::{Data, Expose, Handler, Json, Methods, Server};
///
/// struct Calculator;
///
/// impl Calculator {
///     fn double(&self, n: Data<i64>) -> Json<i64> { Json(n.0 * 2) }
/// }
///
/// impl Expose for Calculator {
///     fn expose(methods: &mut Methods<Self>) {
///         methods.add("Double", Calculator::double);
///     }
/// }
///
/// # async fn run() -> Result<(), structhttp::ServeError> {
/// // curl -X POST localhost:3000/Double -d 21  →  42
/// Server::bind("0.0.0.0:3000").serve(Handler::new(Calculator)).await
/// # }
/// ```
pub struct Handler<T> {
    target: Arc<T>,
    methods: Arc<[ExposedMethod<T>]>,
    matcher: Arc<dyn Matcher>,
}

impl<T: Expose> Handler<T> {
    /// A handler for `target`'s methods, using the [`DefaultMatcher`].
    pub fn new(target: T) -> Self {
        Self::builder(Arc::new(target)).build()
    }

    /// Like [`new`](Self::new), for a target the caller keeps a handle to.
    pub fn shared(target: Arc<T>) -> Self {
        Self::builder(target).build()
    }

    pub fn builder(target: Arc<T>) -> HandlerBuilder<T> {
        let mut methods = Methods::new();
        T::expose(&mut methods);
        HandlerBuilder { target, methods, matcher: Arc::new(DefaultMatcher) }
    }
}

impl<T: Send + Sync + 'static> Handler<T> {
    /// A handler for an explicit method table, for targets that do not
    /// implement [`Expose`] or need more than one table.
    pub fn from_methods(target: Arc<T>, methods: Methods<T>, matcher: impl Matcher) -> Self {
        HandlerBuilder { target, methods, matcher: Arc::new(matcher) }.build()
    }

    /// Names of the exposed methods, in the order they are tried.
    pub fn routes(&self) -> impl Iterator<Item = &str> {
        self.methods.iter().map(ExposedMethod::name)
    }

    pub fn target(&self) -> &Arc<T> {
        &self.target
    }

    /// Routes one buffered request to a method and encodes its result.
    ///
    /// # Panics
    ///
    /// Panics when the matcher returns a different number of arguments than
    /// the matched method has data parameters, or an argument of the wrong
    /// type, and when a successful result cannot be serialized.
    pub fn dispatch(&self, request: &Request) -> Response {
        for method in self.methods.iter() {
            let name = method.name();
            match self.matcher.matches(request, name, method.extra()) {
                Match::NoMatch => continue,
                Match::Rejected(err) => {
                    warn!(method = name, error = %err, "request rejected");
                    return encode::error(&err);
                }
                Match::Matched(args) => {
                    let expected = method.extra().len();
                    if args.len() < expected {
                        panic!("not enough arguments to {name} method");
                    }
                    if args.len() > expected {
                        panic!("too many arguments to {name} method");
                    }
                    debug!(method = name, request_id = %request.context().request_id(), "dispatching");
                    let mut binder = Binder::new(request, name, args);
                    let outcome = method.invoke(&self.target, &mut binder);
                    return encode::outcome(name, outcome);
                }
            }
        }

        debug!(method = %request.method(), path = request.path(), "no method matched");
        encode::not_found()
    }

    /// Buffers the request body, then [`dispatch`](Self::dispatch)es.
    ///
    /// A [`Context`](crate::Context) in the request extensions is handed to
    /// methods; otherwise a new one is made. A body that fails to arrive is
    /// answered with `400 Bad Request`.
    pub async fn handle<B>(&self, req: http::Request<B>) -> http::Response<Full<Bytes>>
    where
        B: Body,
        B::Error: Into<BoxError>,
    {
        let (parts, body) = req.into_parts();
        let body = match body.collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(err) => {
                let err: BoxError = Error::bad_request(ReadError(err.into())).into();
                debug!(method = %parts.method, path = parts.uri.path(), error = %err, "request body unreadable");
                return encode::error(&err).into();
            }
        };

        let request = Request::from_http(http::Request::from_parts(parts, body));
        self.dispatch(&request).into()
    }
}

impl<T> Clone for Handler<T> {
    fn clone(&self) -> Self {
        Self {
            target: Arc::clone(&self.target),
            methods: Arc::clone(&self.methods),
            matcher: Arc::clone(&self.matcher),
        }
    }
}

impl<T, B> hyper::service::Service<http::Request<B>> for Handler<T>
where
    T: Send + Sync + 'static,
    B: Body + Send + 'static,
    B::Data: Send,
    B::Error: Into<BoxError>,
{
    type Response = http::Response<Full<Bytes>>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Infallible>> + Send>>;

    fn call(&self, req: http::Request<B>) -> Self::Future {
        let handler = self.clone();
        Box::pin(async move { Ok(handler.handle(req).await) })
    }
}

/// The request body could not be read.
#[derive(Debug, thiserror::Error)]
#[error("failed to read request body: {0}")]
struct ReadError(#[source] BoxError);

// ── HandlerBuilder ────────────────────────────────────────────────────────────

/// Configures a [`Handler`]. Obtain via [`Handler::builder`].
pub struct HandlerBuilder<T> {
    target: Arc<T>,
    methods: Methods<T>,
    matcher: Arc<dyn Matcher>,
}

impl<T: Send + Sync + 'static> HandlerBuilder<T> {
    /// Replaces the [`DefaultMatcher`].
    pub fn matcher(mut self, matcher: impl Matcher) -> Self {
        self.matcher = Arc::new(matcher);
        self
    }

    pub fn build(self) -> Handler<T> {
        let registered = self.methods.len();
        let methods: Arc<[ExposedMethod<T>]> = self.methods.into_exposed().into();
        for method in methods.iter() {
            debug!(method = method.name(), params = ?method.params(), "method exposed");
        }
        debug!(registered, exposed = methods.len(), "handler built");
        Handler { target: self.target, methods, matcher: self.matcher }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use http::{Method, StatusCode};

    use super::*;
    use crate::outcome::Json;
    use crate::param::Data;
    use crate::shape::{Argument, DataShape};

    #[derive(Default)]
    struct Counter {
        calls: AtomicUsize,
    }

    impl Counter {
        fn incr(&self) -> Json<usize> {
            Json(self.calls.fetch_add(1, Ordering::SeqCst) + 1)
        }

        fn add(&self, n: Data<usize>) -> Json<usize> {
            Json(self.calls.fetch_add(n.0, Ordering::SeqCst) + n.0)
        }
    }

    impl Expose for Counter {
        fn expose(methods: &mut Methods<Self>) {
            methods.add("Incr", Counter::incr).add("Add", Counter::add);
        }
    }

    fn post(path: &str, body: &'static str) -> Request {
        Request::from_http(http::Request::post(path).body(Bytes::from_static(body.as_bytes())).unwrap())
    }

    #[test]
    fn routes_in_registration_order() {
        let handler = Handler::new(Counter::default());
        assert_eq!(handler.routes().collect::<Vec<_>>(), ["Incr", "Add"]);
    }

    #[test]
    fn dispatch_calls_target() {
        let handler = Handler::new(Counter::default());
        handler.dispatch(&post("/Incr", ""));
        let res = handler.dispatch(&post("/Add", "5"));

        assert_eq!(res.status_code(), StatusCode::OK);
        assert_eq!(res.body().as_ref(), b"6\n");
        assert_eq!(handler.target().calls.load(Ordering::SeqCst), 6);
    }

    #[test]
    fn clones_share_the_target() {
        let handler = Handler::new(Counter::default());
        let clone = handler.clone();
        clone.dispatch(&post("/Incr", ""));
        assert_eq!(handler.target().calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn rejection_stops_dispatch() {
        let handler = Handler::new(Counter::default());
        let res = handler.dispatch(&post("/Add", "nope"));
        assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(handler.target().calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    #[should_panic(expected = "too many arguments to Incr method")]
    fn too_many_arguments_panics() {
        let matcher = |_: &Request, _: &str, _: &[DataShape]| Match::Matched(vec![Argument::new(1_usize)]);
        let handler = Handler::builder(Arc::new(Counter::default())).matcher(matcher).build();
        handler.dispatch(&post("/Incr", ""));
    }

    #[test]
    #[should_panic(expected = "not enough arguments to Add method")]
    fn not_enough_arguments_panics() {
        let matcher = |_: &Request, name: &str, _: &[DataShape]| {
            if name == "Add" { Match::Matched(Vec::new()) } else { Match::NoMatch }
        };
        let handler = Handler::builder(Arc::new(Counter::default())).matcher(matcher).build();
        handler.dispatch(&post("/Add", ""));
    }

    #[tokio::test]
    async fn handle_buffers_body() {
        let handler = Handler::new(Counter::default());
        let req = http::Request::builder()
            .method(Method::POST)
            .uri("/Add")
            .body(Full::new(Bytes::from_static(b"3")))
            .unwrap();

        let res = handler.handle(req).await;
        assert_eq!(res.status(), StatusCode::OK);
        let body = res.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(body.as_ref(), b"3\n");
    }

    #[tokio::test]
    async fn works_as_hyper_service() {
        use hyper::service::Service;

        let handler = Handler::new(Counter::default());
        let req = http::Request::post("/Nope").body(Full::new(Bytes::new())).unwrap();
        let res = handler.call(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    /// A body whose transport fails on the first read.
    struct Broken;

    impl Body for Broken {
        type Data = Bytes;
        type Error = std::io::Error;

        fn poll_frame(
            self: Pin<&mut Self>,
            _: &mut std::task::Context<'_>,
        ) -> std::task::Poll<Option<Result<hyper::body::Frame<Bytes>, Self::Error>>> {
            std::task::Poll::Ready(Some(Err(std::io::Error::other("reset by peer"))))
        }
    }

    #[tokio::test]
    async fn unreadable_body_is_bad_request() {
        let handler = Handler::new(Counter::default());
        let req = http::Request::post("/Add").body(Broken).unwrap();

        let res = handler.handle(req).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(res.headers()[http::header::CONTENT_TYPE], "application/json");
        let body = res.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(body.as_ref(), b"{\"error\":\"failed to read request body: reset by peer\"}\n");
        assert_eq!(handler.target().calls.load(Ordering::SeqCst), 0);
    }

    // ── Log events ────────────────────────────────────────────────────────────

    type Events = Arc<std::sync::Mutex<Vec<Vec<(String, String)>>>>;

    /// Records the fields of every event it sees.
    struct Recorder(Events);

    struct Fields<'a>(&'a mut Vec<(String, String)>);

    impl tracing::field::Visit for Fields<'_> {
        fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
            self.0.push((field.name().to_owned(), format!("{value:?}")));
        }
    }

    impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for Recorder {
        fn on_event(&self, event: &tracing::Event<'_>, _: tracing_subscriber::layer::Context<'_, S>) {
            let mut fields = Vec::new();
            event.record(&mut Fields(&mut fields));
            self.0.lock().unwrap().push(fields);
        }
    }

    fn recording() -> (Events, tracing::subscriber::DefaultGuard) {
        use tracing_subscriber::layer::SubscriberExt;

        let events = Events::default();
        let subscriber = tracing_subscriber::registry().with(Recorder(Arc::clone(&events)));
        (events, tracing::subscriber::set_default(subscriber))
    }

    fn field<'a>(event: &'a [(String, String)], name: &str) -> Option<&'a str> {
        event.iter().find(|(n, _)| n == name).map(|(_, v)| v.as_str())
    }

    #[test]
    fn rejection_is_logged_once() {
        let handler = Handler::new(Counter::default());
        let (events, _guard) = recording();

        let res = handler.dispatch(&post("/Add", "nope"));
        assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);

        let events = events.lock().unwrap();
        assert_eq!(events.len(), 1, "{events:?}");
        assert_eq!(field(&events[0], "method"), Some("\"Add\""));
    }

    #[tokio::test]
    async fn unreadable_body_is_logged_with_request_line() {
        let handler = Handler::new(Counter::default());
        let (events, _guard) = recording();

        let req = http::Request::post("/Add").body(Broken).unwrap();
        handler.handle(req).await;

        let events = events.lock().unwrap();
        assert_eq!(events.len(), 1, "{events:?}");
        assert_eq!(field(&events[0], "method"), Some("POST"));
        assert_eq!(field(&events[0], "path"), Some("\"/Add\""));
    }
}
