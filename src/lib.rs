//! # structhttp
//!
//! Serve an object's methods over HTTP. You write the methods; structhttp
//! does the routing, decoding and encoding.
//!
//! ## The contract
//!
//! A type lists its methods once, in [`Expose::expose`]. Each method's
//! signature says everything the handler needs to know:
//!
//! - **Parameters** are [`Context`] (the request's execution context),
//!   [`Request`] (the request itself) or [`Data<T>`] (a value taken from the
//!   request, by default the JSON body).
//! - **Return values** are nothing, a [`Value`], `Result<(), E>` or
//!   `Result<V, E>`. Methods that return anything else are never exposed.
//! - **Errors** answer `500`, or the status carried by an [`Error`].
//!
//! By default a method named `Name` answers `POST /Name`. Pass a custom
//! [`Matcher`] to route differently.
//!
//! What structhttp intentionally leaves out: middleware, route groups,
//! static files and schema validation. Compose with hyper or a proxy for those.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use http::StatusCode;
//! use serde::{Deserialize, Serialize};
//! use structhttp::{Context, Data, Error, Expose, Handler, Json, Methods, Server};
//!
//! #[derive(Deserialize, Serialize)]
//! struct Greeting {
//!     name: String,
//! }
//!
//! struct Greeter;
//!
//! impl Greeter {
//!     // POST /Hello  {"name":"alice"}  →  200 {"name":"hello, alice"}
//!     fn hello(&self, _ctx: Context, req: Data<Greeting>) -> Result<Json<Greeting>, Error> {
//!         if req.name.is_empty() {
//!             return Err(Error::new(StatusCode::UNPROCESSABLE_ENTITY, "name is empty"));
//!         }
//!         Ok(Json(Greeting { name: format!("hello, {}", req.name) }))
//!     }
//!
//!     // POST /Ping  →  204
//!     fn ping(&self) {}
//! }
//!
//! impl Expose for Greeter {
//!     fn expose(methods: &mut Methods<Self>) {
//!         methods.add("Hello", Greeter::hello).add("Ping", Greeter::ping);
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     Server::bind("0.0.0.0:3000").serve(Handler::new(Greeter)).await.unwrap();
//! }
//! ```

mod context;
mod encode;
mod error;
mod handler;
mod matcher;
mod method;
mod outcome;
mod param;
mod request;
mod response;
mod server;
mod shape;

pub use context::Context;
pub use error::{status_code_of, BoxError, Error, ServeError};
pub use handler::{Handler, HandlerBuilder};
pub use matcher::{DecodeError, DefaultMatcher, Match, Matcher};
pub use method::{is_exposable, Expose, Method, Methods};
pub use outcome::{Json, Returns, Value};
pub use param::{Data, Param};
pub use request::Request;
pub use response::{ContentType, Response, ResponseBuilder};
pub use server::Server;
pub use shape::{Argument, DataShape, ParamShape, ValueShape};
