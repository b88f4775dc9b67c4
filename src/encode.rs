//! Writing invocation outcomes as responses.
//!
//! | Outcome                         | Response                                 |
//! |---------------------------------|------------------------------------------|
//! | nothing, or a `None` error      | `204 No Content`                         |
//! | an error                        | its status (default 500), JSON error body|
//! | raw bytes                       | `200`, bytes verbatim                    |
//! | any other value                 | `200`, JSON document + `\n`              |
//!
//! Every error response has the body `{"error":"<message>"}\n`.

use http::header::{self, HeaderValue};
use http::StatusCode;
use serde::Serialize;
use tracing::{debug, error};

use crate::error::{status_code_of, BoxError};
use crate::outcome::{Body, Outcome};
use crate::response::Response;

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

/// Writes what `method` returned.
///
/// # Panics
///
/// Panics if a successful result cannot be serialized. That is a defect in
/// the method's declared return type, not a condition a client can cause.
pub(crate) fn outcome(method: &str, outcome: Outcome) -> Response {
    match outcome {
        Outcome::Empty | Outcome::Error(None) => Response::status(StatusCode::NO_CONTENT),
        Outcome::Error(Some(err)) | Outcome::Pair(Err(err)) => {
            let res = error(&err);
            if res.status_code().is_server_error() {
                error!(method, status = %res.status_code(), error = %err, "method failed");
            } else {
                debug!(method, status = %res.status_code(), error = %err, "method failed");
            }
            res
        }
        Outcome::Value(body) | Outcome::Pair(Ok(body)) => success(method, body),
        Outcome::Values(values) => match values.into_iter().next() {
            Some(body) => success(method, body),
            None => Response::status(StatusCode::NO_CONTENT),
        },
    }
}

fn success(method: &str, body: Body) -> Response {
    match body {
        Body::Bytes(bytes) => Response::bytes(bytes),
        Body::Document(doc) => match doc.to_json() {
            Ok(mut json) => {
                json.push(b'\n');
                Response::json(json)
            }
            Err(err) => {
                error!(method, error = %err, "failed to encode result");
                panic!("failed to encode result of {method} method: {err}");
            }
        },
    }
}

/// Writes an error. Logging is left to the caller.
///
/// The status comes from the first [`Error`](crate::Error) on the error's
/// source chain, or is `500 Internal Server Error`.
pub(crate) fn error(err: &BoxError) -> Response {
    let status = status_code_of(err.as_ref()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    error_response(status, &err.to_string())
}

/// `404 Not Found` for a request no method matched.
pub(crate) fn not_found() -> Response {
    error_response(StatusCode::NOT_FOUND, "404 page not found")
}

fn error_response(status: StatusCode, message: &str) -> Response {
    let mut body = serde_json::to_vec(&ErrorBody { error: message })
        .expect("a struct of one string always serializes");
    body.push(b'\n');
    Response::builder()
        .status(status)
        .header(header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"))
        .json(body)
}
