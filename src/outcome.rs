//! Method return values.
//!
//! What a method returns decides its return shape, and so whether it is
//! exposed at all and how its result is written:
//!
//! | Return type          | Shapes                | Response                          |
//! |----------------------|-----------------------|-----------------------------------|
//! | `()`                 | none                  | `204`                             |
//! | `V`                  | `[V]`                 | `200` + body                      |
//! | `Result<(), E>`      | `[Error]`             | `204`, or error                   |
//! | `Result<V, E>`       | `[V, Error]`          | `200` + body, or error            |
//! | `(A, B)`, `(A, B, C)`| `[A, B]`, `[A, B, C]` | never exposed                     |
//!
//! `V` is any [`Value`]: [`Json<T>`] or `serde_json::Value` for a JSON
//! document, `Vec<u8>` or `Bytes` for raw bytes. `E` is anything that
//! converts into a [`BoxError`].

use std::ops::Deref;

use bytes::Bytes;
use serde::Serialize;

use crate::error::BoxError;
use crate::shape::ValueShape;

/// A return value serialized as a JSON document.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Json<T>(pub T);

impl<T> Json<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for Json<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

/// A serializable result waiting to be written.
#[doc(hidden)]
pub trait Document: Send {
    fn to_json(&self) -> serde_json::Result<Vec<u8>>;
}

impl<T: Serialize + Send> Document for T {
    fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}

/// A successful result value.
#[doc(hidden)]
pub enum Body {
    Bytes(Bytes),
    Document(Box<dyn Document>),
}

/// The values a method invocation produced.
#[doc(hidden)]
pub enum Outcome {
    Empty,
    Value(Body),
    Error(Option<BoxError>),
    Pair(Result<Body, BoxError>),
    Values(Vec<Body>),
}

/// A single return value.
pub trait Value: private::Sealed + Send + 'static {
    #[doc(hidden)]
    const SHAPE: ValueShape;

    #[doc(hidden)]
    fn into_body(self) -> Body;
}

/// Implemented for every return type a method may have.
pub trait Returns: private::Sealed + 'static {
    #[doc(hidden)]
    fn shapes() -> Vec<ValueShape>;

    #[doc(hidden)]
    fn into_outcome(self) -> Outcome;
}

mod private {
    pub trait Sealed {}
}

// ── Values ────────────────────────────────────────────────────────────────────

impl<T: Serialize + Send + 'static> private::Sealed for Json<T> {}

impl<T: Serialize + Send + 'static> Value for Json<T> {
    const SHAPE: ValueShape = ValueShape::Document;

    fn into_body(self) -> Body {
        Body::Document(Box::new(self.0))
    }
}

impl private::Sealed for serde_json::Value {}

impl Value for serde_json::Value {
    const SHAPE: ValueShape = ValueShape::Document;

    fn into_body(self) -> Body {
        Body::Document(Box::new(self))
    }
}

impl private::Sealed for Vec<u8> {}

impl Value for Vec<u8> {
    const SHAPE: ValueShape = ValueShape::Bytes;

    fn into_body(self) -> Body {
        Body::Bytes(Bytes::from(self))
    }
}

impl private::Sealed for Bytes {}

impl Value for Bytes {
    const SHAPE: ValueShape = ValueShape::Bytes;

    fn into_body(self) -> Body {
        Body::Bytes(self)
    }
}

// ── Return types ──────────────────────────────────────────────────────────────

impl private::Sealed for () {}

impl Returns for () {
    fn shapes() -> Vec<ValueShape> { Vec::new() }

    fn into_outcome(self) -> Outcome { Outcome::Empty }
}

impl<V: Value> Returns for V {
    fn shapes() -> Vec<ValueShape> { vec![V::SHAPE] }

    fn into_outcome(self) -> Outcome { Outcome::Value(self.into_body()) }
}

impl<E: Into<BoxError> + 'static> private::Sealed for Result<(), E> {}

impl<E: Into<BoxError> + 'static> Returns for Result<(), E> {
    fn shapes() -> Vec<ValueShape> { vec![ValueShape::Error] }

    fn into_outcome(self) -> Outcome {
        Outcome::Error(self.err().map(Into::into))
    }
}

impl<V: Value, E: Into<BoxError> + 'static> private::Sealed for Result<V, E> {}

impl<V: Value, E: Into<BoxError> + 'static> Returns for Result<V, E> {
    fn shapes() -> Vec<ValueShape> { vec![V::SHAPE, ValueShape::Error] }

    fn into_outcome(self) -> Outcome {
        Outcome::Pair(self.map(Value::into_body).map_err(Into::into))
    }
}

impl<A: Value, B: Value> private::Sealed for (A, B) {}

impl<A: Value, B: Value> Returns for (A, B) {
    fn shapes() -> Vec<ValueShape> { vec![A::SHAPE, B::SHAPE] }

    fn into_outcome(self) -> Outcome {
        Outcome::Values(vec![self.0.into_body(), self.1.into_body()])
    }
}

impl<A: Value, B: Value, C: Value> private::Sealed for (A, B, C) {}

impl<A: Value, B: Value, C: Value> Returns for (A, B, C) {
    fn shapes() -> Vec<ValueShape> { vec![A::SHAPE, B::SHAPE, C::SHAPE] }

    fn into_outcome(self) -> Outcome {
        Outcome::Values(vec![self.0.into_body(), self.1.into_body(), self.2.into_body()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shapes_of_return_types() {
        assert!(<()>::shapes().is_empty());
        assert_eq!(<Json<u8>>::shapes(), [ValueShape::Document]);
        assert_eq!(<Vec<u8>>::shapes(), [ValueShape::Bytes]);
        assert_eq!(<Result<(), BoxError>>::shapes(), [ValueShape::Error]);
        assert_eq!(
            <Result<Bytes, std::io::Error>>::shapes(),
            [ValueShape::Bytes, ValueShape::Error],
        );
        assert_eq!(
            <(Json<u8>, Vec<u8>)>::shapes(),
            [ValueShape::Document, ValueShape::Bytes],
        );
        assert_eq!(<(Bytes, Bytes, Bytes)>::shapes().len(), 3);
    }

    #[test]
    fn ok_unit_result_has_no_error() {
        let outcome = Ok::<(), BoxError>(()).into_outcome();
        assert!(matches!(outcome, Outcome::Error(None)));
    }

    #[test]
    fn err_result_discards_value() {
        let outcome = Err::<Json<u8>, _>("boom").into_outcome();
        match outcome {
            Outcome::Pair(Err(err)) => assert_eq!(err.to_string(), "boom"),
            _ => panic!("expected an error pair"),
        }
    }

    #[test]
    fn document_serializes_inner_value() {
        let Outcome::Value(Body::Document(doc)) = Json(vec![1, 2]).into_outcome() else {
            panic!("expected a document");
        };
        assert_eq!(doc.to_json().unwrap(), b"[1,2]");
    }
}
