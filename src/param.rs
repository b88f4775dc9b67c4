//! Method parameters and argument binding.
//!
//! A registered method's parameters are each one of three kinds, decided by
//! the parameter's type:
//!
//! | Type       | Shape                 | Value                          |
//! |------------|-----------------------|--------------------------------|
//! | `Context`  | [`ParamShape::Context`] | the request's [`Context`]    |
//! | `Request`  | [`ParamShape::Request`] | the [`Request`] itself       |
//! | `Data<T>`  | [`ParamShape::Data`]    | next argument from the matcher |

use std::ops::Deref;
use std::vec;

use serde::de::DeserializeOwned;

use crate::context::Context;
use crate::request::Request;
use crate::shape::{Argument, DataShape, ParamShape};

/// An application-data parameter: a value the [`Matcher`](crate::Matcher)
/// extracts from the request. The default matcher decodes it from the JSON
/// request body.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Data<T>(pub T);

impl<T> Data<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for Data<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

/// Hands out parameter values while a method's argument list is built.
#[doc(hidden)]
pub struct Binder<'a> {
    request: &'a Request,
    method: &'a str,
    args: vec::IntoIter<Argument>,
    position: usize,
}

impl<'a> Binder<'a> {
    pub(crate) fn new(request: &'a Request, method: &'a str, args: Vec<Argument>) -> Self {
        Self { request, method, args: args.into_iter(), position: 0 }
    }

    fn next_arg<T: 'static>(&mut self, shape: &DataShape) -> T {
        let position = self.position;
        self.position += 1;
        let Some(arg) = self.args.next() else {
            panic!("not enough arguments to {} method", self.method);
        };
        match arg.downcast::<T>() {
            Ok(value) => value,
            Err(_) => panic!(
                "argument {position} to {} method is not a {}",
                self.method,
                shape.type_name(),
            ),
        }
    }
}

/// Implemented for every type a method may take as a parameter.
///
/// Sealed: only `Context`, `Request` and `Data<T>` qualify.
pub trait Param: private::Sealed + Sized + 'static {
    #[doc(hidden)]
    fn shape() -> ParamShape;

    #[doc(hidden)]
    fn bind(binder: &mut Binder<'_>) -> Self;
}

mod private {
    pub trait Sealed {}
}

impl private::Sealed for Context {}

impl Param for Context {
    fn shape() -> ParamShape { ParamShape::Context }

    fn bind(binder: &mut Binder<'_>) -> Self {
        binder.request.context().clone()
    }
}

impl private::Sealed for Request {}

impl Param for Request {
    fn shape() -> ParamShape { ParamShape::Request }

    fn bind(binder: &mut Binder<'_>) -> Self {
        binder.request.clone()
    }
}

impl<T: DeserializeOwned + Send + 'static> private::Sealed for Data<T> {}

impl<T: DeserializeOwned + Send + 'static> Param for Data<T> {
    fn shape() -> ParamShape { ParamShape::Data(DataShape::of::<T>()) }

    fn bind(binder: &mut Binder<'_>) -> Self {
        Data(binder.next_arg::<T>(&DataShape::of::<T>()))
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;

    fn request() -> Request {
        Request::from_http(http::Request::post("/Echo").body(Bytes::from_static(b"hi")).unwrap())
    }

    #[test]
    fn shapes_follow_types() {
        assert!(matches!(Context::shape(), ParamShape::Context));
        assert!(matches!(Request::shape(), ParamShape::Request));
        let shape = Data::<u64>::shape();
        assert!(shape.data().is_some_and(|d| d.is::<u64>()));
    }

    #[test]
    fn binds_in_order() {
        let req = request();
        let mut binder = Binder::new(&req, "Echo", vec![Argument::new(1_u64), Argument::new("x".to_owned())]);

        let ctx = Context::bind(&mut binder);
        let first = Data::<u64>::bind(&mut binder);
        let raw = Request::bind(&mut binder);
        let second = Data::<String>::bind(&mut binder);

        assert_eq!(ctx.request_id(), req.context().request_id());
        assert_eq!(first, Data(1));
        assert_eq!(raw.body().as_ref(), b"hi");
        assert_eq!(second.into_inner(), "x");
    }

    #[test]
    #[should_panic(expected = "not enough arguments to Echo method")]
    fn missing_argument_panics() {
        let req = request();
        let mut binder = Binder::new(&req, "Echo", Vec::new());
        Data::<u64>::bind(&mut binder);
    }

    #[test]
    #[should_panic(expected = "argument 0 to Echo method is not a")]
    fn mistyped_argument_panics() {
        let req = request();
        let mut binder = Binder::new(&req, "Echo", vec![Argument::new("1".to_owned())]);
        Data::<u64>::bind(&mut binder);
    }
}
