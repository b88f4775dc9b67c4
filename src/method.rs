//! Method registration, type erasure and the eligibility filter.
//!
//! Rust has no runtime reflection, so a target type lists its methods once,
//! in [`Expose::expose`]. Each registration records the method's parameter
//! and return shapes from its signature and stores the method behind a
//! uniform, type-erased interface:
//!
//! ```text
//! fn inputs(&self, ctx: Context, args: Data<Args>) -> Result<Json<Args>, Error>
//!        ↓ methods.add("Inputs", App::inputs)
//! Method<App, (Context, Data<Args>)>         ← blanket impl, shapes recorded
//!        ↓
//! Box::new(FnMethod(App::inputs))            ← stored as Box<dyn ErasedMethod<App>>
//!        ↓  at request time
//! method.invoke(&app, &mut binder)           ← one virtual call
//!        ↓
//! App::inputs(&app, ctx, args).into_outcome()
//! ```
//!
//! When a [`Handler`](crate::Handler) is built, [`is_exposable`] drops every
//! method whose return shape cannot be written as a response.

use std::marker::PhantomData;

use tracing::debug;

use crate::outcome::{Outcome, Returns};
use crate::param::{Binder, Param};
use crate::shape::{DataShape, ParamShape, ValueShape};

/// Implemented for every function usable as an exposed method.
///
/// Satisfied automatically by any `Fn(&T, P1, .., Pn) -> R` with up to four
/// parameters, where each `Pi` is a [`Param`] and `R` is a
/// [`Returns`](crate::Returns). Plain methods taking `&self` qualify:
///
/// ```rust
/// use structhttp::{Context, Data, Json, Methods};
///
/// struct Greeter;
///
/// impl Greeter {
///     fn greet(&self, _ctx: Context, name: Data<String>) -> Json<String> {
///         Json(format!("hello, {}", name.0))
///     }
/// }
///
/// let mut methods = Methods::<Greeter>::new();
/// methods.add("Greet", Greeter::greet);
/// ```
///
/// `Args` is the parameter tuple; it only keeps the blanket impls apart.
pub trait Method<T, Args>: Send + Sync + 'static {
    #[doc(hidden)]
    fn params() -> Vec<ParamShape>;

    #[doc(hidden)]
    fn returns() -> Vec<ValueShape>;

    #[doc(hidden)]
    fn invoke(&self, target: &T, binder: &mut Binder<'_>) -> Outcome;
}

macro_rules! impl_method {
    ($($param:ident),*) => {
        impl<T, F, R, $($param,)*> Method<T, ($($param,)*)> for F
        where
            F: Fn(&T, $($param,)*) -> R + Send + Sync + 'static,
            R: Returns,
            $($param: Param,)*
        {
            fn params() -> Vec<ParamShape> {
                vec![$(<$param as Param>::shape(),)*]
            }

            fn returns() -> Vec<ValueShape> {
                R::shapes()
            }

            #[allow(non_snake_case, unused_variables)]
            fn invoke(&self, target: &T, binder: &mut Binder<'_>) -> Outcome {
                $(let $param = <$param as Param>::bind(binder);)*
                (self)(target, $($param,)*).into_outcome()
            }
        }
    };
}

impl_method!();
impl_method!(P1);
impl_method!(P1, P2);
impl_method!(P1, P2, P3);
impl_method!(P1, P2, P3, P4);

/// Object-safe view of a [`Method`], with its `Args` erased.
trait ErasedMethod<T>: Send + Sync {
    fn invoke(&self, target: &T, binder: &mut Binder<'_>) -> Outcome;
}

struct FnMethod<F, Args>(F, PhantomData<fn() -> Args>);

impl<T, F, Args> ErasedMethod<T> for FnMethod<F, Args>
where
    F: Method<T, Args>,
    Args: 'static,
{
    fn invoke(&self, target: &T, binder: &mut Binder<'_>) -> Outcome {
        self.0.invoke(target, binder)
    }
}

/// One registered method, before the eligibility filter.
struct Registered<T> {
    name: String,
    params: Vec<ParamShape>,
    returns: Vec<ValueShape>,
    method: Box<dyn ErasedMethod<T>>,
}

/// The methods a target type offers, in registration order.
///
/// Registration order is the order in which a [`Handler`](crate::Handler)
/// tries them against each request.
pub struct Methods<T> {
    entries: Vec<Registered<T>>,
}

impl<T: 'static> Methods<T> {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Registers `method` under `name`. Returns `self` for chaining.
    ///
    /// # Panics
    ///
    /// Panics if `name` is already registered.
    pub fn add<Args, F>(&mut self, name: &str, method: F) -> &mut Self
    where
        Args: 'static,
        F: Method<T, Args>,
    {
        if self.entries.iter().any(|e| e.name == name) {
            panic!("method `{name}` registered twice");
        }
        self.entries.push(Registered {
            name: name.to_owned(),
            params: F::params(),
            returns: F::returns(),
            method: Box::new(FnMethod(method, PhantomData)),
        });
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Applies the eligibility filter, keeping registration order.
    pub(crate) fn into_exposed(self) -> Vec<ExposedMethod<T>> {
        self.entries
            .into_iter()
            .filter_map(|entry| {
                if !is_exposable(&entry.returns) {
                    debug!(method = %entry.name, returns = ?entry.returns, "method not exposed: unsupported return shape");
                    return None;
                }
                let extra = entry.params.iter().filter_map(ParamShape::data).copied().collect();
                Some(ExposedMethod {
                    name: entry.name,
                    params: entry.params,
                    extra,
                    method: entry.method,
                })
            })
            .collect()
    }
}

impl<T: 'static> Default for Methods<T> {
    fn default() -> Self { Self::new() }
}

/// Implemented by types whose methods are served by a
/// [`Handler`](crate::Handler).
///
/// ```rust
/// use structhttp::{Expose, Json, Methods};
///
/// struct Clock;
///
/// impl Clock {
///     fn now(&self) -> Json<u64> { Json(0) }
/// }
///
/// impl Expose for Clock {
///     fn expose(methods: &mut Methods<Self>) {
///         methods.add("Now", Clock::now);
///     }
/// }
/// ```
pub trait Expose: Send + Sync + Sized + 'static {
    fn expose(methods: &mut Methods<Self>);
}

/// Whether a method with these return shapes can become an endpoint.
///
/// No values, or one value of any shape, are fine. Two values are fine when
/// the second is an error. Anything else is not.
pub fn is_exposable(returns: &[ValueShape]) -> bool {
    match returns {
        [] | [_] => true,
        [_, second] => second.is_error(),
        _ => false,
    }
}

/// A method that passed the filter.
pub(crate) struct ExposedMethod<T> {
    name: String,
    params: Vec<ParamShape>,
    extra: Vec<DataShape>,
    method: Box<dyn ErasedMethod<T>>,
}

impl<T> ExposedMethod<T> {
    pub(crate) fn name(&self) -> &str { &self.name }

    /// Shapes of the application-data parameters, in declaration order.
    pub(crate) fn extra(&self) -> &[DataShape] { &self.extra }

    pub(crate) fn params(&self) -> &[ParamShape] { &self.params }

    pub(crate) fn invoke(&self, target: &T, binder: &mut Binder<'_>) -> Outcome {
        self.method.invoke(target, binder)
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;
    use crate::context::Context;
    use crate::error::BoxError;
    use crate::outcome::Json;
    use crate::param::Data;
    use crate::request::Request;
    use crate::shape::Argument;

    struct App;

    impl App {
        fn no_result(&self) {}
        fn only_error(&self) -> Result<(), BoxError> { Ok(()) }
        fn only_result(&self) -> Json<u8> { Json(1) }
        fn pair(&self) -> Result<Bytes, BoxError> { Ok(Bytes::new()) }
        fn two_values(&self) -> (Json<u8>, Json<u8>) { (Json(1), Json(2)) }
        fn three_values(&self) -> (Bytes, Bytes, Bytes) { (Bytes::new(), Bytes::new(), Bytes::new()) }
        fn add(&self, _ctx: Context, a: Data<i64>, _req: Request, b: Data<i64>) -> Json<i64> {
            Json(a.0 + b.0)
        }
    }

    fn methods() -> Methods<App> {
        let mut methods = Methods::new();
        methods
            .add("NoResult", App::no_result)
            .add("OnlyError", App::only_error)
            .add("OnlyResult", App::only_result)
            .add("Pair", App::pair)
            .add("TwoValues", App::two_values)
            .add("ThreeValues", App::three_values)
            .add("Add", App::add);
        methods
    }

    #[test]
    fn filter_rules() {
        use ValueShape as S;

        assert!(is_exposable(&[]));
        assert!(is_exposable(&[S::Document]));
        assert!(is_exposable(&[S::Error]));
        assert!(is_exposable(&[S::Bytes, S::Error]));
        assert!(!is_exposable(&[S::Document, S::Bytes]));
        assert!(!is_exposable(&[S::Error, S::Document]));
        assert!(!is_exposable(&[S::Document, S::Document, S::Error]));
    }

    #[test]
    fn filter_drops_unsupported_returns_in_order() {
        let methods = methods();
        assert_eq!(methods.len(), 7);

        let exposed = methods.into_exposed();
        let names: Vec<_> = exposed.iter().map(ExposedMethod::name).collect();
        assert_eq!(names, ["NoResult", "OnlyError", "OnlyResult", "Pair", "Add"]);
    }

    #[test]
    fn extra_params_skip_context_and_request() {
        let exposed = methods().into_exposed();
        let add = exposed.iter().find(|m| m.name() == "Add").unwrap();

        assert_eq!(add.params().len(), 4);
        assert_eq!(add.extra().len(), 2);
        assert!(add.extra().iter().all(|s| s.is::<i64>()));
    }

    #[test]
    fn invoke_binds_declared_order() {
        let exposed = methods().into_exposed();
        let add = exposed.iter().find(|m| m.name() == "Add").unwrap();
        let req = Request::from_http(http::Request::new(Bytes::new()));
        let mut binder = Binder::new(&req, "Add", vec![Argument::new(40_i64), Argument::new(2_i64)]);

        let Outcome::Value(crate::outcome::Body::Document(doc)) = add.invoke(&App, &mut binder) else {
            panic!("expected a document");
        };
        assert_eq!(doc.to_json().unwrap(), b"42");
    }

    #[test]
    fn closures_register_too() {
        let mut methods = Methods::<App>::new();
        methods.add("Echo", |_: &App, body: Data<String>| Json(body.0));
        assert_eq!(methods.into_exposed().len(), 1);
    }

    #[test]
    #[should_panic(expected = "method `NoResult` registered twice")]
    fn duplicate_names_panic() {
        let mut methods = Methods::<App>::new();
        methods.add("NoResult", App::no_result).add("NoResult", App::no_result);
    }
}
