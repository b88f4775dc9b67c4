//! Declared shapes of method parameters and return values.
//!
//! Shapes are recorded when a method is registered, from its Rust signature.
//! The method filter reads return shapes; matchers read the data-parameter
//! shapes to decide what to extract from a request.

use std::any::{Any, TypeId};
use std::fmt;

use serde::de::DeserializeOwned;

/// Where a parameter gets its value from.
#[derive(Clone, Copy, Debug)]
pub enum ParamShape {
    /// Fed the request's [`Context`](crate::Context).
    Context,
    /// Fed the [`Request`](crate::Request) itself.
    Request,
    /// Fed a value extracted by the matcher.
    Data(DataShape),
}

impl ParamShape {
    pub fn data(&self) -> Option<&DataShape> {
        match self {
            Self::Data(shape) => Some(shape),
            _ => None,
        }
    }
}

/// The declared type of an application-data parameter.
#[derive(Clone, Copy)]
pub struct DataShape {
    type_name: &'static str,
    type_id: TypeId,
    decode: fn(&[u8]) -> serde_json::Result<Argument>,
}

impl DataShape {
    pub fn of<T: DeserializeOwned + Send + 'static>() -> Self {
        Self {
            type_name: std::any::type_name::<T>(),
            type_id: TypeId::of::<T>(),
            decode: |bytes| serde_json::from_slice::<T>(bytes).map(Argument::new),
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Whether the parameter is declared as `Data<T>`.
    pub fn is<T: 'static>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }

    /// Decodes a JSON document into an argument of the declared type.
    pub fn decode_json(&self, bytes: &[u8]) -> serde_json::Result<Argument> {
        (self.decode)(bytes)
    }
}

impl fmt::Debug for DataShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DataShape").field(&self.type_name).finish()
    }
}

/// The shape of one return value.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ValueShape {
    /// Raw bytes, written verbatim.
    Bytes,
    /// A serializable value, written as JSON.
    Document,
    /// An error slot.
    Error,
}

impl ValueShape {
    pub fn is_error(self) -> bool {
        self == Self::Error
    }
}

/// An opaque argument value produced by a matcher for a data parameter.
///
/// It must hold exactly the type the parameter declares; binding an argument
/// of any other type is a contract violation and panics.
pub struct Argument(Box<dyn Any + Send>);

impl Argument {
    pub fn new<T: Send + 'static>(value: T) -> Self {
        Self(Box::new(value))
    }

    pub fn is<T: 'static>(&self) -> bool {
        self.0.is::<T>()
    }

    /// Returns the value, or the argument back when it holds another type.
    pub fn downcast<T: 'static>(self) -> Result<T, Self> {
        self.0.downcast::<T>().map(|v| *v).map_err(Self)
    }
}

impl fmt::Debug for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Argument(..)")
    }
}
