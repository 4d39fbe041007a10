//! Declared semantic types of mapped members.

use std::fmt;

use crate::value::{Declared, TypeRef};

/// The declared type of a field, parameter, or list element.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SemanticType {
    /// Boolean.
    Bool,
    /// Signed integer.
    Int,
    /// Floating point number.
    Float,
    /// String.
    String,
    /// Timestamp parsed and formatted with the field's date format.
    DateTime,
    /// Untyped data passed through unchanged.
    Any,
    /// Nested mapped type.
    Object(TypeRef),
    /// Collection; `None` is a bare collection whose element type must come
    /// from an element-type hint.
    List(Option<Box<SemanticType>>),
}

impl SemanticType {
    /// Nested mapped type `T`.
    #[must_use]
    pub fn object<T: Declared>() -> Self {
        Self::Object(TypeRef::of::<T>())
    }

    /// Collection of `element`.
    #[must_use]
    pub fn list_of(element: Self) -> Self {
        Self::List(Some(Box::new(element)))
    }

    /// Collection without a declared element type.
    #[must_use]
    pub const fn untyped_list() -> Self {
        Self::List(None)
    }

    /// Returns `true` for scalar kinds.
    #[must_use]
    pub const fn is_scalar(&self) -> bool {
        matches!(
            self,
            Self::Bool | Self::Int | Self::Float | Self::String | Self::DateTime
        )
    }

    /// Nested type referenced by an object type, looking through lists.
    #[must_use]
    pub fn object_type(&self) -> Option<TypeRef> {
        match self {
            Self::Object(type_ref) => Some(*type_ref),
            Self::List(Some(element)) => element.object_type(),
            _ => None,
        }
    }
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool => f.write_str("bool"),
            Self::Int => f.write_str("int"),
            Self::Float => f.write_str("float"),
            Self::String => f.write_str("string"),
            Self::DateTime => f.write_str("datetime"),
            Self::Any => f.write_str("mixed"),
            Self::Object(type_ref) => f.write_str(type_ref.name()),
            Self::List(Some(element)) => write!(f, "{element}[]"),
            Self::List(None) => f.write_str("array"),
        }
    }
}
