//! Conversions between Rust field storage and [`Datum`].

use chrono::{DateTime, FixedOffset};
use serde_json::Value;

use super::{Datum, ObjectHandle};
use crate::AccessError;

/// Storage types usable as mapped struct fields.
///
/// `Option<T>` reports `None` as an uninitialised field and accepts
/// [`Datum::Null`] as `None`.
pub trait FieldValue: Sized {
    /// Reads the field, returning `None` when it is uninitialised.
    fn to_datum(&self) -> Option<Datum>;

    /// Converts a mapped value into field storage.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::TypeMismatch`] when the value has the wrong
    /// shape.
    fn from_datum(value: Datum) -> Result<Self, AccessError>;
}

fn mismatch(expected: &str, found: &Datum) -> AccessError {
    AccessError::TypeMismatch {
        expected: expected.to_owned(),
        found: found.label().to_owned(),
    }
}

impl FieldValue for Datum {
    fn to_datum(&self) -> Option<Datum> {
        Some(self.clone())
    }

    fn from_datum(value: Datum) -> Result<Self, AccessError> {
        Ok(value)
    }
}

impl FieldValue for bool {
    fn to_datum(&self) -> Option<Datum> {
        Some(Datum::Bool(*self))
    }

    fn from_datum(value: Datum) -> Result<Self, AccessError> {
        value.as_bool().ok_or_else(|| mismatch("bool", &value))
    }
}

impl FieldValue for i64 {
    fn to_datum(&self) -> Option<Datum> {
        Some(Datum::Int(*self))
    }

    fn from_datum(value: Datum) -> Result<Self, AccessError> {
        value.as_i64().ok_or_else(|| mismatch("int", &value))
    }
}

impl FieldValue for f64 {
    fn to_datum(&self) -> Option<Datum> {
        Some(Datum::Float(*self))
    }

    fn from_datum(value: Datum) -> Result<Self, AccessError> {
        value.as_f64().ok_or_else(|| mismatch("float", &value))
    }
}

impl FieldValue for String {
    fn to_datum(&self) -> Option<Datum> {
        Some(Datum::String(self.clone()))
    }

    fn from_datum(value: Datum) -> Result<Self, AccessError> {
        match value {
            Datum::String(text) => Ok(text),
            other => Err(mismatch("string", &other)),
        }
    }
}

impl FieldValue for DateTime<FixedOffset> {
    fn to_datum(&self) -> Option<Datum> {
        Some(Datum::DateTime(*self))
    }

    fn from_datum(value: Datum) -> Result<Self, AccessError> {
        match value {
            Datum::DateTime(moment) => Ok(moment),
            other => Err(mismatch("datetime", &other)),
        }
    }
}

impl FieldValue for Value {
    fn to_datum(&self) -> Option<Datum> {
        Some(Datum::Raw(self.clone()))
    }

    fn from_datum(value: Datum) -> Result<Self, AccessError> {
        match value {
            Datum::Raw(raw) => Ok(raw),
            Datum::Null => Ok(Self::Null),
            other => Err(mismatch("raw value", &other)),
        }
    }
}

impl FieldValue for ObjectHandle {
    fn to_datum(&self) -> Option<Datum> {
        Some(Datum::Object(self.clone()))
    }

    fn from_datum(value: Datum) -> Result<Self, AccessError> {
        match value {
            Datum::Object(handle) => Ok(handle),
            other => Err(mismatch("object", &other)),
        }
    }
}

impl<T: FieldValue> FieldValue for Option<T> {
    fn to_datum(&self) -> Option<Datum> {
        self.as_ref().and_then(FieldValue::to_datum)
    }

    fn from_datum(value: Datum) -> Result<Self, AccessError> {
        if value.is_null() {
            return Ok(None);
        }
        T::from_datum(value).map(Some)
    }
}

impl<T: FieldValue> FieldValue for Vec<T> {
    fn to_datum(&self) -> Option<Datum> {
        Some(Datum::List(
            self.iter()
                .map(|item| item.to_datum().unwrap_or(Datum::Null))
                .collect(),
        ))
    }

    fn from_datum(value: Datum) -> Result<Self, AccessError> {
        match value {
            Datum::List(items) => items.into_iter().map(T::from_datum).collect(),
            other => Err(mismatch("list", &other)),
        }
    }
}

/// Implements [`crate::Mappable`] and [`FieldValue`] for a plain struct.
///
/// Every listed field must implement [`FieldValue`]. The struct must be
/// `Clone` and implement [`crate::Declared`] so it can also be stored as a
/// nested field of another mapped struct.
///
/// # Examples
///
/// ```
/// use mapweave::{Declared, FieldDeclaration, SemanticType, TypeDescriptor, impl_mappable};
///
/// #[derive(Clone, Debug, Default)]
/// struct Tag {
///     label: Option<String>,
/// }
///
/// impl Declared for Tag {
///     fn declarations() -> TypeDescriptor {
///         TypeDescriptor::new()
///             .default_constructor::<Self>()
///             .field(FieldDeclaration::new("label", SemanticType::String))
///     }
/// }
///
/// impl_mappable!(Tag { label });
/// ```
#[macro_export]
macro_rules! impl_mappable {
    ($ty:ty { $($field:ident),* $(,)? }) => {
        impl $crate::Mappable for $ty {
            fn read_field(&self, field: &str) -> ::core::option::Option<$crate::Datum> {
                match field {
                    $(stringify!($field) => $crate::FieldValue::to_datum(&self.$field),)*
                    _ => ::core::option::Option::None,
                }
            }

            fn write_field(
                &mut self,
                field: &str,
                value: $crate::Datum,
            ) -> ::core::result::Result<(), $crate::AccessError> {
                match field {
                    $(stringify!($field) => {
                        self.$field = $crate::FieldValue::from_datum(value)?;
                        ::core::result::Result::Ok(())
                    })*
                    other => ::core::result::Result::Err(
                        $crate::AccessError::UnknownField(other.to_owned()),
                    ),
                }
            }
        }

        impl $crate::FieldValue for $ty {
            fn to_datum(&self) -> ::core::option::Option<$crate::Datum> {
                ::core::option::Option::Some($crate::Datum::Object(
                    $crate::ObjectHandle::new(::core::clone::Clone::clone(self)),
                ))
            }

            fn from_datum(
                value: $crate::Datum,
            ) -> ::core::result::Result<Self, $crate::AccessError> {
                match value {
                    $crate::Datum::Object(handle) => handle.cloned::<Self>().ok_or_else(|| {
                        $crate::AccessError::TypeMismatch {
                            expected: ::core::any::type_name::<Self>().to_owned(),
                            found: handle.type_ref().name().to_owned(),
                        }
                    }),
                    other => ::core::result::Result::Err($crate::AccessError::TypeMismatch {
                        expected: ::core::any::type_name::<Self>().to_owned(),
                        found: other.label().to_owned(),
                    }),
                }
            }
        }
    };
}
