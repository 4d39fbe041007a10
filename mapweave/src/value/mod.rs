//! Typed values, type identity, and shared object handles.
//!
//! Untyped data is plain [`serde_json::Value`]. Once a value crosses into an
//! object it becomes a [`Datum`], and objects themselves live behind
//! [`ObjectHandle`]s so graphs may share or even cycle through instances.

mod datum;
mod field_value;
mod handle;
mod type_ref;

pub use datum::Datum;
pub use field_value::FieldValue;
pub use handle::{Mappable, ObjectHandle};
pub use type_ref::{Declared, TypeKey, TypeRef};

#[cfg(test)]
mod tests;
