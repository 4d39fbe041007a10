//! Converting raw values to declared types and back.
//!
//! Candidates of a union are tried in declaration order and the first
//! success wins. Nested objects are handed back to the caller through a
//! callback so the caller controls scoping.

mod extract;
pub mod flags;
mod scalar;

use std::cmp::Ordering;

use serde_json::Value;

pub(crate) use extract::captures;

use crate::{
    ErrorKind, MapError,
    declaration::{DEFAULT_DATE_FORMAT, SemanticType},
    plan::{FieldPlan, SortOrder},
    value::{Datum, ObjectHandle, TypeRef},
};

/// Lenience switches taken from the call options.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Leniency {
    pub(crate) enforce_types: bool,
    pub(crate) json_numbers: bool,
}

/// Maps a raw value onto a nested type.
pub(crate) type NestedFn<'n> = &'n dyn Fn(TypeRef, &Value) -> Result<ObjectHandle, MapError>;

/// The field being coerced, for diagnostics.
pub(crate) struct Site<'p> {
    pub(crate) type_name: &'p str,
    pub(crate) field: &'p FieldPlan,
    pub(crate) path: String,
}

impl Site<'_> {
    fn error(&self, value: &Value, expected: impl ToString, message: impl Into<String>) -> MapError {
        MapError::Coercion {
            type_name: self.type_name.to_owned(),
            field: self.field.name().to_owned(),
            path: self.path.clone(),
            value: value.clone(),
            expected: expected.to_string(),
            message: message.into(),
        }
    }

    fn target(&self) -> String {
        format!("{}.{}", self.type_name, self.field.name())
    }
}

/// Coerces `raw` for `site`.
///
/// Returns `Ok(None)` when the field should stay unset: a value-map miss
/// without fallback, or a nullable field whose value matches no candidate.
pub(crate) fn denormalize(
    raw: &Value,
    site: &Site<'_>,
    leniency: Leniency,
    nested: NestedFn<'_>,
) -> Result<Option<Datum>, MapError> {
    let field = site.field;
    let declaration = field.declaration();
    if let Some(table) = declaration.value_table() {
        return Ok(table.lookup(raw).cloned());
    }

    let extracted;
    let mut input = raw;
    let mut leniency = leniency;
    if let (Some(regex), Value::String(text)) = (&field.extractor, raw) {
        let groups = captures(regex, text, &site.target())?;
        extracted = if field.types().iter().all(SemanticType::is_scalar) {
            extract::scalar(&groups)
        } else {
            groups
        };
        input = &extracted;
        leniency.enforce_types = false;
    }

    if input.is_null() {
        return if declaration.is_nullable() {
            Ok(Some(Datum::Null))
        } else {
            Err(site.error(input, expected_label(field), "null is not accepted"))
        };
    }

    match union(input, site, leniency, nested) {
        Ok(value) => Ok(Some(value)),
        Err(err) if declaration.is_nullable() && err.kind() == ErrorKind::Coercion => {
            tracing::trace!(
                field = %site.target(),
                error = %err,
                "nullable field left unset"
            );
            Ok(None)
        }
        Err(err) => Err(err),
    }
}

fn expected_label(field: &FieldPlan) -> String {
    field
        .types()
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("|")
}

fn union(
    input: &Value,
    site: &Site<'_>,
    leniency: Leniency,
    nested: NestedFn<'_>,
) -> Result<Datum, MapError> {
    let types = site.field.types();
    let mut first_error = None;
    for ty in types {
        match coerce_as(input, ty, site, leniency, nested) {
            Ok(value) => return Ok(value),
            Err(err) => {
                if first_error.is_none() {
                    first_error = Some(err);
                }
            }
        }
    }
    let first = first_error
        .unwrap_or_else(|| site.error(input, "a declared type", "the field declares no type"));
    if types.len() <= 1 {
        return Err(first);
    }
    Err(MapError::NoMatchingType {
        type_name: site.type_name.to_owned(),
        field: site.field.name().to_owned(),
        attempted: types.iter().map(ToString::to_string).collect(),
        source: Box::new(first),
    })
}

fn coerce_as(
    input: &Value,
    ty: &SemanticType,
    site: &Site<'_>,
    leniency: Leniency,
    nested: NestedFn<'_>,
) -> Result<Datum, MapError> {
    let declaration = site.field.declaration();
    let converted = match ty {
        SemanticType::Bool => scalar::boolean(input, declaration.boolean_tokens()),
        SemanticType::Int => scalar::int(input, leniency),
        SemanticType::Float => scalar::float(input, leniency),
        SemanticType::String => scalar::string(input, leniency),
        SemanticType::DateTime => scalar::datetime(input, declaration.format()),
        SemanticType::Any => Ok(Datum::Raw(input.clone())),
        SemanticType::Object(type_ref) => return nested(*type_ref, input).map(Datum::Object),
        SemanticType::List(Some(element)) => return list(input, element, ty, site, leniency, nested),
        SemanticType::List(None) => {
            return Err(MapError::AmbiguousArrayElementType {
                type_name: site.type_name.to_owned(),
                field: site.field.name().to_owned(),
            });
        }
    };
    converted.map_err(|message| site.error(input, ty, message))
}

fn list(
    input: &Value,
    element: &SemanticType,
    ty: &SemanticType,
    site: &Site<'_>,
    leniency: Leniency,
    nested: NestedFn<'_>,
) -> Result<Datum, MapError> {
    let Value::Array(items) = input else {
        return Err(site.error(input, ty, "expected a list"));
    };
    let mut values = items
        .iter()
        .map(|item| {
            if item.is_null() {
                Ok(Datum::Null)
            } else {
                coerce_as(item, element, site, leniency, nested)
            }
        })
        .collect::<Result<Vec<_>, _>>()?;
    if let Some(order) = site.field.order {
        values.sort_by(|a, b| {
            let ordering = a.scalar_cmp(b).unwrap_or(Ordering::Equal);
            match order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        });
    }
    Ok(Datum::List(values))
}

/// Untyped form of a scalar field value.
pub(crate) fn normalize_scalar(
    value: &Datum,
    type_name: &str,
    field: &FieldPlan,
    path: &str,
) -> Result<Value, MapError> {
    let declaration = field.declaration();
    if let Some(raw) = declaration
        .value_table()
        .and_then(|table| table.reverse(value))
    {
        return Ok(raw.clone());
    }
    scalar::to_raw(value, declaration.boolean_tokens(), declaration.format()).map_err(|message| {
        MapError::Coercion {
            type_name: type_name.to_owned(),
            field: field.name().to_owned(),
            path: path.to_owned(),
            value: Value::String(value.label().to_owned()),
            expected: expected_label(field),
            message,
        }
    })
}

/// Untyped form of a producer result, with default tokens and format.
pub(crate) fn plain_scalar(value: &Datum) -> Result<Value, String> {
    scalar::to_raw(value, None, DEFAULT_DATE_FORMAT)
}

#[cfg(test)]
mod tests;
