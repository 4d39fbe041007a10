//! Generic read and write primitives over untyped containers.
//!
//! Only maps and arrays are indexable. Writes create missing map levels and
//! pad arrays with `null` up to [`MAX_PADDING`] new slots; a scalar in the way
//! is an error.

use serde_json::{Map, Value};

use super::{PathError, Segment};

/// Most `null` slots a single write may add to an array.
pub const MAX_PADDING: usize = 1024;

fn step<'v>(container: &'v Value, segment: &Segment) -> Option<&'v Value> {
    match (container, segment) {
        (Value::Object(map), Segment::Key(key)) => map.get(key),
        (Value::Object(map), Segment::Index(index)) => map.get(&index.to_string()),
        (Value::Array(items), Segment::Index(index)) => items.get(*index),
        (Value::Array(items), Segment::Key(key)) => {
            key.parse::<usize>().ok().and_then(|index| items.get(index))
        }
        _ => None,
    }
}

/// Reads the value at `segments` below `container`.
///
/// Returns `None` when any step is missing. A present `null` is returned as
/// `Some(&Value::Null)`.
///
/// # Examples
///
/// ```
/// use mapweave::path::{Segment, access};
/// use serde_json::json;
///
/// let data = json!({"items": [{"id": 7}]});
/// let path = [Segment::Key("items".into()), Segment::Index(0), Segment::Key("id".into())];
/// assert_eq!(access::read(&data, &path), Some(&json!(7)));
/// ```
#[must_use]
pub fn read<'v>(container: &'v Value, segments: &[Segment]) -> Option<&'v Value> {
    segments
        .iter()
        .try_fold(container, |current, segment| step(current, segment))
}

fn step_mut<'v>(
    container: &'v mut Value,
    segment: &Segment,
    walked: &[Segment],
) -> Result<&'v mut Value, PathError> {
    if container.is_null() {
        *container = match segment {
            Segment::Key(_) => Value::Object(Map::new()),
            Segment::Index(_) => Value::Array(Vec::new()),
        };
    }
    let position = match (&*container, segment) {
        (Value::Array(_), Segment::Index(index)) => Some(*index),
        (Value::Array(_), Segment::Key(key)) => key.parse::<usize>().ok(),
        _ => None,
    };
    match container {
        Value::Object(map) => {
            let key = match segment {
                Segment::Key(key) => key.clone(),
                Segment::Index(index) => index.to_string(),
            };
            Ok(map.entry(key).or_insert(Value::Null))
        }
        Value::Array(items) => {
            let Some(index) = position else {
                return Err(PathError::NotIndexable {
                    path: render(walked),
                    found: "array",
                });
            };
            if items.len() <= index {
                let Some(len) = index
                    .checked_add(1)
                    .filter(|len| len - items.len() <= MAX_PADDING)
                else {
                    return Err(PathError::NotIndexable {
                        path: render(walked),
                        found: "array",
                    });
                };
                items.resize(len, Value::Null);
            }
            items.get_mut(index).ok_or_else(|| PathError::NotIndexable {
                path: render(walked),
                found: "array",
            })
        }
        scalar => Err(PathError::NotIndexable {
            path: render(walked),
            found: kind(scalar),
        }),
    }
}

/// Location at `segments`, creating missing levels on the way.
///
/// # Errors
///
/// Returns [`PathError::NotIndexable`] when a scalar sits on the path.
pub fn slot<'v>(container: &'v mut Value, segments: &[Segment]) -> Result<&'v mut Value, PathError> {
    let mut current = container;
    for (depth, segment) in segments.iter().enumerate() {
        current = step_mut(current, segment, segments.get(..depth).unwrap_or_default())?;
    }
    Ok(current)
}

/// Stores `value` at `segments`, replacing what was there.
///
/// # Errors
///
/// Returns [`PathError::NotIndexable`] when a scalar sits on the path.
///
/// # Examples
///
/// ```
/// use mapweave::path::{Segment, access};
/// use serde_json::{Value, json};
///
/// let mut out = Value::Null;
/// access::write(&mut out, &[Segment::Key("tags".into()), Segment::Index(1)], json!("b"))?;
/// assert_eq!(out, json!({"tags": [null, "b"]}));
/// # Ok::<_, mapweave::path::PathError>(())
/// ```
pub fn write(container: &mut Value, segments: &[Segment], value: Value) -> Result<(), PathError> {
    *slot(container, segments)? = value;
    Ok(())
}

/// Ensures an object exists at `segments`.
///
/// # Errors
///
/// Returns [`PathError::NotIndexable`] when a scalar sits on the path or at
/// the location itself.
pub fn ensure_object(container: &mut Value, segments: &[Segment]) -> Result<(), PathError> {
    let target = slot(container, segments)?;
    if target.is_null() {
        *target = Value::Object(Map::new());
    }
    match target {
        Value::Object(_) => Ok(()),
        other => Err(PathError::NotIndexable {
            path: render(segments),
            found: kind(other),
        }),
    }
}

/// List at `segments`, created empty if missing.
///
/// # Errors
///
/// Returns [`PathError::NotIndexable`] when the location holds something
/// other than a list.
pub fn ensure_array<'v>(
    container: &'v mut Value,
    segments: &[Segment],
) -> Result<&'v mut Vec<Value>, PathError> {
    let target = slot(container, segments)?;
    if target.is_null() {
        *target = Value::Array(Vec::new());
    }
    match target {
        Value::Array(items) => Ok(items),
        other => Err(PathError::NotIndexable {
            path: render(segments),
            found: kind(other),
        }),
    }
}

/// Appends `item` to the list at `segments`, creating the list if needed.
///
/// # Errors
///
/// Returns [`PathError::NotIndexable`] when the location holds something
/// other than a list.
pub fn push(container: &mut Value, segments: &[Segment], item: Value) -> Result<(), PathError> {
    ensure_array(container, segments)?.push(item);
    Ok(())
}

/// Overlay `layer` onto `target`, updating `target` in place.
///
/// Objects merge recursively; arrays and scalars replace `target` wholesale.
///
/// ```
/// use mapweave::path::access::merge_value;
/// use serde_json::json;
///
/// let mut acc = json!({"a": 1, "b": {"x": 1}});
/// merge_value(&mut acc, json!({"b": {"y": 2}, "c": 3}));
/// assert_eq!(acc, json!({"a": 1, "b": {"x": 1, "y": 2}, "c": 3}));
/// ```
pub fn merge_value(target: &mut Value, layer: Value) {
    match layer {
        Value::Object(map) => merge_object(target, map),
        _ => *target = layer,
    }
}

fn merge_object(target: &mut Value, map: Map<String, Value>) {
    if !target.is_object() {
        *target = Value::Object(Map::new());
    }

    let Some(target_map) = target.as_object_mut() else {
        return;
    };

    for (key, value) in map {
        match target_map.get_mut(&key) {
            Some(existing) => merge_value(existing, value),
            None => {
                target_map.insert(key, value);
            }
        }
    }
}

/// Renders segments the way accessors are written.
#[must_use]
pub fn render(segments: &[Segment]) -> String {
    let mut out = String::new();
    for (position, segment) in segments.iter().enumerate() {
        if position > 0 && matches!(segment, Segment::Key(_)) {
            out.push('.');
        }
        out.push_str(&segment.to_string());
    }
    out
}

const fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
