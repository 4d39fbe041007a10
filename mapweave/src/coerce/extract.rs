//! Regular-expression extraction from string inputs.

use regex::Regex;
use serde_json::{Map, Value};

use crate::MapError;

const SCALAR_GROUPS: &[&str] = &["value", "1", "0"];

/// Matches `input` and returns its capture groups as an object.
///
/// Groups are keyed by position (`"0"`, `"1"`, …) and, when named, by name.
/// Groups that did not participate are `null`.
pub(crate) fn captures(regex: &Regex, input: &str, target: &str) -> Result<Value, MapError> {
    let caps = regex
        .captures(input)
        .ok_or_else(|| MapError::ExtractorMismatch {
            target: target.to_owned(),
            pattern: regex.as_str().to_owned(),
            input: input.to_owned(),
        })?;
    let text = |group: Option<regex::Match<'_>>| {
        group.map_or(Value::Null, |found| Value::String(found.as_str().to_owned()))
    };
    let mut map = Map::new();
    for (index, group) in caps.iter().enumerate() {
        map.insert(index.to_string(), text(group));
    }
    for name in regex.capture_names().flatten() {
        map.insert(name.to_owned(), text(caps.name(name)));
    }
    Ok(Value::Object(map))
}

/// Capture used for a scalar target: `value`, else the first group, else the
/// whole match.
pub(crate) fn scalar(captures: &Value) -> Value {
    SCALAR_GROUPS
        .iter()
        .find_map(|key| captures.get(*key).filter(|found| !found.is_null()))
        .cloned()
        .unwrap_or(Value::Null)
}
