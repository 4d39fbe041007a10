//! Booleans stored as tokens in a list.

use serde_json::Value;

/// Prefix marking a negated token.
pub const NEGATION: char = '!';

/// State of `token` in `list`: `Some(true)` for the bare token,
/// `Some(false)` for the negated token, `None` otherwise.
pub(crate) fn read(list: Option<&Value>, token: &str) -> Option<bool> {
    let items = list?.as_array()?;
    items.iter().filter_map(Value::as_str).find_map(|item| {
        if item == token {
            Some(true)
        } else {
            item.strip_prefix(NEGATION)
                .filter(|negated| *negated == token)
                .map(|_| false)
        }
    })
}

/// List item representing `token` set to `value`.
pub(crate) fn write(token: &str, value: bool) -> Value {
    if value {
        Value::String(token.to_owned())
    } else {
        Value::String(format!("{NEGATION}{token}"))
    }
}
