//! Scalar conversions in both directions.

use std::fmt::Write as _;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::{Number, Value};

use super::Leniency;
use crate::value::Datum;

const TRUE_TOKENS: &[&str] = &["true", "1", "yes", "on"];
const FALSE_TOKENS: &[&str] = &["false", "0", "no", "off"];

/// Boolean from explicit tokens, then from the recognised defaults.
pub(crate) fn boolean(value: &Value, tokens: Option<(&Value, &Value)>) -> Result<Datum, String> {
    match tokens {
        Some((truthy, _)) if value == truthy => Ok(Datum::Bool(true)),
        Some((_, falsy)) if value == falsy => Ok(Datum::Bool(false)),
        Some((truthy, falsy)) => default_boolean(value)
            .map_err(|reason| format!("expected {truthy} or {falsy}, and {reason}")),
        None => default_boolean(value),
    }
}

fn default_boolean(value: &Value) -> Result<Datum, String> {
    match value {
        Value::Bool(flag) => Ok(Datum::Bool(*flag)),
        Value::Number(number) => match number.as_i64() {
            Some(1) => Ok(Datum::Bool(true)),
            Some(0) => Ok(Datum::Bool(false)),
            _ => Err("only 1 and 0 are boolean numbers".to_owned()),
        },
        Value::String(text) => {
            let lowered = text.to_ascii_lowercase();
            if TRUE_TOKENS.contains(&lowered.as_str()) {
                Ok(Datum::Bool(true))
            } else if FALSE_TOKENS.contains(&lowered.as_str()) {
                Ok(Datum::Bool(false))
            } else {
                Err(format!("'{text}' is not a recognised boolean token"))
            }
        }
        _ => Err("not a boolean".to_owned()),
    }
}

pub(crate) fn int(value: &Value, leniency: Leniency) -> Result<Datum, String> {
    match value {
        Value::Number(number) => number
            .as_i64()
            .map(Datum::Int)
            .ok_or_else(|| format!("{number} is not an integer")),
        Value::String(text) if !leniency.enforce_types => text
            .trim()
            .parse::<i64>()
            .map(Datum::Int)
            .map_err(|err| format!("'{text}' is not an integer: {err}")),
        _ => Err("not an integer".to_owned()),
    }
}

pub(crate) fn float(value: &Value, leniency: Leniency) -> Result<Datum, String> {
    match value {
        Value::Number(number) if number.is_f64() => number
            .as_f64()
            .map(Datum::Float)
            .ok_or_else(|| format!("{number} is not a float")),
        Value::Number(number) if leniency.json_numbers || !leniency.enforce_types => number
            .as_f64()
            .map(Datum::Float)
            .ok_or_else(|| format!("{number} is not a float")),
        Value::Number(number) => Err(format!("integer {number} where a float is declared")),
        Value::String(text) if !leniency.enforce_types => text
            .trim()
            .parse::<f64>()
            .map(Datum::Float)
            .map_err(|err| format!("'{text}' is not a float: {err}")),
        _ => Err("not a float".to_owned()),
    }
}

pub(crate) fn string(value: &Value, leniency: Leniency) -> Result<Datum, String> {
    match value {
        Value::String(text) => Ok(Datum::String(text.clone())),
        Value::Number(_) | Value::Bool(_) if !leniency.enforce_types => {
            Ok(Datum::String(value.to_string()))
        }
        _ => Err("not a string".to_owned()),
    }
}

/// Parses `value` with `format`, accepting offset-less inputs as UTC.
pub(crate) fn datetime(value: &Value, format: &str) -> Result<Datum, String> {
    let Value::String(text) = value else {
        return Err("dates must be strings".to_owned());
    };
    parse_datetime(text, format)
        .map(Datum::DateTime)
        .map_err(|err| format!("'{text}' does not match '{format}': {err}"))
}

fn parse_datetime(text: &str, format: &str) -> Result<DateTime<FixedOffset>, chrono::ParseError> {
    DateTime::parse_from_str(text, format)
        .or_else(|_| {
            NaiveDateTime::parse_from_str(text, format)
                .map(|naive| naive.and_utc().fixed_offset())
        })
        .or_else(|_| {
            NaiveDate::parse_from_str(text, format)
                .map(|date| date.and_time(NaiveTime::MIN).and_utc().fixed_offset())
        })
}

/// Formats `moment` with `format`.
pub(crate) fn format_datetime(moment: &DateTime<FixedOffset>, format: &str) -> Result<String, String> {
    let mut out = String::new();
    write!(out, "{}", moment.format(format))
        .map_err(|_| format!("'{format}' is not a usable date format"))?;
    Ok(out)
}

/// Untyped form of a scalar datum.
pub(crate) fn to_raw(
    value: &Datum,
    tokens: Option<(&Value, &Value)>,
    format: &str,
) -> Result<Value, String> {
    Ok(match value {
        Datum::Null => Value::Null,
        Datum::Bool(flag) => match tokens {
            Some((truthy, falsy)) => {
                if *flag {
                    truthy.clone()
                } else {
                    falsy.clone()
                }
            }
            None => Value::Bool(*flag),
        },
        Datum::Int(number) => Value::from(*number),
        Datum::Float(number) => Number::from_f64(*number).map_or(Value::Null, Value::Number),
        Datum::String(text) => Value::String(text.clone()),
        Datum::DateTime(moment) => Value::String(format_datetime(moment, format)?),
        Datum::Raw(raw) => raw.clone(),
        Datum::List(_) | Datum::Object(_) => {
            return Err(format!("{} is not a scalar", value.label()));
        }
    })
}
