//! Query string and form body encoding for request parameters.
//!
//! Parameters are any `Serialize` value that becomes a map. Nested values
//! use bracket keys (`filter[status]=open`, `ids[0]=3`), booleans become
//! `1`/`0` and nulls are left out. Map order is kept as given. Spaces
//! encode as `+`, as in `application/x-www-form-urlencoded`.

use serde::Serialize;
use serde_json::Value;

use crate::Error;

/// Serialize request parameters, rejecting anything that is not a map, a
/// list or nothing at all.
///
/// # Errors
///
/// Returns `Error::Json` if serialization fails and
/// `Error::InvalidParameters` for scalar parameters.
pub fn to_params<P: Serialize + ?Sized>(params: &P) -> Result<Value, Error> {
    let value = serde_json::to_value(params)?;

    match value {
        Value::Null | Value::Object(_) | Value::Array(_) => Ok(value),
        Value::Bool(_) | Value::Number(_) | Value::String(_) => Err(Error::InvalidParameters(
            format!("expected a map of parameters, got `{value}`"),
        )),
    }
}

/// True when `params` would produce an empty query string.
#[must_use]
pub fn is_empty(params: &Value) -> bool {
    match params {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

/// Encode `params` as `application/x-www-form-urlencoded` text.
#[must_use]
pub fn build_query(params: &Value) -> String {
    let mut pairs = Vec::new();

    match params {
        Value::Object(map) => {
            for (key, value) in map {
                push_pairs(&mut pairs, key.clone(), value);
            }
        }
        Value::Array(items) => {
            for (index, value) in items.iter().enumerate() {
                push_pairs(&mut pairs, index.to_string(), value);
            }
        }
        _ => {}
    }

    pairs.join("&")
}

fn push_pairs(pairs: &mut Vec<String>, key: String, value: &Value) {
    match value {
        Value::Null => {}
        Value::Bool(flag) => pairs.push(pair(&key, if *flag { "1" } else { "0" })),
        Value::Number(number) => pairs.push(pair(&key, &number.to_string())),
        Value::String(text) => pairs.push(pair(&key, text)),
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                push_pairs(pairs, format!("{key}[{index}]"), item);
            }
        }
        Value::Object(map) => {
            for (name, item) in map {
                push_pairs(pairs, format!("{key}[{name}]"), item);
            }
        }
    }
}

fn pair(key: &str, value: &str) -> String {
    format!("{}={}", encode(key), encode(value))
}

/// Percent-encode one key or value, with spaces as `+`.
#[must_use]
pub fn encode(component: &str) -> String {
    urlencoding::encode(component).replace("%20", "+")
}

/// Decode one key or value, reading `+` as a space. `None` when the
/// decoded bytes are not UTF-8.
#[must_use]
pub fn decode(component: &str) -> Option<String> {
    urlencoding::decode(&component.replace('+', " "))
        .ok()
        .map(std::borrow::Cow::into_owned)
}
