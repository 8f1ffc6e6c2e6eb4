//! Value validity rules and the canonical boolean lexicon.

use serde_json::Value;

use crate::{ConfigError, ConfigResult};

const TRUE_WORDS: [&str; 4] = ["true", "yes", "on", "1"];
const FALSE_WORDS: [&str; 4] = ["false", "no", "off", "0"];

/// Checks whether a value can be stored as a setting.
///
/// Settings values must be JSON-compatible all the way down: no nulls
/// (neither at the top level nor nested) and no empty mapping keys.
pub fn check_value(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(_) | Value::Number(_) | Value::String(_) => true,
        Value::Array(items) => items.iter().all(check_value),
        Value::Object(map) => map.iter().all(|(k, v)| !k.is_empty() && check_value(v)),
    }
}

/// Returns the JSON type name of a value.
///
/// Integers and floats share the `number` type.
pub fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Converts a string from the boolean lexicon into a `bool`.
///
/// Matching is ASCII case-insensitive and ignores surrounding whitespace.
///
/// # Errors
///
/// Returns [`ConfigError::NotABool`] if the string is not part of the lexicon.
pub fn str_to_bool(s: &str) -> ConfigResult<bool> {
    let word = s.trim();
    if TRUE_WORDS.iter().any(|w| w.eq_ignore_ascii_case(word)) {
        return Ok(true);
    }
    if FALSE_WORDS.iter().any(|w| w.eq_ignore_ascii_case(word)) {
        return Ok(false);
    }
    Err(ConfigError::NotABool(s.to_string()))
}

/// Returns the canonical string encoding of a boolean.
pub const fn bool_to_str(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}
