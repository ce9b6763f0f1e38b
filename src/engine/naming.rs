//! Field-name mapping between Rust and the engine's JSON convention.
//!
//! The engine spells JSON fields with a leading capital (`AttachStdout`,
//! `StatusCode`, `Id`). The crate's own request and response types use
//! snake case. Rather than annotating every field, these types are passed
//! through [`encode`] and [`decode`], which rename the top-level object keys
//! with a pure string transform.
//!
//! Only top-level keys are renamed: nested objects may hold user data (labels,
//! environment maps) whose keys must reach the daemon untouched.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::EngineError;

/// Map a snake case field name to its wire spelling.
///
/// `attach_stdout` becomes `AttachStdout` and `id` becomes `Id`.
#[must_use]
pub fn to_wire_name(name: &str) -> String {
    name.split('_')
        .filter(|segment| !segment.is_empty())
        .map(capitalise)
        .collect()
}

/// Map a wire field name to snake case.
///
/// Runs of capitals are treated as one word, so `ID` becomes `id` and
/// `IPAddress` becomes `ip_address`.
#[must_use]
pub fn from_wire_name(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (index, current) in chars.iter().enumerate() {
        if current.is_uppercase() && index > 0 {
            let previous = chars.get(index - 1).copied();
            let next = chars.get(index + 1).copied();
            let after_lower = previous.is_some_and(|c| c.is_lowercase() || c.is_ascii_digit());
            let ends_acronym = previous.is_some_and(char::is_uppercase)
                && next.is_some_and(char::is_lowercase);
            if after_lower || ends_acronym {
                out.push('_');
            }
        }
        out.extend(current.to_lowercase());
    }
    out
}

fn capitalise(segment: &str) -> String {
    let mut chars = segment.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect::<String>()
    })
}

fn rename_keys(value: Value, rename: fn(&str) -> String) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, field)| (rename(&key), field))
                .collect::<Map<String, Value>>(),
        ),
        other => other,
    }
}

/// Serialise a crate type into a wire JSON body.
///
/// # Errors
///
/// Returns `EngineError::Parse` if the value cannot be serialised.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, EngineError> {
    let json = serde_json::to_value(value).map_err(parse_error)?;
    serde_json::to_vec(&rename_keys(json, to_wire_name)).map_err(parse_error)
}

/// Deserialise a wire JSON body into a crate type.
///
/// # Errors
///
/// Returns `EngineError::Parse` if the body is not JSON or does not match `T`.
pub fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, EngineError> {
    let json: Value = serde_json::from_slice(body).map_err(parse_error)?;
    serde_json::from_value(rename_keys(json, from_wire_name)).map_err(parse_error)
}

fn parse_error(error: serde_json::Error) -> EngineError {
    EngineError::Parse {
        message: error.to_string(),
    }
}
