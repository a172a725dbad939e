//! Environment variable overlay.
//!
//! Each binding carries one env var candidate, derived from its qualified
//! key (see [`normalize::env_key`](crate::normalize::env_key)). The overlay
//! looks every candidate up in a snapshot of the environment and parses hits
//! under the field's declared kind — no heuristic type guessing, bad values
//! fail with the key and env var named.
//!
//! Taking the snapshot as a slice keeps this free of process state; the
//! loader passes `std::env::vars()` (or a test-supplied set).

use toml::Value;

use crate::dispatch::{hex_to_bytes, parse_scalar};
use crate::error::MedleyError;
use crate::field::{Binding, Kind};

/// Collect `(key, value)` pairs for every binding whose env var is set.
pub(crate) fn overlay(
    bindings: &[Binding],
    vars: &[(String, String)],
) -> Result<Vec<(String, Value)>, MedleyError> {
    let mut pairs = Vec::new();

    for binding in bindings {
        let Some((_, raw)) = vars.iter().find(|(name, _)| *name == binding.env_key) else {
            continue;
        };
        let value = parse_env_value(binding, raw)?;
        pairs.push((binding.key.clone(), value));
    }

    Ok(pairs)
}

fn parse_env_value(binding: &Binding, raw: &str) -> Result<Value, MedleyError> {
    let invalid = |reason: String| MedleyError::InvalidValue {
        key: binding.key.clone(),
        reason: format!("{reason} (from ${})", binding.env_key),
    };

    match binding.kind {
        Kind::Scalar(s) => parse_scalar(s, raw).map_err(invalid),
        // One variable, comma-separated values.
        Kind::List(s) => {
            if raw.is_empty() {
                return Ok(Value::Array(Vec::new()));
            }
            raw.split(',')
                .map(|piece| parse_scalar(s, piece).map_err(invalid))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array)
        }
        Kind::Bytes => hex_to_bytes(raw)
            .map(|bytes| {
                Value::Array(bytes.into_iter().map(|b| Value::Integer(b as i64)).collect())
            })
            .map_err(invalid),
        Kind::Opaque => Err(invalid("opaque field cannot be bound".to_string())),
    }
}
