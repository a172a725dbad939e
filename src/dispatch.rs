//! Type dispatch: one clap flag per bindable field, plus the kind-aware
//! value parsing shared by the flag and env boundaries.
//!
//! Dispatch is most-specific-first: IP and mask kinds before durations,
//! durations before the integer widths they would otherwise look like, then
//! plain scalars, then collections. Collections of `u8` arrive here already
//! resolved to [`Kind::Bytes`] unless metadata said otherwise (see
//! `field::discover`). `Kind::Opaque` never reaches this module.
//!
//! Flags carry their discovered default via clap's `default_value` so it
//! shows up in `--help`, but layering is preserved by only honoring values
//! whose `ValueSource` is the command line. Everything clap stores is a
//! validated `String`; re-parsing into `toml::Value` happens on extraction.

use clap::parser::ValueSource;
use clap::{Arg, ArgAction, ArgMatches, Command};
use toml::Value;

use crate::error::MedleyError;
use crate::field::{Binding, FieldSpec, Kind, Scalar};

/// Register the flag for one field. Callers skip `skip` and `Opaque` fields.
pub(crate) fn register(cmd: Command, spec: &FieldSpec, flag: &str) -> Command {
    let scalar = match spec.kind {
        Kind::Scalar(s) => s,
        Kind::List(s) => s,
        Kind::Bytes => Scalar::Str,
        Kind::Opaque => return cmd,
    };

    let mut arg = Arg::new(spec.key.clone()).long(flag.to_string());

    if !spec.help.is_empty() {
        arg = arg.help(spec.help.clone());
    }

    arg = match spec.kind {
        Kind::Scalar(Scalar::Bool) => arg
            .action(ArgAction::Set)
            .num_args(0..=1)
            .require_equals(true)
            .default_missing_value("true")
            .value_parser(validating(Scalar::Bool)),
        Kind::Scalar(s) => arg.action(ArgAction::Set).value_parser(validating(s)),
        Kind::List(s) => arg
            .action(ArgAction::Append)
            .value_delimiter(',')
            .value_parser(validating(s)),
        Kind::Bytes => arg
            .action(ArgAction::Set)
            .value_name("HEX")
            .value_parser(|s: &str| hex_to_bytes(s).map(|_| s.to_string())),
        Kind::Opaque => unreachable!("opaque fields are filtered before dispatch"),
    };

    if let Some(rendered) = render_default(spec)
        && accepts(spec.kind, scalar, &rendered)
    {
        arg = arg.default_value(rendered);
    }

    cmd.arg(arg)
}

/// Collect `(key, value)` pairs for every flag the user actually set.
pub(crate) fn matches_to_pairs(
    matches: &ArgMatches,
    bindings: &[Binding],
) -> Result<Vec<(String, Value)>, MedleyError> {
    let mut pairs = Vec::new();

    for binding in bindings {
        if matches.value_source(&binding.key) != Some(ValueSource::CommandLine) {
            continue;
        }
        let value = match binding.kind {
            Kind::Scalar(s) => {
                let raw = matches
                    .get_one::<String>(&binding.key)
                    .ok_or_else(|| invalid(&binding.key, "missing flag value"))?;
                parse_scalar(s, raw).map_err(|e| invalid(&binding.key, &e))?
            }
            Kind::List(s) => {
                let mut items = Vec::new();
                if let Some(raws) = matches.get_many::<String>(&binding.key) {
                    for raw in raws {
                        items.push(parse_scalar(s, raw).map_err(|e| invalid(&binding.key, &e))?);
                    }
                }
                Value::Array(items)
            }
            Kind::Bytes => {
                let raw = matches
                    .get_one::<String>(&binding.key)
                    .ok_or_else(|| invalid(&binding.key, "missing flag value"))?;
                let bytes = hex_to_bytes(raw).map_err(|e| invalid(&binding.key, &e))?;
                Value::Array(bytes.into_iter().map(|b| Value::Integer(b as i64)).collect())
            }
            Kind::Opaque => continue,
        };
        pairs.push((binding.key.clone(), value));
    }

    Ok(pairs)
}

/// Parse raw text under a scalar kind into the merged-store value.
///
/// Durations and addresses keep their textual form (the record decodes them
/// through its own serde attributes); numbers are width-checked here so bad
/// input fails at the boundary it came in through.
pub(crate) fn parse_scalar(scalar: Scalar, raw: &str) -> Result<Value, String> {
    match scalar {
        Scalar::Str => Ok(Value::String(raw.to_string())),
        Scalar::Bool => match raw.to_ascii_lowercase().as_str() {
            "true" | "t" | "1" => Ok(Value::Boolean(true)),
            "false" | "f" | "0" => Ok(Value::Boolean(false)),
            _ => Err(format!("'{raw}' is not a boolean")),
        },
        Scalar::I8 => int::<i8>(raw),
        Scalar::I16 => int::<i16>(raw),
        Scalar::I32 => int::<i32>(raw),
        Scalar::I64 => int::<i64>(raw),
        Scalar::U8 => int::<u8>(raw),
        Scalar::U16 => int::<u16>(raw),
        Scalar::U32 => int::<u32>(raw),
        Scalar::U64 => {
            let v: u64 = raw
                .parse()
                .map_err(|_| format!("'{raw}' is not an unsigned integer"))?;
            i64::try_from(v)
                .map(Value::Integer)
                .map_err(|_| format!("'{raw}' is out of range"))
        }
        Scalar::F32 => raw
            .parse::<f32>()
            .map(|v| Value::Float(v as f64))
            .map_err(|_| format!("'{raw}' is not a number")),
        Scalar::F64 => raw
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| format!("'{raw}' is not a number")),
        Scalar::Duration => humantime::parse_duration(raw)
            .map(|_| Value::String(raw.to_string()))
            .map_err(|e| format!("'{raw}' is not a duration: {e}")),
        Scalar::Ip => raw
            .parse::<std::net::IpAddr>()
            .map(|_| Value::String(raw.to_string()))
            .map_err(|_| format!("'{raw}' is not an IP address")),
        Scalar::IpMask => raw
            .parse::<std::net::Ipv4Addr>()
            .map(|_| Value::String(raw.to_string()))
            .map_err(|_| format!("'{raw}' is not a dotted-quad netmask")),
    }
}

fn int<T>(raw: &str) -> Result<Value, String>
where
    T: std::str::FromStr + Into<i64>,
{
    raw.parse::<T>()
        .map(|v| Value::Integer(v.into()))
        .map_err(|_| format!("'{raw}' is not an integer in range"))
}

pub(crate) fn hex_to_bytes(raw: &str) -> Result<Vec<u8>, String> {
    hex::decode(raw).map_err(|e| format!("'{raw}' is not hex: {e}"))
}

pub(crate) fn bytes_to_hex(items: &[Value]) -> String {
    let bytes: Vec<u8> = items
        .iter()
        .filter_map(Value::as_integer)
        .map(|b| b as u8)
        .collect();
    hex::encode(bytes)
}

fn invalid(key: &str, reason: &str) -> MedleyError {
    MedleyError::InvalidValue {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn validating(scalar: Scalar) -> impl Fn(&str) -> Result<String, String> + Clone + Send + Sync {
    move |s: &str| parse_scalar(scalar, s).map(|_| s.to_string())
}

/// Render a discovered default as flag text, for `--help`.
fn render_default(spec: &FieldSpec) -> Option<String> {
    let value = spec.default.as_ref()?;
    match spec.kind {
        Kind::Bytes => match value {
            Value::Array(items) if !items.is_empty() => Some(bytes_to_hex(items)),
            _ => None,
        },
        Kind::List(_) => match value {
            Value::Array(items) if !items.is_empty() => Some(
                items
                    .iter()
                    .filter_map(render_value)
                    .collect::<Vec<_>>()
                    .join(","),
            ),
            _ => None,
        },
        Kind::Scalar(_) => render_value(value),
        Kind::Opaque => None,
    }
}

fn render_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Integer(i) => Some(i.to_string()),
        Value::Float(f) => Some(f.to_string()),
        Value::Boolean(b) => Some(b.to_string()),
        _ => None,
    }
}

/// A default only reaches clap if it survives the same parser the user's
/// input goes through; otherwise clap would reject the default itself
/// (e.g. an empty-string default on a field tagged as an IP address).
fn accepts(kind: Kind, scalar: Scalar, rendered: &str) -> bool {
    match kind {
        Kind::Bytes => hex_to_bytes(rendered).is_ok(),
        Kind::List(s) => rendered.split(',').all(|p| parse_scalar(s, p).is_ok()),
        _ => parse_scalar(scalar, rendered).is_ok(),
    }
}
