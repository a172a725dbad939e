//! Field descriptors, type tags, and per-field metadata.
//!
//! [`discover`] runs the serde walker over the record and combines its output
//! with the caller's metadata table into one [`FieldSpec`] per leaf field.
//! That map is the flat namespace everything downstream works from: the
//! dispatcher registers flags from it, the loader seeds defaults from it.

use std::collections::BTreeMap;

use serde::Serialize;
use toml::Value;

use crate::error::MedleyError;
use crate::flatten;

/// A bindable primitive type.
///
/// Integer and float widths are kept distinct so each flag gets a
/// width-checked parser (`--retries 300` on a `u8` field fails at the
/// command line, not at decode time).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scalar {
    Str,
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    /// Elapsed time in `humantime` syntax (`"5s"`, `"1h30m"`). Never
    /// inferred; declare it via [`Field::kind`] on fields serialized with
    /// `humantime_serde`.
    Duration,
    /// An IPv4/IPv6 address, validated at the flag/env boundary.
    Ip,
    /// An IPv4 netmask in dotted-quad form (`255.255.255.0`).
    IpMask,
}

/// The declared type of a field, as seen by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Scalar(Scalar),
    /// Homogeneous collection. Repeated flag occurrences and comma-separated
    /// values both append.
    List(Scalar),
    /// Raw binary, hex-encoded text at the flag/env boundary. The default
    /// reading of an undecorated `Vec<u8>`.
    Bytes,
    /// Not bindable: no flag, no env var. The field stays reachable through
    /// the config file and its discovered default.
    Opaque,
}

impl Kind {
    pub fn duration() -> Self {
        Kind::Scalar(Scalar::Duration)
    }

    pub fn ip() -> Self {
        Kind::Scalar(Scalar::Ip)
    }

    pub fn ip_mask() -> Self {
        Kind::Scalar(Scalar::IpMask)
    }

    pub fn ip_list() -> Self {
        Kind::List(Scalar::Ip)
    }

    pub fn bytes() -> Self {
        Kind::Bytes
    }
}

/// Per-field metadata, keyed by qualified name on the builder.
///
/// This is the explicit replacement for struct tags: flag name override,
/// help text, a type-tag override, and the opt-out marker.
#[derive(Debug, Clone, Default)]
pub struct Field {
    pub(crate) flag: Option<String>,
    pub(crate) help: Option<String>,
    pub(crate) kind: Option<Kind>,
}

impl Field {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the flag name. `"-"` opts the field out of flag and env
    /// binding entirely.
    pub fn flag(mut self, name: &str) -> Self {
        self.flag = Some(name.to_string());
        self
    }

    /// Help text shown in `--help`.
    pub fn help(mut self, text: &str) -> Self {
        self.help = Some(text.to_string());
        self
    }

    /// Override the inferred type tag.
    pub fn kind(mut self, kind: Kind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Opt the field out of flag and env binding. Shorthand for
    /// `.flag("-")`.
    pub fn skip() -> Self {
        Self::new().flag("-")
    }

    /// Parse combined `"<flag>,<description>"` tag syntax: at most two
    /// comma-separated parts, an empty flag name meaning "use the
    /// normalized default", and `-` meaning opt out.
    pub fn tag(spec: &str) -> Self {
        let (name, help) = match spec.split_once(',') {
            Some((n, h)) => (n, Some(h)),
            None => (spec, None),
        };
        let mut field = Self::new();
        if !name.is_empty() {
            field.flag = Some(name.to_string());
        }
        if let Some(h) = help {
            field.help = Some(h.to_string());
        }
        field
    }
}

/// One discovered leaf field: the unit of flag registration and default
/// seeding. Immutable once built.
#[derive(Debug, Clone)]
pub(crate) struct FieldSpec {
    pub key: String,
    /// The value present in the record at discovery time; `None` for an
    /// `Option::None` field (it contributes nothing to the defaults layer).
    pub default: Option<Value>,
    pub kind: Kind,
    /// Explicit flag name from metadata; `None` means normalize the key.
    pub flag: Option<String>,
    pub help: String,
    /// Opted out of flag/env binding (`-` marker).
    pub skip: bool,
}

/// Live association between a qualified key, its registered flag, and its
/// env var candidate.
#[derive(Debug, Clone)]
pub(crate) struct Binding {
    pub key: String,
    pub env_key: String,
    pub kind: Kind,
}

/// Walk `record` and produce the flat field namespace.
///
/// Fails with [`MedleyError::NotAStruct`] if the root serializes to a bare
/// scalar or sequence instead of an aggregate.
pub(crate) fn discover<S: Serialize>(
    record: &S,
    meta: &BTreeMap<String, Field>,
) -> Result<BTreeMap<String, FieldSpec>, MedleyError> {
    let pairs = flatten::walk(record)?;
    let mut specs = BTreeMap::new();

    for (key, leaf) in pairs {
        let extra = meta.get(&key);
        let (default, inferred) = match leaf {
            Some(leaf) => (Some(leaf.value), leaf.kind),
            None => (None, Kind::Opaque),
        };
        // Metadata wins over inference. An undecorated u8 list reads as raw
        // bytes; tag it Kind::List(Scalar::U8) to get a repeated flag
        // instead.
        let kind = match extra.and_then(|f| f.kind) {
            Some(k) => k,
            None => match inferred {
                Kind::List(Scalar::U8) => Kind::Bytes,
                k => k,
            },
        };
        let flag = extra.and_then(|f| f.flag.clone());
        let skip = flag.as_deref() == Some("-");

        specs.insert(
            key.clone(),
            FieldSpec {
                key,
                default,
                kind,
                flag: if skip { None } else { flag },
                help: extra.and_then(|f| f.help.clone()).unwrap_or_default(),
                skip,
            },
        );
    }

    Ok(specs)
}
