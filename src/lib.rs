//! Bind a plain config struct to defaults, a config file, environment
//! variables, and CLI flags — in one pass, with one precedence rule.
//!
//! ```ignore
//! let mut config = AppConfig::default();
//! let mut loader = Medley::builder(&mut config)
//!     .app_name("myapp")
//!     .env_prefix("myapp")
//!     .config_file("myapp.toml")
//!     .build()?;
//! loader.load_file()?;
//! ```
//!
//! That call walks the struct, registers a `--flag` for every leaf field,
//! binds a `MYAPP_*` env var candidate to each, parses the process
//! arguments, reads the config file (`--config` lets the user point at
//! another one), and writes the merged result back into `config`.
//!
//! # Why medley
//!
//! Layered configuration is mostly plumbing: every new setting needs a
//! default, a file key, an env var, and a flag, all kept in sync by hand.
//! Medley derives all four from the struct itself. The values the struct
//! holds when the loader is built are the defaults; field names become
//! file keys, env vars, and flag names through fixed normalization rules.
//! Add a field and every surface picks it up.
//!
//! Discovery runs on serde's data model, so anything that derives
//! `Serialize` and `Deserialize` works — no extra derive, no schema file.
//!
//! # Layer precedence
//!
//! ```text
//! Struct defaults       values present at build time
//!        ↑ overridden by
//! Config file           TOML (or JSON by .json extension)
//!        ↑ overridden by
//! Environment vars      PREFIX_SECTION_FIELD
//!        ↑ overridden by
//! CLI flags             only flags the user actually passed
//! ```
//!
//! Every layer is sparse: unset keys fall through to the layer below. A
//! flag left at its clap default does not mask an env var or file value —
//! only explicit user input counts as the flags layer.
//!
//! # Naming
//!
//! Flag names split field names at case boundaries, join nesting with
//! dashes, and lowercase:
//!
//! | Field | Flag |
//! |-------|------|
//! | `RequestLogFile` | `--request-log-file` |
//! | `API.Endpoint` | `--api-endpoint` |
//! | `HTTPServer` | `--http-server` |
//!
//! Env var names upper-case the dotted key with `_` separators, plus the
//! optional prefix: `database.pool_size` → `MYAPP_DATABASE_POOL_SIZE`.
//! Swap the flag rule wholesale with
//! [`flag_name_fn()`](MedleyBuilder::flag_name_fn), or override a single
//! field with [`Field::flag`].
//!
//! # Field metadata
//!
//! Per-field knobs attach by dotted key on the builder:
//!
//! ```ignore
//! .field("database.url", Field::new().help("primary database DSN"))
//! .field("internal_state", Field::skip())
//! .field("timeout", Field::new().kind(Kind::duration()))
//! ```
//!
//! A skipped field gets no flag and no env var but still loads from the
//! config file and keeps its default. [`Kind`] declarations cover the
//! types the serde data model can't distinguish from strings: durations
//! (`"1h30m"`, via humantime), IP addresses, dotted-quad netmasks, and
//! hex-encoded byte strings. `Vec<u8>` fields are treated as hex byte
//! strings by default; declare `Kind::List(Scalar::U8)` to get a plain
//! integer list instead.
//!
//! Scalar widths are enforced at the boundary: a `u16` port rejects
//! `70000` at flag-parse time, not as a decode error after merging.
//!
//! # Error handling
//!
//! All fallible operations return [`MedleyError`]. Construction fails
//! before any flag is registered if the root of the record is not a
//! struct; bad env values name both the config key and the variable they
//! came from; flag errors carry clap's own rendering (so `--help` and
//! version requests surface as [`MedleyError::ParseArgs`] for the caller
//! to print and exit).

pub mod error;

mod dispatch;
mod env;
mod field;
mod file;
mod flatten;
mod loader;
pub(crate) mod merge;
mod normalize;
mod resolve;

#[cfg(test)]
mod fixtures;

pub use error::MedleyError;
pub use field::{Field, Kind, Scalar};
pub use loader::{Medley, MedleyBuilder};
pub use normalize::{env_key, flag_name};
