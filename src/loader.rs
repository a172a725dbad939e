//! Loader construction and the I/O half of the load pipeline.
//!
//! [`MedleyBuilder`] collects options, then `build()` runs discovery and
//! dispatch once: every bindable field gets a flag on the loader-owned
//! `clap::Command` and an env var candidate, and every discovered value
//! seeds the defaults layer. [`Medley`] then drives loading: parse args
//! (at most once), read the config source, overlay env and flags, and
//! decode the merged view back into the borrowed record.
//!
//! There is no process-global flag set. Each loader owns its command, so
//! two loaders in one process (or one test binary) never interfere.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::{Path, PathBuf};

use clap::{Arg, ArgMatches, Command};
use serde::Serialize;
use serde::de::DeserializeOwned;
use toml::Table;

use crate::dispatch;
use crate::env;
use crate::error::MedleyError;
use crate::field::{self, Binding, Field, Kind};
use crate::file;
use crate::normalize;
use crate::resolve::{self, ResolveInput};

/// A configuration loader bound to one record.
///
/// Holds the only mutable reference to the record for its lifetime; drop
/// the loader to get the record back.
#[derive(Debug)]
pub struct Medley<'a, C> {
    record: &'a mut C,
    command: Command,
    matches: Option<ArgMatches>,
    defaults: Table,
    bindings: Vec<Binding>,
    config_file: Option<PathBuf>,
    config_flag: bool,
    env_vars: Option<Vec<(String, String)>>,
}

impl<'a, C> Medley<'a, C>
where
    C: Serialize + DeserializeOwned,
{
    /// Start building a loader for `record`. The values already present in
    /// the record become the defaults layer.
    pub fn builder(record: &'a mut C) -> MedleyBuilder<'a, C> {
        MedleyBuilder {
            record,
            app_name: None,
            env_prefix: None,
            config_file: None,
            config_flag: true,
            command: None,
            name_fn: None,
            meta: BTreeMap::new(),
            env_vars: None,
        }
    }

    /// Load from the resolved config file: the `--config` flag value if
    /// given, else the builder's default path, else an empty source.
    ///
    /// Process arguments are parsed on first use; a second call reuses the
    /// first parse.
    pub fn load_file(&mut self) -> Result<(), MedleyError> {
        self.ensure_parsed()?;
        let table = match self.resolved_config_path() {
            Some(path) => file::read(&path)?,
            None => Table::new(),
        };
        self.finish(table)
    }

    /// Load with the config-file layer supplied directly as TOML text,
    /// bypassing path resolution. Flags and env vars still apply.
    pub fn load<R: Read>(&mut self, mut source: R) -> Result<(), MedleyError> {
        self.ensure_parsed()?;
        let mut content = String::new();
        source
            .read_to_string(&mut content)
            .map_err(|e| MedleyError::SourceIo {
                path: PathBuf::from("<source>"),
                source: e,
            })?;
        let table = file::parse(&content, file::Format::Toml, "<source>")?;
        self.finish(table)
    }

    /// Parse an explicit argv instead of the process one. Subject to the
    /// same parse-once guard as [`load_file`](Self::load_file); useful for
    /// tests and embedding.
    pub fn parse_args_from<I, T>(&mut self, args: I) -> Result<(), MedleyError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        if self.matches.is_none() {
            self.matches = Some(self.command.clone().try_get_matches_from(args)?);
        }
        Ok(())
    }

    fn ensure_parsed(&mut self) -> Result<(), MedleyError> {
        if self.matches.is_none() {
            self.matches = Some(
                self.command
                    .clone()
                    .try_get_matches_from(std::env::args_os())?,
            );
        }
        Ok(())
    }

    fn resolved_config_path(&self) -> Option<PathBuf> {
        if self.config_flag
            && let Some(matches) = &self.matches
            && let Some(path) = matches.get_one::<String>("config")
        {
            return Some(PathBuf::from(path));
        }
        self.config_file.clone()
    }

    fn finish(&mut self, file_table: Table) -> Result<(), MedleyError> {
        let snapshot = match &self.env_vars {
            Some(vars) => vars.clone(),
            None => std::env::vars().collect(),
        };
        let matches = self
            .matches
            .as_ref()
            .expect("finish called before argument parsing");

        let env_pairs = env::overlay(&self.bindings, &snapshot)?;
        let flag_pairs = dispatch::matches_to_pairs(matches, &self.bindings)?;

        *self.record = resolve::resolve(ResolveInput {
            defaults: &self.defaults,
            file: file_table,
            env_pairs,
            flag_pairs,
        })?;
        Ok(())
    }
}

/// Builder for a [`Medley`] loader.
pub struct MedleyBuilder<'a, C> {
    record: &'a mut C,
    app_name: Option<String>,
    env_prefix: Option<String>,
    config_file: Option<PathBuf>,
    config_flag: bool,
    command: Option<Command>,
    name_fn: Option<Box<dyn Fn(&str) -> String>>,
    meta: BTreeMap<String, Field>,
    env_vars: Option<Vec<(String, String)>>,
}

impl<'a, C> MedleyBuilder<'a, C>
where
    C: Serialize + DeserializeOwned,
{
    /// Name shown in `--help`. Defaults to the process binary name.
    pub fn app_name(mut self, name: &str) -> Self {
        self.app_name = Some(name.to_string());
        self
    }

    /// Prefix for env var candidates: `DATABASE_URL` → `MYAPP_DATABASE_URL`.
    pub fn env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_string());
        self
    }

    /// Default config file path. Overridable at runtime by `--config`
    /// unless [`no_config_flag`](Self::no_config_flag) is set.
    pub fn config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_file = Some(path.into());
        self
    }

    /// Suppress the auto-registered `--config`/`-c` flag.
    pub fn no_config_flag(mut self) -> Self {
        self.config_flag = false;
        self
    }

    /// Supply a pre-built `clap::Command` to register flags on, instead of
    /// a fresh one. Still loader-scoped.
    pub fn command(mut self, command: Command) -> Self {
        self.command = Some(command);
        self
    }

    /// Replace the default key→flag-name function. Treated as opaque.
    pub fn flag_name_fn(mut self, f: impl Fn(&str) -> String + 'static) -> Self {
        self.name_fn = Some(Box::new(f));
        self
    }

    /// Attach metadata to the field at a dotted qualified key: flag name
    /// override, help text, declared kind, or the `-` opt-out.
    ///
    /// A declared kind is the only way to bind fields whose default value
    /// gives discovery nothing to infer from — notably an empty `Vec`,
    /// which stays config-file-only until tagged `Kind::List(..)`.
    pub fn field(mut self, key: &str, meta: Field) -> Self {
        self.meta.insert(key.to_string(), meta);
        self
    }

    /// Replace the environment snapshot read at load time. Defaults to
    /// `std::env::vars()`; tests pass synthetic data.
    pub fn env_vars(mut self, vars: Vec<(String, String)>) -> Self {
        self.env_vars = Some(vars);
        self
    }

    /// Discover fields, register flags, and seed defaults.
    ///
    /// Fails with [`MedleyError::NotAStruct`] before any flag is
    /// registered if the record's root is not an aggregate.
    pub fn build(self) -> Result<Medley<'a, C>, MedleyError> {
        let specs = field::discover(&*self.record, &self.meta)?;
        let defaults = resolve::defaults_table(&specs);

        // The auto-registered --config arg uses the literal id "config"; a
        // bindable field at that key would collide inside clap.
        if self.config_flag
            && specs
                .get("config")
                .is_some_and(|s| !s.skip && !matches!(s.kind, Kind::Opaque))
        {
            return Err(MedleyError::InvalidValue {
                key: "config".to_string(),
                reason: "key is reserved for the --config flag; rename the \
                         field, skip it, or suppress the flag"
                    .to_string(),
            });
        }

        let name_fn: Box<dyn Fn(&str) -> String> = self
            .name_fn
            .unwrap_or_else(|| Box::new(|key| normalize::flag_name(key)));

        let mut command = match self.command {
            Some(cmd) => cmd,
            None => Command::new(self.app_name.unwrap_or_else(default_app_name)),
        };

        if self.config_flag {
            let mut arg = Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("config file to use");
            if let Some(path) = &self.config_file {
                arg = arg.default_value(path.display().to_string());
            }
            command = command.arg(arg);
        }

        let mut bindings = Vec::new();
        for spec in specs.values() {
            if spec.skip || matches!(spec.kind, Kind::Opaque) {
                continue;
            }
            let flag = spec
                .flag
                .clone()
                .unwrap_or_else(|| name_fn(&spec.key));
            command = dispatch::register(command, spec, &flag);
            bindings.push(Binding {
                key: spec.key.clone(),
                env_key: normalize::env_key(self.env_prefix.as_deref(), &spec.key),
                kind: spec.kind,
            });
        }

        Ok(Medley {
            record: self.record,
            command,
            matches: None,
            defaults,
            bindings,
            config_file: self.config_file,
            config_flag: self.config_flag,
            env_vars: self.env_vars,
        })
    }
}

fn default_app_name() -> String {
    std::env::args()
        .next()
        .and_then(|arg0| {
            Path::new(&arg0)
                .file_name()
                .and_then(|name| name.to_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| "app".to_string())
}
