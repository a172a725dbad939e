//! The load pipeline's pure core: merge the four layers and decode.
//!
//! Operates on pre-loaded data with no I/O, so the whole precedence chain
//! is testable with synthetic inputs. Layers, lowest to highest:
//!
//! 1. defaults (values discovered in the record at construction)
//! 2. config file
//! 3. environment variables
//! 4. command-line flags
//!
//! Every layer is sparse: a layer only overrides the keys it explicitly
//! sets, everything else falls through.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use toml::{Table, Value};

use crate::error::MedleyError;
use crate::field::FieldSpec;
use crate::merge::{deep_merge, pairs_to_table};

/// Pre-loaded layer data for one resolve pass.
pub(crate) struct ResolveInput<'a> {
    pub defaults: &'a Table,
    pub file: Table,
    pub env_pairs: Vec<(String, Value)>,
    pub flag_pairs: Vec<(String, Value)>,
}

/// Seed the lowest layer from discovered field defaults. `None` defaults
/// (optional fields left unset) contribute no key.
pub(crate) fn defaults_table(specs: &BTreeMap<String, FieldSpec>) -> Table {
    let mut table = Table::new();
    for spec in specs.values() {
        if let Some(value) = &spec.default {
            crate::merge::set_nested(&mut table, &spec.key, value.clone());
        }
    }
    table
}

/// Merge all layers and decode the result into the record type.
pub(crate) fn resolve<C: DeserializeOwned>(input: ResolveInput<'_>) -> Result<C, MedleyError> {
    let mut merged = input.defaults.clone();
    merged = deep_merge(merged, input.file);
    merged = deep_merge(merged, pairs_to_table(&input.env_pairs));
    merged = deep_merge(merged, pairs_to_table(&input.flag_pairs));

    Value::Table(merged).try_into().map_err(MedleyError::Decode)
}
