//! Config source reading and decoding.
//!
//! TOML is the primary format; a `.json` extension switches to JSON, which
//! is converted into the same `toml::Table` the rest of the pipeline merges.
//! Everything here surfaces as `SourceIo` or `SourceParse`.

use std::path::Path;

use toml::{Table, Value};

use crate::error::MedleyError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Format {
    Toml,
    Json,
}

pub(crate) fn format_for(path: &Path) -> Format {
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => Format::Json,
        _ => Format::Toml,
    }
}

/// Read and decode a config file into a table.
pub(crate) fn read(path: &Path) -> Result<Table, MedleyError> {
    let content = std::fs::read_to_string(path).map_err(|e| MedleyError::SourceIo {
        path: path.to_path_buf(),
        source: e,
    })?;
    parse(&content, format_for(path), &path.display().to_string())
}

/// Decode config text, with `name` naming the source in errors.
pub(crate) fn parse(content: &str, format: Format, name: &str) -> Result<Table, MedleyError> {
    let source_parse = |message: String| MedleyError::SourceParse {
        name: name.to_string(),
        message,
    };

    match format {
        Format::Toml => content.parse::<Table>().map_err(|e| source_parse(e.to_string())),
        Format::Json => {
            let json: serde_json::Value =
                serde_json::from_str(content).map_err(|e| source_parse(e.to_string()))?;
            let value =
                Value::try_from(json).map_err(|e| source_parse(e.to_string()))?;
            match value {
                Value::Table(table) => Ok(table),
                _ => Err(source_parse("top level must be an object".to_string())),
            }
        }
    }
}
