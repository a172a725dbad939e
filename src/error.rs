use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MedleyError {
    #[error("configuration root must be a struct")]
    NotAStruct,

    #[error("field discovery failed: {0}")]
    Discover(String),

    #[error(transparent)]
    ParseArgs(#[from] clap::Error),

    #[error("failed to read {}: {source}", path.display())]
    SourceIo {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {name}: {message}")]
    SourceParse { name: String, message: String },

    #[error("merged configuration does not fit the record: {0}")]
    Decode(#[from] toml::de::Error),

    #[error("invalid value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },
}

// The field walker is a serde Serializer, so its failures must be
// expressible through serde's error trait.
impl serde::ser::Error for MedleyError {
    fn custom<T: std::fmt::Display>(msg: T) -> Self {
        MedleyError::Discover(msg.to_string())
    }
}
