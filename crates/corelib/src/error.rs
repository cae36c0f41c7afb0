//! Error types for the core library.

use thiserror::Error;

use crate::setting::SettingKind;

/// Result type alias for the core library.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the core library.
#[derive(Debug, Error)]
pub enum Error {
    /// A raw value could not be coerced into the setting's declared type.
    #[error("invalid {kind} value {value:?}")]
    InvalidValue { kind: SettingKind, value: String },

    /// A properties document could not be read.
    #[error("failed to read properties file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A properties document is not valid YAML, or its root is not a mapping.
    #[error("malformed properties document: {0}")]
    MalformedProperties(String),
}

impl Error {
    pub(crate) fn invalid(kind: SettingKind, value: impl Into<String>) -> Self {
        Error::InvalidValue {
            kind,
            value: value.into(),
        }
    }
}
