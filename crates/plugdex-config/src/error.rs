//! Configuration error types.

use std::fmt;

use thiserror::Error;

/// Broad category of a failure, shared by every Plugdex error type.
///
/// Callers that only need to know *what kind* of mistake happened (bad type,
/// bad value, unknown metadata field, ...) match on this instead of on the
/// concrete error enums.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Wrong shape or type of a value at a validated boundary.
    Type,
    /// Structurally valid but semantically invalid input.
    Value,
    /// Access to an undeclared metadata field.
    Key,
    /// A required metadata field has no value.
    Requirement,
    /// Operation not provided by this repository type.
    NotImplemented,
    /// A host settings value could not be normalized.
    UnknownDataType,
    /// The user aborted an interactive operation.
    Cancelled,
    /// Reading or writing persisted state failed.
    Io,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Type => "type",
            Self::Value => "value",
            Self::Key => "key",
            Self::Requirement => "requirement",
            Self::NotImplemented => "not-implemented",
            Self::UnknownDataType => "unknown-data-type",
            Self::Cancelled => "cancelled",
            Self::Io => "io",
        };
        f.write_str(s)
    }
}

/// Durable settings errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Key is empty or contains empty segments.
    #[error("invalid settings key \"{key}\": {reason}")]
    InvalidKey { key: String, reason: &'static str },

    /// Key has neither a stored value nor a default.
    #[error("settings key not found: {0}")]
    UnknownKey(String),

    /// Value is not JSON-compatible (or is null).
    #[error("invalid value for settings key \"{key}\": {reason}")]
    InvalidValue { key: String, reason: &'static str },

    /// Value type differs from the type already stored for the key.
    #[error("settings key \"{key}\" has type {expected}, got {actual}")]
    TypeMismatch {
        key: String,
        expected: &'static str,
        actual: &'static str,
    },

    /// String is not part of the boolean lexicon.
    #[error("not a boolean: \"{0}\"")]
    NotABool(String),

    /// Invalid TOML syntax in the settings file.
    #[error("invalid TOML: {0}")]
    InvalidToml(#[from] toml::de::Error),

    /// The settings file holds an entry that could never have been written.
    #[error("invalid settings file entry \"{key}\": {reason}")]
    InvalidEntry { key: String, reason: &'static str },

    /// Settings could not be serialized.
    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConfigError {
    /// Returns the broad category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidKey { .. } | Self::UnknownKey(_) => ErrorKind::Value,
            Self::InvalidValue { .. } | Self::TypeMismatch { .. } | Self::NotABool(_) => {
                ErrorKind::Type
            }
            Self::InvalidToml(_) | Self::InvalidEntry { .. } | Self::Serialize(_) | Self::Io(_) => {
                ErrorKind::Io
            }
        }
    }
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_key_display() {
        let err = ConfigError::UnknownKey("manager/nope".to_string());
        assert_eq!(err.to_string(), "settings key not found: manager/nope");
        assert_eq!(err.kind(), ErrorKind::Value);
    }

    #[test]
    fn test_type_mismatch_display() {
        let err = ConfigError::TypeMismatch {
            key: "manager/priority".to_string(),
            expected: "array",
            actual: "string",
        };
        assert_eq!(
            err.to_string(),
            "settings key \"manager/priority\" has type array, got string"
        );
        assert_eq!(err.kind(), ErrorKind::Type);
    }

    #[test]
    fn test_not_a_bool_is_type_kind() {
        let err = ConfigError::NotABool("maybe".to_string());
        assert_eq!(err.to_string(), "not a boolean: \"maybe\"");
        assert_eq!(err.kind(), ErrorKind::Type);
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(ErrorKind::NotImplemented.to_string(), "not-implemented");
        assert_eq!(ErrorKind::UnknownDataType.to_string(), "unknown-data-type");
    }

    #[test]
    fn test_error_is_debug() {
        let err = ConfigError::UnknownKey("test".to_string());
        let debug = format!("{err:?}");
        assert!(debug.contains("UnknownKey"));
    }
}
