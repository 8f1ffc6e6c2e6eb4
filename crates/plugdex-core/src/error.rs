//! Core error types.

use std::path::PathBuf;

use plugdex_config::{ConfigError, ErrorKind};
use thiserror::Error;

use crate::ConstructionMethod;

/// Settings overlay errors.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The durable tier rejected the operation.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A group root or key name was empty.
    #[error("{0} must not be empty")]
    EmptyName(&'static str),

    /// The host tier returned a value that cannot be normalized.
    #[error("unknown data type from the host settings backend for \"{key}\": {type_name}")]
    UnknownHostDataType { key: String, type_name: String },

    /// The host tier refused a mirrored write.
    #[error("host settings backend rejected \"{key}\": {reason}")]
    Host { key: String, reason: String },
}

impl SettingsError {
    /// Returns the broad category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(err) => err.kind(),
            Self::EmptyName(_) => ErrorKind::Value,
            Self::UnknownHostDataType { .. } => ErrorKind::UnknownDataType,
            Self::Host { .. } => ErrorKind::Io,
        }
    }
}

/// Result type for settings operations.
pub type SettingsResult<T> = Result<T, SettingsError>;

/// Plugin metadata errors.
#[derive(Debug, Error)]
pub enum MetadataError {
    /// Field name is not part of the schema.
    #[error("\"{0}\" is not a valid metadata field")]
    UnknownField(String),

    /// A required field has no value after construction.
    #[error("metadata field \"{0}\" not present but required")]
    MissingRequiredField(&'static str),

    /// Value type does not match the field type.
    #[error("metadata field \"{field}\" expects {expected}, got {actual}")]
    TypeMismatch {
        field: &'static str,
        expected: &'static str,
        actual: &'static str,
    },

    /// String value for a boolean field is not part of the lexicon.
    #[error("metadata field \"{field}\" expects a boolean, got \"{value}\"")]
    NotABool {
        field: &'static str,
        value: String,
        #[source]
        source: ConfigError,
    },

    /// `metadata.txt` content could not be parsed.
    #[error("invalid metadata.txt: {0}")]
    InvalidMetadataTxt(String),
}

impl MetadataError {
    /// Returns the broad category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownField(_) => ErrorKind::Key,
            Self::MissingRequiredField(_) => ErrorKind::Requirement,
            Self::TypeMismatch { .. } | Self::NotABool { .. } => ErrorKind::Type,
            Self::InvalidMetadataTxt(_) => ErrorKind::Value,
        }
    }
}

/// Result type for metadata operations.
pub type MetadataResult<T> = Result<T, MetadataError>;

/// Repository errors.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Repository id is empty.
    #[error("repository id must not be empty")]
    EmptyId,

    /// Repository name is empty.
    #[error("repository name must not be empty")]
    EmptyName,

    /// Operation is not provided by this repository type.
    #[error("{operation} is not implemented for repository type \"{repo_type}\"")]
    NotImplemented {
        repo_type: &'static str,
        operation: &'static str,
    },

    /// The user aborted interactive construction.
    #[error("cancelled by user")]
    Cancelled,

    /// Another repository of the same type already uses this id.
    #[error("repository id already in use: {0}")]
    IdCollision(String),

    /// Path is not an existing directory.
    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),

    /// Unknown construction method tag.
    #[error("unknown construction method: {0}")]
    UnknownMethod(String),

    /// A persisted setting has an unusable value.
    #[error("invalid setting \"{key}\": {reason}")]
    InvalidSetting { key: String, reason: String },

    /// Settings error.
    #[error(transparent)]
    Settings(#[from] SettingsError),

    /// Metadata error.
    #[error(transparent)]
    Metadata(#[from] MetadataError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RepositoryError {
    /// Creates a [`RepositoryError::NotImplemented`] error.
    pub const fn not_implemented(repo_type: &'static str, operation: &'static str) -> Self {
        Self::NotImplemented {
            repo_type,
            operation,
        }
    }

    /// Returns the broad category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyId
            | Self::EmptyName
            | Self::IdCollision(_)
            | Self::NotADirectory(_)
            | Self::UnknownMethod(_) => ErrorKind::Value,
            Self::NotImplemented { .. } => ErrorKind::NotImplemented,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::InvalidSetting { .. } => ErrorKind::Type,
            Self::Settings(err) => err.kind(),
            Self::Metadata(err) => err.kind(),
            Self::Io(_) => ErrorKind::Io,
        }
    }
}

/// Result type for repository operations.
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Index and backend registry errors.
#[derive(Debug, Error)]
pub enum IndexError {
    /// No backend is registered under this repository type.
    #[error("unknown repository type: {0}")]
    UnknownRepoType(String),

    /// The backend has no constructor for this method.
    #[error("repository type \"{repo_type}\" cannot be created from {method}")]
    UnsupportedMethod {
        repo_type: String,
        method: ConstructionMethod,
    },

    /// A backend descriptor failed registration checks.
    #[error("invalid backend \"{repo_type}\": {reason}")]
    InvalidBackend {
        repo_type: String,
        reason: &'static str,
    },

    /// No repository with this id.
    #[error("no such repository: {0}")]
    NoSuchRepository(String),

    /// A repository with this id is already in the index.
    #[error("repository already in index: {0}")]
    DuplicateRepository(String),

    /// Protected repositories cannot be removed.
    #[error("repository is protected: {0}")]
    ProtectedRepository(String),

    /// Priority direction other than -1 or +1.
    #[error("invalid priority direction {0}, expected -1 or 1")]
    InvalidDirection(i64),

    /// No plugin with this id.
    #[error("no such plugin: {0}")]
    NoSuchPlugin(String),

    /// A plugin with this id is already in the index.
    #[error("plugin already in index: {0}")]
    DuplicatePlugin(String),

    /// A policy flag setting holds neither a boolean nor a lexicon string.
    #[error("setting \"{key}\" must be a boolean, got {actual}")]
    InvalidPolicy { key: &'static str, actual: &'static str },

    /// Repository error.
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// Settings error.
    #[error(transparent)]
    Settings(#[from] SettingsError),
}

impl IndexError {
    /// Returns the broad category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidPolicy { .. } => ErrorKind::Type,
            Self::Repository(err) => err.kind(),
            Self::Settings(err) => err.kind(),
            _ => ErrorKind::Value,
        }
    }
}

/// Result type for index operations.
pub type IndexResult<T> = Result<T, IndexError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_field_display() {
        let err = MetadataError::UnknownField("colour".to_string());
        assert_eq!(err.to_string(), "\"colour\" is not a valid metadata field");
        assert_eq!(err.kind(), ErrorKind::Key);
    }

    #[test]
    fn test_missing_required_field_kind() {
        let err = MetadataError::MissingRequiredField("id");
        assert_eq!(err.kind(), ErrorKind::Requirement);
    }

    #[test]
    fn test_not_implemented_display() {
        let err = RepositoryError::not_implemented("remote", "refresh");
        assert_eq!(
            err.to_string(),
            "refresh is not implemented for repository type \"remote\""
        );
        assert_eq!(err.kind(), ErrorKind::NotImplemented);
    }

    #[test]
    fn test_cancelled_is_distinct() {
        let err = RepositoryError::Cancelled;
        assert_eq!(err.kind(), ErrorKind::Cancelled);
        assert_eq!(err.to_string(), "cancelled by user");
    }

    #[test]
    fn test_nested_kinds_propagate() {
        let err: IndexError = RepositoryError::from(SettingsError::EmptyName("root")).into();
        assert_eq!(err.kind(), ErrorKind::Value);

        let err: IndexError = SettingsError::UnknownHostDataType {
            key: "a".to_string(),
            type_name: "QByteArray".to_string(),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::UnknownDataType);
    }

    #[test]
    fn test_index_error_display() {
        assert_eq!(
            IndexError::NoSuchRepository("extra".to_string()).to_string(),
            "no such repository: extra"
        );
        assert_eq!(
            IndexError::InvalidDirection(2).to_string(),
            "invalid priority direction 2, expected -1 or 1"
        );
    }
}
