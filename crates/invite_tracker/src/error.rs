//! Error types for the invite tracker

use std::{io::Error as IoError, path::PathBuf};
use thiserror::Error;

/// Domain-mapping configuration errors.
///
/// A single bad leaf is skipped with a warning during registry rebuild;
/// these variants describe why a leaf was rejected.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Domain '{0}' has an empty channel id")]
    EmptyChannelId(String),

    #[error("Domain '{0}' has an empty owner id")]
    EmptyOwnerId(String),

    #[error("Domain path is empty")]
    EmptyDomain,
}

/// Ledger persistence errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to create directory {0}: {1}")]
    DirectoryCreate(PathBuf, IoError),

    #[error("Failed to read file {0}: {1}")]
    FileRead(PathBuf, IoError),

    #[error("Failed to create file {0}: {1}")]
    FileCreate(PathBuf, IoError),

    #[error("Failed to write to file {0}: {1}")]
    FileWrite(PathBuf, IoError),

    #[error("Failed to sync file {0}: {1}")]
    FileSync(PathBuf, IoError),

    #[error("Failed to rename file from {0} to {1}: {2}")]
    FileRename(PathBuf, PathBuf, IoError),

    #[error("Failed to serialize ledger state: {0}")]
    Serialization(serde_json::Error),

    #[error("Failed to deserialize file {0}: {1}")]
    Deserialization(PathBuf, serde_json::Error),
}

/// Top-level tracker errors
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("Actor '{actor}' lacks capability '{capability}'")]
    Unauthorized { actor: String, capability: String },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

// Result type aliases for convenience
pub type StorageResult<T> = Result<T, StorageError>;
pub type TrackerResult<T> = Result<T, TrackerError>;
