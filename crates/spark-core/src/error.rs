//! Error types

use std::path::PathBuf;
use thiserror::Error;

use crate::config::ConfigError;

pub type SparkResult<T> = Result<T, SparkError>;

/// Errors surfaced by the core.
///
/// Classification and order parsing never produce errors; untrusted input
/// degrades to "not a diagram" or "unranked" instead. The variants here cover
/// the collaborator seams: reading files, resolving renderers and accepting
/// settings.
#[derive(Error, Debug)]
pub enum SparkError {
    #[error("Failed to read file: {path}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("File is not valid UTF-8: {path}")]
    FileNotText { path: PathBuf },

    #[error("No renderer registered for '{renderer}'")]
    RendererNotFound { renderer: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),
}
