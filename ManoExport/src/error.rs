//! Error types for `manoexport`

use std::path::PathBuf;

use thiserror::Error;

/// The error type for export operations.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum Error {
    /// Bundle reading error.
    #[error("bundle error: {0}")]
    Bundle(#[from] unitybundle::Error),

    /// IO error from file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be parsed.
    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),

    /// Summary could not be serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The bundle directory under the game root does not exist.
    #[error("asset directory not found: {path}")]
    AssetRootNotFound {
        /// The expected asset directory.
        path: PathBuf,
    },

    /// The game root is missing or not a directory.
    #[error("not a directory: {path}")]
    InvalidGameRoot {
        /// The path that was given.
        path: PathBuf,
    },

    /// An asset source could not serve a bundle.
    #[error("asset source error: {0}")]
    Asset(String),
}

/// A specialized Result type for `manoexport` operations.
pub type Result<T> = std::result::Result<T, Error>;
