//! Error types for image handling, submission and configuration.
//!
//! Editing itself never fails: editor operations report whether anything
//! changed instead.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("Could not read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{name} is {size} bytes, the limit is {limit}")]
    TooLarge { name: String, size: u64, limit: u64 },

    #[error("{name} is not an image ({mime_type})")]
    NotAnImage { name: String, mime_type: String },

    #[error("Could not store {name} in {dir}: {source}")]
    Store {
        name: String,
        dir: PathBuf,
        source: std::io::Error,
    },

    #[error("Image loader stopped before finishing")]
    Interrupted,
}

#[derive(Error, Debug)]
pub enum SubmitError {
    #[error("A title is required")]
    MissingTitle,

    #[error("The article has no content")]
    EmptyDocument,

    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server answered {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Invalid draft: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid configuration in {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Could not write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Could not encode configuration: {0}")]
    Encode(#[from] toml::ser::Error),
}
