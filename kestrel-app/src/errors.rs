//! Error types for the replay driver.

use std::path::PathBuf;

use kestrel_data::LayoutError;
use kestrel_input::InputError;
use thiserror::Error;

/// Errors that stop a replay before or while it runs.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Failed to read config {}: {source}", .path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config {}: {source}", .path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unknown layout preset '{0}' (known: {1})")]
    UnknownPreset(String, String),

    #[error("No dataset root given, use --dataset or set \"dataset\" in the config")]
    MissingDataset,

    #[error("Dataset root {} is not a directory", .0.display())]
    DatasetNotFound(PathBuf),

    #[error("Invalid layout: {0}")]
    Layout(#[from] LayoutError),

    #[error("Input error: {0}")]
    Input(#[from] InputError),
}
