//! Error taxonomy of a porting run.
//!
//! [`InputError`]s concern the export file as a whole and abort the invocation. [`RecordError`]s
//! concern a single record; they are collected by the batch runner and only show up in the
//! summary.

use color_eyre::Report;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Run-level failures while locating or reading the export file.
#[derive(Debug, Error)]
pub(crate) enum InputError {
    /// None of the probed locations holds an export file.
    #[error("Export file not found in any of these locations:{}", list_paths(.probed))]
    Missing { probed: Vec<PathBuf> },

    /// The export file exists but could not be read.
    #[error("Failed to read export file {}", .path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The export file is empty or only holds the "not yet filled in" token.
    #[error("Export file {} appears to be empty or contains the placeholder", .path.display())]
    Placeholder { path: PathBuf },

    /// The content is not JSON or not a top-level array.
    #[error("Invalid export file {}: {reason}", .path.display())]
    Unparsable { path: PathBuf, reason: String },
}

fn list_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| format!("\n  - {}", p.display()))
        .collect()
}

/// Per-record failures. None of them stops the batch.
#[derive(Debug, Error)]
pub(crate) enum RecordError {
    /// The record carries no usable `name` and was skipped.
    #[error("Record #{index} has no name, skipping")]
    MissingName { index: usize },

    /// Update-only mode found no JSON definition to update.
    #[error("Could not find JSON file for {name} at {}", .path.display())]
    NotFound { name: String, path: PathBuf },

    /// Writing the record failed. `cause` holds the full error chain.
    #[error("Failed to write {name}: {cause:#}")]
    WriteFailure { name: String, cause: Report },
}

impl RecordError {
    pub(crate) fn write_failure(name: &str, cause: Report) -> Self {
        RecordError::WriteFailure {
            name: name.to_string(),
            cause,
        }
    }

    pub(crate) fn not_found(name: &str, path: &Path) -> Self {
        RecordError::NotFound {
            name: name.to_string(),
            path: path.to_path_buf(),
        }
    }
}
