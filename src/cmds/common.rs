use crate::config::PorterConfig;
use crate::errors::{InputError, RecordError};
use crate::export;
use crate::materialize::{MaterializeMode, MaterializeResult, Materializer, WriteStatus};
use crate::record::{Category, Record};
use color_eyre::{Report, Result, Section};
use serde_json::Value;
use std::path::PathBuf;
use tracing::{debug, error, info, warn};

const RULE: &str = "============================================================";

/// Locates and parses the export file of `category`.
///
/// # Errors
///
/// Returns the [`InputError`] of the export, decorated with a suggestion on how to fix it.
pub(crate) async fn load_records(
    config: &PorterConfig,
    category: Category,
    export_file: Option<PathBuf>,
) -> Result<Vec<Value>> {
    let candidates = export::export_candidates(config, category, export_file);
    let (path, records) = export::load_export(&candidates, &config.export_placeholder)
        .await
        .map_err(input_error_report)?;

    info!("Loading {} from {}", category.plural(), path.display());
    info!("Found {} {}", records.len(), category.plural());

    Ok(records)
}

fn input_error_report(err: InputError) -> Report {
    let suggestion = match err {
        InputError::Missing { .. } => {
            "Run EXPORT_SCRIPT.js in the browser console of the source site, save the download \
             under one of the paths above (or pass --export-file) and run again"
        }
        InputError::Placeholder { .. } => {
            "Export your records first using EXPORT_SCRIPT.js and replace the placeholder with the \
             downloaded JSON"
        }
        InputError::Unparsable { .. } => {
            "The export file must contain the JSON array downloaded by EXPORT_SCRIPT.js"
        }
        InputError::Unreadable { .. } => "Check the permissions of the export file",
    };
    Report::new(err).suggestion(suggestion)
}

// -------------------------------------------------------------------------------------------------
// Batch
// -------------------------------------------------------------------------------------------------

/// Per-record outcomes of a batch run.
#[derive(Debug, Default)]
pub(crate) struct BatchSummary {
    /// Number of elements in the export.
    pub(crate) total: usize,
    pub(crate) written: Vec<MaterializeResult>,
    pub(crate) skipped: Vec<RecordError>,
    pub(crate) not_found: Vec<RecordError>,
    pub(crate) failed: Vec<RecordError>,
}

impl BatchSummary {
    fn push_error(&mut self, err: RecordError) {
        match err {
            RecordError::MissingName { .. } => {
                warn!("[SKIP] {}", err);
                self.skipped.push(err)
            }
            RecordError::NotFound { .. } => {
                warn!("[NOT FOUND] {}", err);
                self.not_found.push(err)
            }
            RecordError::WriteFailure { .. } => {
                error!("[FAIL] {}", err);
                self.failed.push(err)
            }
        }
    }

    pub(crate) fn created(&self) -> usize {
        self.written
            .iter()
            .filter(|r| r.status == WriteStatus::Created)
            .count()
    }

    pub(crate) fn updated(&self) -> usize {
        self.written
            .iter()
            .filter(|r| r.status == WriteStatus::Updated)
            .count()
    }

    /// Logs the counts and the details of every record which was not written.
    pub(crate) fn log(&self, mode: MaterializeMode) {
        let heading = match mode {
            MaterializeMode::Create => "IMPORT COMPLETE!",
            MaterializeMode::UpdateOnly => "UPDATE COMPLETE!",
        };
        info!(
            "\n{RULE}\n{heading}\n{RULE}\nTotal records in export: {}\n  Created: {}\n  \
             Updated: {}\n  Not found: {}\n  Skipped: {}\n  Failed: {}\n{RULE}",
            self.total,
            self.created(),
            self.updated(),
            self.not_found.len(),
            self.skipped.len(),
            self.failed.len(),
        );

        if !self.not_found.is_empty() {
            warn!(
                "Records not found in the package layout:{}\nCreate them first by running \
                 without --update-only",
                list_errors(&self.not_found)
            );
        }
        if !self.skipped.is_empty() {
            warn!("Skipped records:{}", list_errors(&self.skipped));
        }
        if !self.failed.is_empty() {
            error!("Records that could not be written:{}", list_errors(&self.failed));
        }
    }
}

fn list_errors(errors: &[RecordError]) -> String {
    errors.iter().map(|e| format!("\n  - {}", e)).collect()
}

/// Materializes every exported record in order.
///
/// Record-level failures are collected in the returned summary and never stop the batch. A
/// record whose definition was already written by a record with a different name during this run
/// is not written and counts as failed, including when update-only mode finds that definition
/// under a search module.
pub(crate) async fn run_batch(
    records: Vec<Value>,
    category: Category,
    mode: MaterializeMode,
    materializer: &Materializer,
) -> BatchSummary {
    let mut summary = BatchSummary {
        total: records.len(),
        ..Default::default()
    };

    for (index, value) in records.into_iter().enumerate() {
        let record = match Record::from_value(index, value, category) {
            Ok(record) => record,
            Err(e) => {
                summary.push_error(e);
                continue;
            }
        };

        let type_label = record.type_label().to_string();
        match materializer.materialize(record, category, mode).await {
            Ok(result) => {
                let verb = match result.status {
                    WriteStatus::Created => "Created",
                    WriteStatus::Updated => "Updated",
                };
                info!("[OK] {}: {} ({}, {})", verb, result.name, type_label, result.module);
                debug!(
                    "{} definition in {}{}",
                    result.category,
                    result.directory.display(),
                    if result.stub_written {
                        ", script stub written"
                    } else {
                        ""
                    }
                );
                summary.written.push(result);
            }
            Err(e) => summary.push_error(e),
        }
    }

    summary
}

// -------------------------------------------------------------------------------------------------
// Tests
// -------------------------------------------------------------------------------------------------
