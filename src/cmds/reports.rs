use crate::cmds::common::{self, BatchSummary};
use crate::config::PorterConfig;
use crate::materialize::{MaterializeMode, Materializer};
use crate::record::{Category, RecordKind};
use color_eyre::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Materializes the exported reports into the package layout.
///
/// Returns `Ok(true)` once every record was processed, even if some of them failed; failures are
/// listed in the summary.
///
/// # Errors
///
/// Fails if the export cannot be loaded or the stub templates cannot be set up.
pub(crate) async fn reports(
    config: Arc<PorterConfig>,
    mode: MaterializeMode,
    export_file: Option<PathBuf>,
) -> Result<bool> {
    let records = common::load_records(&config, Category::Report, export_file).await?;
    let materializer = Materializer::new(Arc::clone(&config))?;

    info!("Writing report definitions to {}", config.base_path.display());
    let summary = common::run_batch(records, Category::Report, mode, &materializer).await;

    summary.log(mode);
    log_report_kinds(&summary, mode, &config.base_path);

    Ok(true)
}

fn log_report_kinds(summary: &BatchSummary, mode: MaterializeMode, base_path: &Path) {
    let script_reports: Vec<&str> = summary
        .written
        .iter()
        .filter(|r| r.kind == RecordKind::Script)
        .map(|r| r.name.as_str())
        .collect();
    let query_reports = summary.written.len() - script_reports.len();

    info!(
        "Reports written: {}\n  - Query Reports: {}\n  - Script Reports: {}",
        summary.written.len(),
        query_reports,
        script_reports.len()
    );

    if mode == MaterializeMode::UpdateOnly {
        info!(
            "Next steps:\n1. Review the changes: git diff\n2. Commit and push the updated \
             definitions\n3. Run migrate on the target site"
        );
        return;
    }

    if !script_reports.is_empty() {
        info!(
            "Script Reports that may need manual review:{}\nCheck each Script Report's .py file \
             and ensure the report_script content is properly formatted.",
            script_reports
                .iter()
                .map(|name| format!("\n  - {}", name))
                .collect::<String>()
        );
    }

    info!(
        "Next steps:\n1. Review the created files in {}\n2. For Script Reports, verify the Python \
         code is correct\n3. Commit the files and push them\n4. Install the app on the target site",
        base_path.display()
    );
}

// -------------------------------------------------------------------------------------------------
// Tests
// -------------------------------------------------------------------------------------------------
