use crate::cmds::common;
use crate::config::PorterConfig;
use crate::materialize::{MaterializeMode, Materializer};
use crate::record::Category;
use color_eyre::Result;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Materializes the exported print formats into the package layout.
///
/// Every written print format is flagged as standard and reset to draft state.
///
/// # Errors
///
/// Fails if the export cannot be loaded or the materializer cannot be set up.
pub(crate) async fn print_formats(
    config: Arc<PorterConfig>,
    mode: MaterializeMode,
    export_file: Option<PathBuf>,
) -> Result<bool> {
    let records = common::load_records(&config, Category::PrintFormat, export_file).await?;
    let materializer = Materializer::new(Arc::clone(&config))?;

    info!(
        "Writing print format definitions to {}",
        config.base_path.display()
    );
    let summary = common::run_batch(records, Category::PrintFormat, mode, &materializer).await;

    summary.log(mode);
    info!(
        "Next steps:\n1. Review the written files in {}\n2. Add the print formats to the app \
         fixtures in hooks.py\n3. Commit and push\n4. Install or update the app on the target \
         site\n5. Run migrate to sync the print formats",
        config.base_path.display()
    );

    Ok(true)
}

// -------------------------------------------------------------------------------------------------
// Tests
// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::test_config;
    use serde_json::{Value, json};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_print_formats_command() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let config = Arc::new(test_config(temp_dir.path())?);
        let export_file = temp_dir.path().join("print_formats.json");
        std::fs::write(
            &export_file,
            r#"[{"name": "Surgi Invoice", "module": "Accounts", "is_standard": "No",
                 "docstatus": 1, "html": "<div>{{ doc.name }}</div>"},
                {"name": "Delivery Slip"}]"#,
        )?;

        assert!(
            print_formats(
                Arc::clone(&config),
                MaterializeMode::Create,
                Some(export_file.clone())
            )
            .await?
        );

        let invoice = config
            .base_path
            .join("accounts/print_format/surgi_invoice/surgi_invoice.json");
        let value: Value = serde_json::from_slice(&std::fs::read(&invoice)?)?;
        assert_eq!(value["is_standard"], json!("Yes"));
        assert_eq!(value["docstatus"], json!(0));
        assert_eq!(value["html"], json!("<div>{{ doc.name }}</div>"));
        assert!(
            config
                .base_path
                .join("selling/print_format/delivery_slip/delivery_slip.json")
                .is_file(),
            "print formats without module land in the default module"
        );

        // Update-only rewrites in place
        std::fs::remove_file(&invoice)?;
        assert!(
            print_formats(
                Arc::clone(&config),
                MaterializeMode::UpdateOnly,
                Some(export_file)
            )
            .await?
        );
        assert!(!invoice.exists(), "update-only never recreates definitions");

        Ok(())
    }
}
