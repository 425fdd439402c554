//! Maps record names onto folder identifiers and derives where a record lives on disk.
//!
//! The package layout expected by the platform is
//! `<base>/<module>/<category>/<folder_identifier>/<folder_identifier>.json`.

use crate::config::PorterConfig;
use crate::record::{Category, Record};
use color_eyre::Result;
use color_eyre::eyre::eyre;
use lazy_static::lazy_static;
use regex::Regex;
use std::path::{Component, Path, PathBuf};

lazy_static! {
    static ref DISALLOWED_CHARS: Regex = Regex::new(r"[^\w\s-]").unwrap();
    static ref SEPARATOR_RUNS: Regex = Regex::new(r"[-\s]+").unwrap();
}

/// Converts a record name into its folder identifier.
///
/// The name is trimmed and lower-cased, every character that is not a letter, digit, underscore,
/// whitespace or hyphen is dropped, and each run of hyphens and whitespace becomes a single
/// underscore.
///
/// Distinct names may map to the same identifier (`"A-B"` and `"a b"` both give `"a_b"`).
pub(crate) fn folder_identifier(name: &str) -> String {
    let lowered = name.trim().to_lowercase();
    let stripped = DISALLOWED_CHARS.replace_all(&lowered, "");
    SEPARATOR_RUNS.replace_all(&stripped, "_").into_owned()
}

/// On-disk location of a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ResolvedLocation {
    base: PathBuf,
    module: String,
    category_segment: String,
    folder_identifier: String,
}

/// Lower-cases `module` and checks that it names a single folder directly below the base path.
fn module_segment(module: &str) -> Result<String> {
    let module = module.to_lowercase();
    let mut components = Path::new(&module).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) if !module.contains(['/', '\\']) => Ok(module),
        _ => Err(eyre!(
            "Module '{}' is not a plain folder name inside the app package",
            module
        )),
    }
}

impl ResolvedLocation {
    /// Resolves where `record` lives according to its declared module.
    ///
    /// # Errors
    ///
    /// Fails if the module is not a single plain folder name (absolute paths, separators, `.` and
    /// `..` are refused) or if the name yields an empty folder identifier.
    pub(crate) fn new(record: &Record, category: Category, config: &PorterConfig) -> Result<Self> {
        let module = module_segment(record.module().unwrap_or(&config.default_module))?;
        let folder_identifier = folder_identifier(record.name());
        if folder_identifier.is_empty() {
            return Err(eyre!(
                "Name '{}' has no characters usable as a folder name",
                record.name()
            ));
        }

        Ok(Self {
            base: config.base_path.clone(),
            module,
            category_segment: config.category_segment(category).to_string(),
            folder_identifier,
        })
    }

    /// Same record, placed under another module folder.
    pub(crate) fn in_module(&self, module: &str) -> Result<Self> {
        Ok(Self {
            module: module_segment(module)?,
            ..self.clone()
        })
    }

    pub(crate) fn module(&self) -> &str {
        &self.module
    }

    pub(crate) fn folder_identifier(&self) -> &str {
        &self.folder_identifier
    }

    /// The package directories below the base path, outermost first. Each of them carries a
    /// marker file.
    pub(crate) fn package_dirs(&self) -> [PathBuf; 3] {
        let module_dir = self.base.join(&self.module);
        let category_dir = module_dir.join(&self.category_segment);
        let record_dir = category_dir.join(&self.folder_identifier);
        [module_dir, category_dir, record_dir]
    }

    pub(crate) fn directory(&self) -> PathBuf {
        self.base
            .join(&self.module)
            .join(&self.category_segment)
            .join(&self.folder_identifier)
    }

    pub(crate) fn json_path(&self) -> PathBuf {
        self.directory()
            .join(format!("{}.json", self.folder_identifier))
    }

    pub(crate) fn stub_path(&self, extension: &str) -> PathBuf {
        self.directory()
            .join(format!("{}.{}", self.folder_identifier, extension))
    }
}

// -------------------------------------------------------------------------------------------------
// Tests
// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::test_config;
    use color_eyre::Result;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_folder_identifier_known_names() {
        assert_eq!(
            folder_identifier(" Daily EOD Sales Detail "),
            "daily_eod_sales_detail"
        );
        assert_eq!(
            folder_identifier("Surgi General Ledger"),
            "surgi_general_ledger"
        );
        assert_eq!(folder_identifier("Items on Hold"), "items_on_hold");
        assert_eq!(folder_identifier("Stock Status"), "stock_status");
    }

    #[test]
    fn test_folder_identifier_normalization() {
        assert_eq!(folder_identifier(""), "", "empty input stays empty");
        assert_eq!(
            folder_identifier("Sales (YTD) & Returns!"),
            "sales_ytd_returns",
            "punctuation is dropped before separators collapse"
        );
        assert_eq!(
            folder_identifier("Outbound - Shipping\t\tStatus"),
            "outbound_shipping_status",
            "mixed hyphen and whitespace runs collapse to one underscore"
        );
        assert_eq!(
            folder_identifier("snake_case_name"),
            "snake_case_name",
            "underscores are kept"
        );
        assert_eq!(folder_identifier("Q1 2024"), "q1_2024");
    }

    #[test]
    fn test_folder_identifier_is_idempotent() {
        for name in [
            " Daily EOD Sales Detail ",
            "Shipped Batch Expiry Report",
            "A--B  c",
            "Weird!@#Name",
            "",
        ] {
            let once = folder_identifier(name);
            assert_eq!(
                folder_identifier(&once),
                once,
                "resolving {:?} twice should not change the result",
                name
            );
        }
    }

    #[test]
    fn test_folder_identifier_collisions() {
        assert_eq!(folder_identifier("Stock-Status"), folder_identifier("stock status"));
    }

    #[test]
    fn test_resolved_location_layout() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let config = test_config(temp_dir.path())?;
        let record = Record::from_value(
            0,
            json!({"name": "Stock Status", "module": "Stock"}),
            Category::Report,
        )?;

        let location = ResolvedLocation::new(&record, Category::Report, &config)?;
        let base = &config.base_path;
        assert_eq!(location.module(), "stock");
        assert_eq!(location.folder_identifier(), "stock_status");
        assert_eq!(
            location.json_path(),
            base.join("stock/report/stock_status/stock_status.json")
        );
        assert_eq!(
            location.stub_path("py"),
            base.join("stock/report/stock_status/stock_status.py")
        );
        assert_eq!(
            location.package_dirs(),
            [
                base.join("stock"),
                base.join("stock/report"),
                base.join("stock/report/stock_status"),
            ]
        );

        let moved = location.in_module("Accounts")?;
        assert_eq!(
            moved.directory(),
            base.join("accounts/report/stock_status")
        );

        Ok(())
    }

    #[test]
    fn test_resolved_location_defaults() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let config = test_config(temp_dir.path())?;
        let record = Record::from_value(0, json!({"name": "Invoice"}), Category::PrintFormat)?;

        let location = ResolvedLocation::new(&record, Category::PrintFormat, &config)?;
        assert_eq!(
            location.directory(),
            config.base_path.join("selling/print_format/invoice"),
            "missing module falls back to the configured default"
        );

        Ok(())
    }

    #[test]
    fn test_module_must_stay_inside_base() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let config = test_config(temp_dir.path())?;
        let outside = temp_dir.path().join("escaped");

        for module in [
            outside.to_string_lossy().into_owned(),
            "../escaped".to_string(),
            "..".to_string(),
            ".".to_string(),
            "stock/report".to_string(),
            "stock\\report".to_string(),
        ] {
            let record = Record::from_value(
                0,
                json!({"name": "Stock Status", "module": module}),
                Category::Report,
            )?;
            assert!(
                ResolvedLocation::new(&record, Category::Report, &config).is_err(),
                "module {:?} must be refused",
                module
            );
        }

        let record = Record::from_value(
            0,
            json!({"name": "Stock Status", "module": "Stock"}),
            Category::Report,
        )?;
        let location = ResolvedLocation::new(&record, Category::Report, &config)?;
        assert!(location.in_module("../accounts").is_err());
        assert!(location.json_path().starts_with(&config.base_path));

        Ok(())
    }

    #[test]
    fn test_empty_folder_identifier_is_refused() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let config = test_config(temp_dir.path())?;

        for name in ["!!!", "  ", "()&"] {
            let record = Record::from_value(0, json!({"name": name}), Category::Report)?;
            assert!(
                ResolvedLocation::new(&record, Category::Report, &config).is_err(),
                "{:?} yields no folder name",
                name
            );
        }

        Ok(())
    }
}
