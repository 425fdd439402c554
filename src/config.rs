//! This module handles the configuration for frappe-porter.
//!
//! It provides functionality to read, parse, and initialize the configuration from a TOML file or
//! use default values when necessary.

use crate::record::Category;
use crate::utils::file_fs::expand_path;
use color_eyre::Result;
use color_eyre::eyre::{OptionExt, WrapErr};
use serde::Deserialize;
use std::path::{Path, PathBuf};

// -------------------------------------------------------------------------------------------------
// Porter Config
// -------------------------------------------------------------------------------------------------

/// Representation of the frappe-porter configuration.
///
/// The configuration file is expected under `$XDG_CONFIG_HOME/frappe-porter/config.toml` (usually
/// `~/.config/frappe-porter/config.toml`). Every value is optional.
///
/// # Defaults
///
/// ## Layout
/// - `base_path`: `"surgishop_reports"` - Root of the app package, relative to the working
///   directory
/// - `default_module`: `"Selling"` - Module used for records without one
/// - `report_dir`: `"report"` - Category folder for reports
/// - `print_format_dir`: `"print_format"` - Category folder for print formats
/// - `marker_file`: `"__init__.py"` - Empty file marking a package directory
/// - `script_extension`: `"py"` - Extension of generated script report stubs
///
/// ## Input
/// - `reports_export_file`: `"surgishop_reports_export.json"`
/// - `print_formats_export_file`: `"surgishop_print_formats_export.json"`
/// - `export_placeholder`: `"[JSON_CONTENT_HERE]"` - Content of a not yet populated export file
/// - `update_search_modules`: `["accounts", "selling", "stock"]` - Module folders searched when
///   updating a record whose declared module holds no definition
///
/// ## Stubs
/// - `stub_copyright`: `"Copyright (c) 2025, Surgishop"`
/// - `stub_license`: `"MIT"`
///
/// ## Logging
/// - `logs_dir`: `"$XDG_DATA_HOME/frappe-porter/logs"`
/// - `logs_max`: 15 - Maximum number of logs to retain
///
/// # Example Configuration
///
/// ```toml
/// base_path = "~/src/my_reports/my_reports"
/// default_module = "Stock"
/// stub_copyright = "Copyright (c) 2025, ACME"
/// ```
#[derive(Debug, Clone)]
pub(crate) struct PorterConfig {
    /// Location of the config file that was (or would have been) read.
    pub(crate) config_file: PathBuf,
    /// Root folder of the generated app package.
    pub(crate) base_path: PathBuf,
    /// Module of records which do not declare one.
    pub(crate) default_module: String,
    pub(crate) report_dir: String,
    pub(crate) print_format_dir: String,
    pub(crate) marker_file: String,
    pub(crate) script_extension: String,
    pub(crate) reports_export_file: PathBuf,
    pub(crate) print_formats_export_file: PathBuf,
    pub(crate) export_placeholder: String,
    pub(crate) update_search_modules: Vec<String>,
    /// Copyright line of generated stubs, without the comment marker.
    pub(crate) stub_copyright: String,
    pub(crate) stub_license: String,
    /// Directory of the log files
    pub(crate) logs_dir: PathBuf,
    /// Maximum number of log files to retain
    pub(crate) logs_max: usize,
}

impl PorterConfig {
    /// Folder name of a category inside a module.
    pub(crate) fn category_segment(&self, category: Category) -> &str {
        match category {
            Category::Report => &self.report_dir,
            Category::PrintFormat => &self.print_format_dir,
        }
    }

    /// Configured export file of a category.
    pub(crate) fn export_file(&self, category: Category) -> &Path {
        match category {
            Category::Report => &self.reports_export_file,
            Category::PrintFormat => &self.print_formats_export_file,
        }
    }
}

// -------------------------------------------------------------------------------------------------
// Config Builder
// -------------------------------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct PorterConfigBuilder {
    #[serde(skip)]
    pub(crate) config_file: Option<PathBuf>,
    pub(crate) base_path: Option<PathBuf>,
    pub(crate) default_module: Option<String>,
    pub(crate) report_dir: Option<String>,
    pub(crate) print_format_dir: Option<String>,
    pub(crate) marker_file: Option<String>,
    pub(crate) script_extension: Option<String>,
    pub(crate) reports_export_file: Option<PathBuf>,
    pub(crate) print_formats_export_file: Option<PathBuf>,
    pub(crate) export_placeholder: Option<String>,
    pub(crate) update_search_modules: Option<Vec<String>>,
    pub(crate) stub_copyright: Option<String>,
    pub(crate) stub_license: Option<String>,
    pub(crate) logs_dir: Option<PathBuf>,
    pub(crate) logs_max: Option<usize>,
}

impl PorterConfigBuilder {
    // --
    // * Builders

    pub(crate) fn with_config_file(&mut self, config_file: Option<PathBuf>) -> &mut Self {
        let new = self;
        new.config_file = config_file;
        new
    }

    pub(crate) fn with_base_path(&mut self, base_path: Option<PathBuf>) -> &mut Self {
        let new = self;
        new.base_path = base_path;
        new
    }

    pub(crate) fn with_default_module(&mut self, default_module: Option<String>) -> &mut Self {
        let new = self;
        new.default_module = default_module;
        new
    }

    pub(crate) fn with_logs_dir(&mut self, logs_dir: Option<PathBuf>) -> &mut Self {
        let new = self;
        new.logs_dir = logs_dir;
        new
    }

    pub(crate) fn with_logs_max(&mut self, logs_max: Option<usize>) -> &mut Self {
        let new = self;
        new.logs_max = logs_max;
        new
    }

    /// Reads and returns the contents of a configuration file.
    fn read_config_file(&self, path: &Path) -> Result<String> {
        let config_file_content: String = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read config from {}", path.display()))?;

        Ok(config_file_content)
    }

    /// Picks the builder override, then the file value, then the default, and expands it.
    fn expand_config_path(
        value: &Option<PathBuf>,
        parsed_value: &Option<PathBuf>,
        default: &str,
    ) -> Result<PathBuf> {
        match value.as_ref().or(parsed_value.as_ref()) {
            Some(path) => expand_path::<&PathBuf, &str>(path, None),
            None => expand_path::<&str, &str>(default, None),
        }
    }

    /// Constructs the final configuration by merging defaults, file values, and runtime overrides
    ///
    /// Resolution order (highest priority last):
    /// 1. Default values
    /// 2. Config file values
    /// 3. Explicit builder overrides
    pub(crate) fn build(&self, verbosity: u8) -> Result<PorterConfig> {
        let config_file_path = if let Some(ref path) = self.config_file {
            Clone::clone(path)
        } else {
            dirs::config_dir()
                .ok_or_eyre("Could not determine user's config directory")?
                .join("frappe-porter")
                .join("config.toml")
        };

        // A missing config file is fine, every value has a default
        let conf_string = match self.read_config_file(&config_file_path) {
            Ok(s) => s,
            Err(_) => {
                if verbosity > 0 {
                    eprintln!("No config file found in {}", &config_file_path.display());
                    eprintln!("Default config values will be used")
                }
                "".to_string()
            }
        };
        let parsed_data: PorterConfigBuilder = toml::from_str(&conf_string)
            .wrap_err_with(|| format!("Failed to parse {}", config_file_path.display()))?;

        const DEFAULT_BASE_PATH: &str = "surgishop_reports";
        const DEFAULT_REPORTS_EXPORT: &str = "surgishop_reports_export.json";
        const DEFAULT_PRINT_FORMATS_EXPORT: &str = "surgishop_print_formats_export.json";

        let pick = |value: &Option<String>, parsed: &Option<String>, default: &str| -> String {
            value
                .as_ref()
                .or(parsed.as_ref())
                .cloned()
                .unwrap_or_else(|| default.to_string())
        };

        let base_path =
            Self::expand_config_path(&self.base_path, &parsed_data.base_path, DEFAULT_BASE_PATH)?;
        let reports_export_file = Self::expand_config_path(
            &self.reports_export_file,
            &parsed_data.reports_export_file,
            DEFAULT_REPORTS_EXPORT,
        )?;
        let print_formats_export_file = Self::expand_config_path(
            &self.print_formats_export_file,
            &parsed_data.print_formats_export_file,
            DEFAULT_PRINT_FORMATS_EXPORT,
        )?;

        let logs_dir = match self.logs_dir.as_ref().or(parsed_data.logs_dir.as_ref()) {
            Some(path) => expand_path::<&PathBuf, &str>(path, None)?,
            None => crate::logs::get_default_log_dir()?,
        };

        Ok(PorterConfig {
            config_file: config_file_path,
            base_path,
            default_module: pick(
                &self.default_module,
                &parsed_data.default_module,
                "Selling",
            ),
            report_dir: pick(&self.report_dir, &parsed_data.report_dir, "report"),
            print_format_dir: pick(
                &self.print_format_dir,
                &parsed_data.print_format_dir,
                "print_format",
            ),
            marker_file: pick(&self.marker_file, &parsed_data.marker_file, "__init__.py"),
            script_extension: pick(
                &self.script_extension,
                &parsed_data.script_extension,
                "py",
            ),
            reports_export_file,
            print_formats_export_file,
            export_placeholder: pick(
                &self.export_placeholder,
                &parsed_data.export_placeholder,
                "[JSON_CONTENT_HERE]",
            ),
            update_search_modules: match self.update_search_modules {
                Some(ref value) => Clone::clone(value),
                None => parsed_data.update_search_modules.unwrap_or_else(|| {
                    ["accounts", "selling", "stock"]
                        .into_iter()
                        .map(String::from)
                        .collect()
                }),
            },
            stub_copyright: pick(
                &self.stub_copyright,
                &parsed_data.stub_copyright,
                "Copyright (c) 2025, Surgishop",
            ),
            stub_license: pick(&self.stub_license, &parsed_data.stub_license, "MIT"),
            logs_dir,
            logs_max: self.logs_max.or(parsed_data.logs_max).unwrap_or(15),
        })
    }
}

// -------------------------------------------------------------------------------------------------
// Tests
// -------------------------------------------------------------------------------------------------
