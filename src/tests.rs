use crate::config::{PorterConfig, PorterConfigBuilder};
use color_eyre::Result;
use std::path::Path;

/// Configuration sandboxed in `dir`: packages are written to `dir/out`, logs to `dir/logs`, and
/// no configuration file is read.
pub(crate) fn test_config(dir: &Path) -> Result<PorterConfig> {
    PorterConfigBuilder::default()
        .with_config_file(Some(dir.join("missing.toml")))
        .with_base_path(Some(dir.join("out")))
        .with_logs_dir(Some(dir.join("logs")))
        .build(0)
}
