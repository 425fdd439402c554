//! Logging facilities, built on tracing.
//!
//! Messages are shown in the terminal and written to a log file per run. Only the log files of the
//! most recent runs are kept.

use chrono::Local;
use color_eyre::Result;
use color_eyre::eyre::{OptionExt, WrapErr};
use derive_builder::Builder;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_error::ErrorLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const LOG_PREFIX: &str = "frappe-porter_";

#[derive(Debug, Clone, Builder)]
#[builder(setter(prefix = "with"))]
pub(crate) struct Logger {
    /// 0 = info, 1 = debug, 2 = trace
    verbosity: u8,
    #[builder(setter(into, prefix = "with"))]
    log_dir: PathBuf,
    /// Number of log files to keep, including the one of the current run.
    max_logs: usize,
}

impl Logger {
    /// Installs the global subscriber.
    ///
    /// The returned guard flushes the log file when dropped and must be held until the program
    /// exits.
    pub(crate) fn start(&self) -> Result<WorkerGuard> {
        let level = match self.verbosity {
            0 => "info",
            1 => "debug",
            _ => "trace",
        };

        fs::create_dir_all(&self.log_dir).wrap_err_with(|| {
            format!("Failed to create log directory {}", self.log_dir.display())
        })?;
        rotate_logs(&self.log_dir, self.max_logs.saturating_sub(1))?;

        let file_name = format!("{}{}.log", LOG_PREFIX, Local::now().format("%Y%m%d_%H%M%S"));
        let file_appender = tracing_appender::rolling::never(&self.log_dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false)
            .with_timer(ChronoLocal::rfc_3339());

        let terminal_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stdout)
            .without_time()
            .with_target(self.verbosity > 0);

        tracing_subscriber::registry()
            .with(EnvFilter::try_new(format!("frappe_porter={}", level))?)
            .with(terminal_layer)
            .with(file_layer)
            .with(ErrorLayer::default())
            .try_init()
            .wrap_err("Failed to initialize logging")?;

        Ok(guard)
    }
}

/// Default log directory, `<data dir>/frappe-porter/logs`.
pub(crate) fn get_default_log_dir() -> Result<PathBuf> {
    Ok(dirs::data_dir()
        .ok_or_eyre("Failed to determine the user data directory")?
        .join("frappe-porter")
        .join("logs"))
}

/// Removes old log files from `log_dir`, keeping the `keep` newest ones.
fn rotate_logs<P: AsRef<Path>>(log_dir: P, keep: usize) -> Result<()> {
    let mut log_files: Vec<_> = fs::read_dir(&log_dir)
        .wrap_err_with(|| format!("Failed to read log directory {:?}", log_dir.as_ref()))?
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            let path = entry.path();
            path.extension().is_some_and(|ext| ext == "log")
                && entry
                    .file_name()
                    .to_string_lossy()
                    .starts_with(LOG_PREFIX)
        })
        .collect();

    // Timestamped names sort chronologically, newest first
    log_files.sort_by_key(|entry| entry.file_name());
    log_files.reverse();

    for old_log in log_files.iter().skip(keep) {
        fs::remove_file(old_log.path())
            .wrap_err_with(|| format!("Failed to remove old log file {:?}", old_log.path()))?;
    }

    Ok(())
}

// -------------------------------------------------------------------------------------------------
// Tests
// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::tempdir;

    #[test]
    fn test_log_rotation() -> Result<()> {
        let temp_dir = tempdir()?;
        for i in 0..10 {
            File::create(
                temp_dir
                    .path()
                    .join(format!("frappe-porter_20250128_21441{}.log", i)),
            )?;
        }
        for i in 0..5 {
            File::create(
                temp_dir
                    .path()
                    .join(format!("frappe-porter_20250128_21442{}.log", i)),
            )?;
        }
        File::create(temp_dir.path().join("notes.log"))?;

        rotate_logs(temp_dir.path(), 9)?;

        let mut remaining: Vec<_> = fs::read_dir(&temp_dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .collect();
        remaining.sort();

        assert_eq!(remaining.len(), 10, "9 logs plus the foreign file");
        assert_eq!(remaining[0], "frappe-porter_20250128_214416.log");
        assert_eq!(remaining[8], "frappe-porter_20250128_214424.log");
        assert_eq!(
            remaining[9], "notes.log",
            "files without the log prefix are left alone"
        );

        Ok(())
    }

    #[test]
    fn test_rotation_keeps_everything_below_limit() -> Result<()> {
        let temp_dir = tempdir()?;
        File::create(temp_dir.path().join("frappe-porter_20250128_214410.log"))?;

        rotate_logs(temp_dir.path(), 14)?;

        assert_eq!(fs::read_dir(&temp_dir)?.count(), 1);
        Ok(())
    }

    #[test]
    fn test_get_default_log_dir() -> Result<()> {
        let temp_dir = tempdir()?;
        temp_env::with_var("XDG_DATA_HOME", Some(temp_dir.path()), || -> Result<()> {
            let log_dir = get_default_log_dir()?;
            if cfg!(target_os = "linux") {
                assert_eq!(log_dir, temp_dir.path().join("frappe-porter").join("logs"));
            } else {
                assert!(log_dir.ends_with("frappe-porter/logs"));
            }
            Ok(())
        })
    }

    #[test]
    fn test_builder_requires_fields() {
        assert!(
            LoggerBuilder::default().with_verbosity(1).build().is_err(),
            "log_dir and max_logs have no defaults"
        );
    }
}
