//! File system operations module.
//!
//! Helpers for expanding configured paths, creating package directories and marker files, and
//! replacing files atomically so an interrupted write never leaves a half-written definition
//! behind.

use color_eyre::Result;
use color_eyre::eyre::{WrapErr, eyre};
use std::collections::HashMap;
use std::ffi::{OsStr, OsString};
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Expands a path, resolving environment variables and tilde expressions.
///
/// # Arguments
///
/// * `path` - Any type that can be converted to a Path
/// * `env` - Optional HashMap containing environment variable pairs to prepend to the default
///           environment
///
/// # Errors
///
/// Returns an error if environment variables cannot be expanded.
pub(crate) fn expand_path<P: AsRef<Path>, S: AsRef<OsStr>>(
    path: P,
    env: Option<&HashMap<String, S>>,
) -> Result<PathBuf> {
    let home_dir = || -> Option<PathBuf> { dirs::home_dir() };

    // Check custom environment variables first, then the process environment
    let context = |var: &str| -> Result<Option<OsString>> {
        if let Some(custom_env) = env {
            if let Some(value) = custom_env.get(var) {
                return Ok(Some(value.as_ref().into()));
            }
        }
        Ok(std::env::var_os(var))
    };

    let expanded = shellexpand::path::full_with_context(&path, home_dir, context)
        .map_err(|e| eyre!("Failed to expand path: {:?}", e))?;

    Ok(PathBuf::from(expanded))
}

/// Checks if a file exists.
///
/// # Errors
///
/// Returns an error if the existence cannot be determined, e.g. due to missing permissions on a
/// parent directory.
pub(crate) async fn check_file_exists<P: AsRef<Path>>(path: P) -> Result<bool> {
    fs::try_exists(path.as_ref())
        .await
        .wrap_err_with(|| format!("Failed to check existence of {:?}", path.as_ref()))
}

/// Ensures that a directory and all its parents exist. Existing directories are fine.
///
/// # Errors
///
/// Returns an error if a directory cannot be created.
pub(crate) async fn ensure_dir_exists<P: AsRef<Path>>(path: P) -> Result<()> {
    fs::create_dir_all(&path)
        .await
        .wrap_err_with(|| format!("Failed to create {:?}", path.as_ref()))
}

/// Creates an empty file at `path` unless a file already exists there.
///
/// Returns `true` if the file was created. Existing files are never touched.
///
/// # Errors
///
/// Returns an error if the file does not exist and cannot be created.
pub(crate) async fn create_empty_file<P: AsRef<Path>>(path: P) -> Result<bool> {
    match fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)
        .await
    {
        Ok(_) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Ok(false),
        Err(e) => Err(e).wrap_err_with(|| format!("Failed to create {:?}", path.as_ref())),
    }
}

/// Replaces the content of `path` with `contents`.
///
/// The data is written to a temporary file next to the target which is then renamed over it. If
/// anything fails, the temporary file is removed and the target keeps its previous content.
///
/// # Errors
///
/// Returns an error if the parent directory does not exist, or writing or renaming fails.
pub(crate) async fn write_file_atomic<P: AsRef<Path>>(path: P, contents: Vec<u8>) -> Result<()> {
    let target = path.as_ref().to_path_buf();
    let parent = target
        .parent()
        .ok_or_else(|| eyre!("Could not get parent of {}", target.display()))?
        .to_path_buf();

    tokio::task::spawn_blocking(move || -> Result<()> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(".porter-").suffix(".tmp");
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            builder.permissions(std::fs::Permissions::from_mode(0o644));
        }

        let mut temp_file = builder
            .tempfile_in(&parent)
            .wrap_err_with(|| format!("Failed to create temporary file in {}", parent.display()))?;
        temp_file
            .write_all(&contents)
            .and_then(|_| temp_file.flush())
            .wrap_err_with(|| format!("Failed to write {}", target.display()))?;
        temp_file
            .persist(&target)
            .map_err(|e| e.error)
            .wrap_err_with(|| format!("Failed to replace {}", target.display()))?;

        Ok(())
    })
    .await
    .wrap_err("File writer task failed")?
}

// -------------------------------------------------------------------------------------------------
// Tests
// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_path() -> Result<()> {
        // Test with tilde expansion
        temp_env::with_var("HOME", Some("/home/porter"), || -> Result<()> {
            assert_eq!(
                expand_path::<&str, &str>("~/test.txt", None)?,
                PathBuf::from("/home/porter/test.txt")
            );
            Ok(())
        })?;

        // Test with environment variable
        let mut env = HashMap::new();
        env.insert("TEST_DIR".to_string(), "/tmp/test".to_string());
        assert_eq!(
            expand_path("$TEST_DIR/file.txt", Some(&env))?,
            PathBuf::from("/tmp/test/file.txt")
        );

        // Relative paths are left alone
        assert_eq!(
            expand_path::<&str, &str>("surgishop_reports", None)?,
            PathBuf::from("surgishop_reports")
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_check_file_exists() -> Result<()> {
        let temp_file = tempfile::NamedTempFile::new()?;
        assert!(check_file_exists(temp_file.path()).await?);

        let temp_dir = tempfile::tempdir()?;
        assert!(!check_file_exists(temp_dir.path().join("doesnotexist.txt")).await?);
        Ok(())
    }

    #[tokio::test]
    async fn test_ensure_dir_exists() -> Result<()> {
        let temp_dir = tempfile::tempdir()?;
        let nested = temp_dir.path().join("stock").join("report").join("stock_status");

        ensure_dir_exists(&nested).await?;
        assert!(nested.is_dir());

        // Calling it again must not fail
        ensure_dir_exists(&nested).await?;
        assert!(nested.is_dir());
        Ok(())
    }

    #[tokio::test]
    async fn test_create_empty_file_keeps_existing() -> Result<()> {
        let temp_dir = tempfile::tempdir()?;
        let marker = temp_dir.path().join("__init__.py");

        assert!(create_empty_file(&marker).await?, "first call creates");
        assert_eq!(fs::read(&marker).await?, b"");

        fs::write(&marker, "app_version = '1'").await?;
        assert!(!create_empty_file(&marker).await?, "second call is a no-op");
        assert_eq!(
            fs::read_to_string(&marker).await?,
            "app_version = '1'",
            "existing content must be preserved"
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_write_file_atomic() -> Result<()> {
        let temp_dir = tempfile::tempdir()?;
        let target = temp_dir.path().join("report.json");

        write_file_atomic(&target, b"{\n \"a\": 1\n}".to_vec()).await?;
        assert_eq!(fs::read_to_string(&target).await?, "{\n \"a\": 1\n}");

        // Shorter content fully replaces longer content
        write_file_atomic(&target, b"{}".to_vec()).await?;
        assert_eq!(fs::read_to_string(&target).await?, "{}");

        // No temporary files are left behind
        let entries = std::fs::read_dir(temp_dir.path())?.count();
        assert_eq!(entries, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_write_file_atomic_missing_parent() -> Result<()> {
        let temp_dir = tempfile::tempdir()?;
        let target = temp_dir.path().join("missing").join("report.json");

        assert!(write_file_atomic(&target, b"{}".to_vec()).await.is_err());
        assert!(!target.exists());
        Ok(())
    }
}
