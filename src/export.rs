//! Locating and reading export files produced by the browser export script.

use crate::config::PorterConfig;
use crate::errors::InputError;
use crate::record::Category;
use serde_json::Value;
use std::path::PathBuf;
use tokio::fs;
use tracing::debug;

/// Paths probed for the export file of `category`, in order.
///
/// An explicitly requested file is the only candidate. Otherwise the configured file name is
/// looked up as given and inside the base path.
pub(crate) fn export_candidates(
    config: &PorterConfig,
    category: Category,
    explicit: Option<PathBuf>,
) -> Vec<PathBuf> {
    if let Some(path) = explicit {
        return vec![path];
    }

    let configured = config.export_file(category).to_path_buf();
    let mut candidates = vec![configured.clone()];
    let in_base = config.base_path.join(&configured);
    if in_base != configured {
        candidates.push(in_base);
    }
    candidates
}

/// Reads the first existing candidate and returns its path together with the exported records.
///
/// # Errors
///
/// - [`InputError::Missing`] if no candidate exists
/// - [`InputError::Unreadable`] if the file cannot be read
/// - [`InputError::Placeholder`] if the file is blank or only holds `placeholder`
/// - [`InputError::Unparsable`] if the content is not a JSON array
pub(crate) async fn load_export(
    candidates: &[PathBuf],
    placeholder: &str,
) -> Result<(PathBuf, Vec<Value>), InputError> {
    let mut found = None;
    for candidate in candidates {
        debug!("Looking for export file at {}", candidate.display());
        if fs::try_exists(candidate).await.unwrap_or(false) {
            found = Some(candidate.clone());
            break;
        }
    }
    let Some(path) = found else {
        return Err(InputError::Missing {
            probed: candidates.to_vec(),
        });
    };

    let content = match fs::read_to_string(&path).await {
        Ok(content) => content,
        Err(source) => return Err(InputError::Unreadable { path, source }),
    };
    let content = content.trim();
    if content.is_empty() || content == placeholder {
        return Err(InputError::Placeholder { path });
    }

    match serde_json::from_str::<Value>(content) {
        Ok(Value::Array(records)) => Ok((path, records)),
        Ok(_) => Err(InputError::Unparsable {
            path,
            reason: "expected a JSON array of records".to_string(),
        }),
        Err(e) => Err(InputError::Unparsable {
            path,
            reason: e.to_string(),
        }),
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
    use tempfile::TempDir;

    const PLACEHOLDER: &str = "[JSON_CONTENT_HERE]";

    async fn load_content(content: &str) -> Result<Result<(PathBuf, Vec<Value>), InputError>> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("export.json");
        fs::write(&path, content).await?;
        Ok(load_export(&[path], PLACEHOLDER).await)
    }

    #[test]
    fn test_candidates() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let config = test_config(temp_dir.path())?;

        assert_eq!(
            export_candidates(&config, Category::Report, None),
            vec![
                PathBuf::from("surgishop_reports_export.json"),
                config.base_path.join("surgishop_reports_export.json"),
            ]
        );
        assert_eq!(
            export_candidates(&config, Category::PrintFormat, None)[0],
            PathBuf::from("surgishop_print_formats_export.json")
        );
        assert_eq!(
            export_candidates(&config, Category::Report, Some(PathBuf::from("/data/x.json"))),
            vec![PathBuf::from("/data/x.json")],
            "an explicit export file is the only candidate"
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_load_valid_export() -> Result<()> {
        let (_, records) = load_content(
            r#"[{"name": "Stock Status", "module": "Stock"}, {"name": "Items on Hold"}]"#,
        )
        .await??;
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["name"], "Stock Status");
        Ok(())
    }

    #[tokio::test]
    async fn test_load_empty_array() -> Result<()> {
        let (_, records) = load_content("  []\n").await??;
        assert!(records.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_placeholder_and_blank() -> Result<()> {
        for content in ["[JSON_CONTENT_HERE]", "\n[JSON_CONTENT_HERE]\n", "", "   \n"] {
            let result = load_content(content).await?;
            assert!(
                matches!(result, Err(InputError::Placeholder { .. })),
                "{:?} should be treated as not yet populated",
                content
            );
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_unparsable() -> Result<()> {
        for content in ["{\"name\": \"Stock Status\"}", "[{\"name\": ", "not json"] {
            let result = load_content(content).await?;
            assert!(
                matches!(result, Err(InputError::Unparsable { .. })),
                "{:?} should be unparsable",
                content
            );
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_missing() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let candidates = vec![
            temp_dir.path().join("a.json"),
            temp_dir.path().join("out").join("a.json"),
        ];

        match load_export(&candidates, PLACEHOLDER).await {
            Err(InputError::Missing { probed }) => assert_eq!(probed, candidates),
            other => panic!("expected Missing, got {:?}", other),
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_later_candidate_is_used() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let second = temp_dir.path().join("out").join("a.json");
        fs::create_dir_all(second.parent().unwrap()).await?;
        fs::write(&second, "[]").await?;

        let (path, _) =
            load_export(&[temp_dir.path().join("a.json"), second.clone()], PLACEHOLDER).await?;
        assert_eq!(path, second);
        Ok(())
    }
}
