//! Writing records into the app package layout.
//!
//! A record is materialized into
//!
//! ```text
//! <base>/<module>/<category>/<folder_identifier>/
//!     __init__.py
//!     <folder_identifier>.json
//!     <folder_identifier>.py     (script reports only)
//! ```
//!
//! with marker files in every package directory. JSON definitions are always fully replaced,
//! never merged. Within one materializer, a definition written for one record is never
//! overwritten by a record with a different name that resolves to the same file.

use crate::config::PorterConfig;
use crate::errors::RecordError;
use crate::record::{Category, Record, RecordKind};
use crate::resolve::ResolvedLocation;
use crate::stub::{StubHeader, StubRenderer};
use crate::utils::file_fs;
use color_eyre::Result;
use color_eyre::eyre::{WrapErr, eyre};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, trace};

/// How existing and missing definitions are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum MaterializeMode {
    /// Create directories, markers, the definition and the script stub as needed.
    #[default]
    Create,
    /// Only rewrite definitions that already exist. Nothing else is created.
    UpdateOnly,
}

/// Whether the JSON definition existed before it was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WriteStatus {
    Created,
    Updated,
}

/// Outcome of a successfully materialized record.
#[derive(Debug, Clone)]
pub(crate) struct MaterializeResult {
    pub(crate) name: String,
    pub(crate) category: Category,
    pub(crate) kind: RecordKind,
    /// Module folder the record was written to.
    pub(crate) module: String,
    pub(crate) directory: PathBuf,
    pub(crate) json_path: PathBuf,
    pub(crate) stub_written: bool,
    pub(crate) status: WriteStatus,
}

pub(crate) struct Materializer {
    config: Arc<PorterConfig>,
    stubs: StubRenderer,
    /// Definition path -> name of the record that wrote it
    claimed: Mutex<HashMap<PathBuf, String>>,
}

impl Materializer {
    pub(crate) fn new(config: Arc<PorterConfig>) -> Result<Self> {
        let stubs = StubRenderer::new(StubHeader {
            copyright: config.stub_copyright.clone(),
            license: config.stub_license.clone(),
        })?;

        Ok(Self {
            config,
            stubs,
            claimed: Mutex::new(HashMap::new()),
        })
    }

    /// Location `record` resolves to according to its declared module.
    fn locate(&self, record: &Record, category: Category) -> Result<ResolvedLocation> {
        ResolvedLocation::new(record, category, &self.config)
    }

    /// Location the definition of `record` is written to in `mode`.
    ///
    /// In update-only mode this is the existing definition, which may live under a search module
    /// instead of the declared one.
    async fn target(
        &self,
        record: &Record,
        category: Category,
        mode: MaterializeMode,
    ) -> Result<ResolvedLocation, RecordError> {
        let location = self
            .locate(record, category)
            .map_err(|e| RecordError::write_failure(record.name(), e))?;

        match mode {
            MaterializeMode::Create => Ok(location),
            MaterializeMode::UpdateOnly => self
                .find_existing(&location)
                .await
                .map_err(|e| RecordError::write_failure(record.name(), e))?
                .ok_or_else(|| RecordError::not_found(record.name(), &location.json_path())),
        }
    }

    /// Fails if another record already wrote the definition at `json_path`.
    async fn check_claim(&self, name: &str, json_path: &Path) -> Result<(), RecordError> {
        match self.claimed.lock().await.get(json_path) {
            Some(owner) if owner != name => Err(RecordError::write_failure(
                name,
                eyre!(
                    "{} resolves to {} which was already written for '{}'",
                    name,
                    json_path.display(),
                    owner
                ),
            )),
            _ => Ok(()),
        }
    }

    /// Writes `record` to its location in the package layout.
    ///
    /// # Errors
    ///
    /// - [`RecordError::NotFound`] in update-only mode if no definition exists for the record
    /// - [`RecordError::WriteFailure`] if the location is invalid, the definition was already
    ///   written for a record with another name, or serializing, rendering or any file operation
    ///   fails
    pub(crate) async fn materialize(
        &self,
        mut record: Record,
        category: Category,
        mode: MaterializeMode,
    ) -> Result<MaterializeResult, RecordError> {
        let location = self.target(&record, category, mode).await?;
        self.check_claim(record.name(), &location.json_path()).await?;
        record.apply_standard_fields();

        let result = match mode {
            MaterializeMode::Create => self.create(&record, category, &location).await,
            MaterializeMode::UpdateOnly => self.update(&record, category, &location).await,
        }
        .map_err(|e| RecordError::write_failure(record.name(), e))?;

        self.claimed
            .lock()
            .await
            .insert(result.json_path.clone(), result.name.clone());

        Ok(result)
    }

    async fn create(
        &self,
        record: &Record,
        category: Category,
        location: &ResolvedLocation,
    ) -> Result<MaterializeResult> {
        let directory = location.directory();
        file_fs::ensure_dir_exists(&directory).await?;

        for dir in location.package_dirs() {
            let marker = dir.join(&self.config.marker_file);
            if file_fs::create_empty_file(&marker).await? {
                trace!("Created marker {}", marker.display());
            }
        }

        let json_path = location.json_path();
        let status = if file_fs::check_file_exists(&json_path).await? {
            WriteStatus::Updated
        } else {
            WriteStatus::Created
        };
        self.write_definition(record, &json_path).await?;

        let stub_written = if record.kind().is_script() {
            let stub_path = location.stub_path(&self.config.script_extension);
            let stub = self.stubs.render(record.name(), record.script_body())?;
            file_fs::write_file_atomic(&stub_path, stub.into_bytes()).await?;
            debug!("Wrote script stub {}", stub_path.display());
            true
        } else {
            false
        };

        Ok(MaterializeResult {
            name: record.name().to_string(),
            category,
            kind: record.kind(),
            module: location.module().to_string(),
            directory,
            json_path,
            stub_written,
            status,
        })
    }

    async fn update(
        &self,
        record: &Record,
        category: Category,
        location: &ResolvedLocation,
    ) -> Result<MaterializeResult> {
        let json_path = location.json_path();
        self.write_definition(record, &json_path).await?;

        Ok(MaterializeResult {
            name: record.name().to_string(),
            category,
            kind: record.kind(),
            module: location.module().to_string(),
            directory: location.directory(),
            json_path,
            stub_written: false,
            status: WriteStatus::Updated,
        })
    }

    /// Finds the existing definition for an update: first under the declared module, then under
    /// each configured search module.
    async fn find_existing(&self, location: &ResolvedLocation) -> Result<Option<ResolvedLocation>> {
        if file_fs::check_file_exists(location.json_path()).await? {
            return Ok(Some(location.clone()));
        }

        for module in self.config.update_search_modules.iter() {
            let candidate = location.in_module(module)?;
            if candidate.module() == location.module() {
                continue;
            }
            if file_fs::check_file_exists(candidate.json_path()).await? {
                debug!(
                    "{} not found under '{}', using '{}'",
                    location.folder_identifier(),
                    location.module(),
                    candidate.module()
                );
                return Ok(Some(candidate));
            }
        }

        Ok(None)
    }

    async fn write_definition(&self, record: &Record, json_path: &Path) -> Result<()> {
        let json = record
            .to_json()
            .wrap_err_with(|| format!("Failed to serialize {}", record.name()))?;
        file_fs::write_file_atomic(json_path, json).await?;
        debug!("Wrote {}", json_path.display());

        Ok(())
    }
}

// -------------------------------------------------------------------------------------------------
// Tests
// -------------------------------------------------------------------------------------------------
