use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use serde_json::Value;
use tracing::debug;

use super::{
    format::read_document, CatalogRepository, Control, ControlCatalog, ImplementationRecord,
};

/// Loads a control catalog from a JSON, JSON5 or YAML file.
///
/// The file holds a list of `{ "id": ..., "title": ... }` objects. The parsed
/// catalog is cached for the lifetime of the repository.
pub struct FileCatalogRepository {
    path: PathBuf,
    cache: OnceCell<ControlCatalog>,
}

impl FileCatalogRepository {
    /// Create a repository reading the catalog at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache: OnceCell::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_catalog(&self) -> Result<ControlCatalog> {
        let controls: Vec<Control> = read_document(&self.path, "control catalog")?;
        let catalog = ControlCatalog::new(controls)
            .with_context(|| format!("invalid control catalog at {}", self.path.display()))?;
        debug!(path = %self.path.display(), controls = catalog.len(), "loaded control catalog");
        Ok(catalog)
    }
}

impl CatalogRepository for FileCatalogRepository {
    fn load_catalog(&self) -> Result<ControlCatalog> {
        let catalog = self.cache.get_or_try_init(|| self.read_catalog())?;
        Ok(catalog.clone())
    }

    fn get_control(&self, id: &str) -> Result<Option<Control>> {
        let catalog = self.cache.get_or_try_init(|| self.read_catalog())?;
        Ok(catalog.get(id).cloned())
    }
}

/// Load implementation statuses from a mapping of control id to boolean.
pub fn load_implementation(path: &Path) -> Result<ImplementationRecord> {
    let document: Value = read_document(path, "implementation")?;
    let record = ImplementationRecord::from_value(document)
        .with_context(|| format!("invalid implementation data at {}", path.display()))?;
    debug!(path = %path.display(), entries = record.len(), "loaded implementation record");
    Ok(record)
}
