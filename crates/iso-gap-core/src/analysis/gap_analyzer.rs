use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, instrument, warn};

use super::{reconcile, GapResult};
use crate::catalog::{CatalogRepository, ImplementationRecord};

/// Reconciles implementation records against the catalog held by a repository.
pub struct GapAnalyzer<R: CatalogRepository> {
    catalog_repo: Arc<R>,
}

impl<R: CatalogRepository> GapAnalyzer<R> {
    pub fn new(catalog_repo: Arc<R>) -> Self {
        Self { catalog_repo }
    }

    #[instrument(name = "analyze_gaps", skip(self, record), fields(record_len = record.len()))]
    pub fn analyze(&self, record: &ImplementationRecord) -> Result<GapResult> {
        let catalog = self.catalog_repo.load_catalog()?;
        let result = reconcile(&catalog, record);

        for id in &result.unknown {
            warn!(control_id = %id, "implementation record references unknown control");
        }
        debug!(
            total = result.counts.total,
            implemented = result.counts.implemented,
            gaps = result.counts.gaps,
            unknown = result.unknown.len(),
            "gap analysis completed"
        );
        Ok(result)
    }
}
