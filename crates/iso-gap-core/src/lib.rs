//! Reconciles an ISO 27001 control catalog against an organization's
//! implementation record and renders the resulting gap report.

pub mod analysis;
pub mod catalog;
pub mod report;
pub mod settings;

pub use analysis::{gap_analyzer::GapAnalyzer, reconcile, GapCounts, GapResult, Warning};
pub use catalog::{
    file_repository::{load_implementation, FileCatalogRepository},
    CatalogRepository, ConfigError, Control, ControlCatalog, ImplementationRecord, InputError,
};
pub use report::{render_report, write_reports, OutputFormat};
pub use settings::GapSettings;
