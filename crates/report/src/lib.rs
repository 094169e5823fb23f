pub mod aggregate;
pub mod detail;
pub mod export;
pub mod filter;
pub mod options;
pub mod view;

pub(crate) mod util;

pub use aggregate::{
    average_confidence, confidence_distribution, merge, ConfidenceBand, ConfidenceDistribution,
    DatasetTotals, Statistics,
};
pub use detail::{detect_issues, export_record, suggested_actions, Issue};
pub use export::{
    export, export_now, generate_timestamped_filename, ExportArtifact, ExportError, ExportFormat,
    REPORT_PREFIX,
};
pub use filter::{filter, paginate, total_pages, CategoryFilter, PAGE_SIZE};
pub use options::{ExportFlag, ExportOptions, ExportPreset, OptionsError};
pub use view::{ExportSession, ResultsView, ViewAction};
