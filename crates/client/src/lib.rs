pub mod backend;
pub mod types;
pub mod validate;
pub mod workflow;

pub use backend::{BackendError, HttpBackend, MockBackend, ReconBackend, DEFAULT_BASE_URL};
pub use types::{
    Dataset, DuplicateGroup, DuplicateReport, InputFile, MissingPreview, MissingSet, PreviewRecord,
    UploadSummary,
};
pub use validate::{validate_csv_name, ValidationError};
pub use workflow::{Step, Ticket, Workflow, WorkflowError};
