pub mod category;
pub mod money;
pub mod record;
pub mod result;

pub use category::{Category, CategoryError};
pub use money::Money;
pub use record::{CategorizedRecord, Confidence, InvoiceDate, ReconciliationRecord, Side, Sides};
pub use result::{DateDiscrepancy, Details, ReconciliationResult, Summary, SummaryDrift};
