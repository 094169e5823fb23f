use gstrecon_core::Money;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which of the two input datasets a file belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dataset {
    Gst,
    Apar,
}

impl Dataset {
    /// Path segment of the upload endpoint.
    pub fn endpoint(self) -> &'static str {
        match self {
            Dataset::Gst => "gst",
            Dataset::Apar => "apar",
        }
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dataset::Gst => f.write_str("GST"),
            Dataset::Apar => f.write_str("AP/AR"),
        }
    }
}

/// A file picked for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl InputFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateGroup {
    pub invoice_no: String,
    pub gstin: String,
    pub occurrences: usize,
    /// Zero-based row numbers in the uploaded file.
    #[serde(default)]
    pub rows: Vec<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DuplicateReport {
    #[serde(default)]
    pub has_duplicates: bool,
    #[serde(default)]
    pub duplicate_count: usize,
    #[serde(default)]
    pub duplicates: Vec<DuplicateGroup>,
}

/// Server acknowledgement of one uploaded dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadSummary {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: String,
    pub records: usize,
    #[serde(default)]
    pub fields: Vec<String>,
    #[serde(default = "Money::zero")]
    pub total_invoice_value: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duplicates: Option<DuplicateReport>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl UploadSummary {
    pub fn has_duplicates(&self) -> bool {
        self.duplicates.as_ref().is_some_and(|d| d.has_duplicates)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewRecord {
    pub invoice_no: String,
    pub gstin: String,
    #[serde(default)]
    pub invoice_value: Option<Money>,
    #[serde(default)]
    pub invoice_date: String,
}

/// One side of the missing-records preview. `records` holds at most ten samples.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MissingSet {
    #[serde(default)]
    pub count: usize,
    #[serde(default = "Money::zero")]
    pub total_value: Money,
    #[serde(default)]
    pub records: Vec<PreviewRecord>,
}

/// Quick key-level comparison run before full reconciliation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MissingPreview {
    #[serde(default)]
    pub common_records: usize,
    #[serde(default)]
    pub total_gst_records: Option<usize>,
    #[serde(default)]
    pub total_apar_records: Option<usize>,
    #[serde(default)]
    pub missing_in_apar: MissingSet,
    #[serde(default)]
    pub missing_in_gst: MissingSet,
}
