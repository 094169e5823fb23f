use serde::{Deserialize, Serialize};

use super::category::Category;
use super::record::{InvoiceDate, ReconciliationRecord};

/// Per-category counts reported by the matching engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    #[serde(default)]
    pub matched: usize,
    #[serde(default)]
    pub partial_match: usize,
    #[serde(default)]
    pub mismatched: usize,
    #[serde(rename = "missingInGST", default)]
    pub missing_in_gst: usize,
    #[serde(rename = "missingInAPAR", default)]
    pub missing_in_apar: usize,
    /// Percentage of GST invoices matched exactly, 0–100.
    #[serde(default)]
    pub match_rate: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_invoices: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_discrepancies: Option<usize>,
}

impl Summary {
    pub fn count(&self, category: Category) -> usize {
        match category {
            Category::Matched => self.matched,
            Category::Partial => self.partial_match,
            Category::Mismatched => self.mismatched,
            Category::MissingGst => self.missing_in_gst,
            Category::MissingApar => self.missing_in_apar,
        }
    }

    pub fn total(&self) -> usize {
        Category::ALL.iter().map(|c| self.count(*c)).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateDiscrepancy {
    #[serde(rename = "Invoice_No", default)]
    pub invoice_no: String,
    #[serde(rename = "GSTIN", default)]
    pub gstin: String,
    #[serde(rename = "GST_Date", default, skip_serializing_if = "Option::is_none")]
    pub gst_date: Option<InvoiceDate>,
    #[serde(rename = "APAR_Date", default, skip_serializing_if = "Option::is_none")]
    pub apar_date: Option<InvoiceDate>,
    #[serde(rename = "Difference_Days", default)]
    pub difference_days: u32,
}

/// The five record buckets. A bucket the engine left out is empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Details {
    #[serde(default)]
    pub matched: Vec<ReconciliationRecord>,
    #[serde(default)]
    pub partial_match: Vec<ReconciliationRecord>,
    #[serde(default)]
    pub mismatched: Vec<ReconciliationRecord>,
    #[serde(rename = "missingInGST", default)]
    pub missing_in_gst: Vec<ReconciliationRecord>,
    #[serde(rename = "missingInAPAR", default)]
    pub missing_in_apar: Vec<ReconciliationRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub date_discrepancies: Vec<DateDiscrepancy>,
}

impl Details {
    pub fn bucket(&self, category: Category) -> &[ReconciliationRecord] {
        match category {
            Category::Matched => &self.matched,
            Category::Partial => &self.partial_match,
            Category::Mismatched => &self.mismatched,
            Category::MissingGst => &self.missing_in_gst,
            Category::MissingApar => &self.missing_in_apar,
        }
    }
}

/// A category whose reported count differs from the records actually delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummaryDrift {
    pub category: Category,
    pub reported: usize,
    pub delivered: usize,
}

/// The finished payload from the matching engine. Read-only once received.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationResult {
    #[serde(default)]
    pub summary: Summary,
    #[serde(default)]
    pub insights: Vec<String>,
    #[serde(default)]
    pub details: Details,
}

impl ReconciliationResult {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn bucket(&self, category: Category) -> &[ReconciliationRecord] {
        self.details.bucket(category)
    }

    /// Number of records delivered across all buckets.
    pub fn record_count(&self) -> usize {
        Category::ALL.iter().map(|c| self.bucket(*c).len()).sum()
    }

    /// Categories whose summary count disagrees with the bucket length. The
    /// engine caps some buckets, so a non-empty result is expected for large runs.
    pub fn summary_drift(&self) -> Vec<SummaryDrift> {
        Category::ALL
            .into_iter()
            .filter_map(|category| {
                let reported = self.summary.count(category);
                let delivered = self.bucket(category).len();
                (reported != delivered).then_some(SummaryDrift {
                    category,
                    reported,
                    delivered,
                })
            })
            .collect()
    }
}
