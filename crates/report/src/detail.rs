use gstrecon_core::{Category, CategorizedRecord, Money};
use std::fmt;

use crate::export::{ExportArtifact, ExportError};
use crate::util::file_stem;

/// Amounts closer than this are the same amount.
const AMOUNT_TOLERANCE_CENTS: i64 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Issue {
    AmountMismatch { difference: Money },
    DateDiscrepancy { days: u32 },
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Issue::AmountMismatch { difference } => {
                write!(f, "Amount mismatch: {difference} difference")
            }
            Issue::DateDiscrepancy { days } => write!(f, "Date discrepancy: {days} days apart"),
        }
    }
}

/// Differences between the two sides of a paired record. One-sided records
/// have nothing to compare.
pub fn detect_issues(record: &CategorizedRecord<'_>) -> Vec<Issue> {
    if record.category.is_missing_side() {
        return Vec::new();
    }
    let mut issues = Vec::new();
    if let (Some(gst), Some(apar)) = (record.gst_amount, record.apar_amount) {
        let gap = (gst - apar).abs();
        if gap > Money::from_cents(AMOUNT_TOLERANCE_CENTS) {
            issues.push(Issue::AmountMismatch {
                difference: record.difference.map(Money::abs).unwrap_or(gap),
            });
        }
    }
    if record.date_mismatch {
        issues.push(Issue::DateDiscrepancy {
            days: record.date_difference_days.unwrap_or(0),
        });
    }
    issues
}

pub fn suggested_actions(record: &CategorizedRecord<'_>) -> Vec<String> {
    let by_category: &[&str] = match record.category {
        Category::Mismatched => &[
            "Verify invoice amount in source documents",
            "Check for TDS deductions or adjustments",
            "Contact vendor/customer for clarification",
        ],
        Category::Partial => &[
            "Check if TDS was deducted (common cause of ±2% variance)",
            "Verify payment processing fees or bank charges",
        ],
        Category::MissingApar => &[
            "Add invoice to AP/AR ledger",
            "Verify if invoice was recorded under different number",
        ],
        Category::MissingGst => &[
            "File GST return for this invoice",
            "Check if invoice should be exempt from GST",
        ],
        Category::Matched => &[],
    };
    let mut actions: Vec<String> = by_category.iter().map(|s| s.to_string()).collect();
    if record.date_mismatch {
        actions.push(format!(
            "Investigate {}-day date discrepancy",
            record.date_difference_days.unwrap_or(0)
        ));
    }
    actions
}

/// Single-record CSV for the drill-down view.
pub fn export_record(record: &CategorizedRecord<'_>) -> Result<ExportArtifact, ExportError> {
    let mut wtr = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    wtr.write_record(["Invoice_No", "GSTIN", "GST_Amount", "APAR_Amount", "Difference", "Status"])?;

    let or_na = |m: Option<Money>| m.map(Money::to_plain_string).unwrap_or_else(|| "N/A".to_string());
    wtr.write_record([
        record.invoice_no.clone(),
        record.gstin.clone(),
        or_na(record.gst_amount),
        or_na(record.apar_amount),
        record.difference.unwrap_or_else(Money::zero).to_plain_string(),
        record.category.label().to_string(),
    ])?;
    let bytes = wtr.into_inner().map_err(|e| e.into_error())?;

    Ok(ExportArtifact {
        filename: format!("{}_details.csv", file_stem(&record.invoice_no)),
        content_type: crate::export::ExportFormat::Csv.content_type(),
        bytes,
    })
}
