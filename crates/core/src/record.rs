use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;

use super::category::Category;
use super::money::Money;

/// Matching engine certainty in `[0, 1]`.
///
/// Payload values outside the range are clamped on deserialization.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(from = "f64", into = "f64")]
pub struct Confidence(f64);

impl From<f64> for Confidence {
    fn from(value: f64) -> Self {
        Confidence::new(value)
    }
}

impl From<Confidence> for f64 {
    fn from(confidence: Confidence) -> Self {
        confidence.0
    }
}

impl Confidence {
    pub fn new(value: f64) -> Self {
        Confidence(value.clamp(0.0, 1.0))
    }

    pub fn value(self) -> f64 {
        self.0
    }

    /// Whole-number percentage, e.g. `0.956` → `96`.
    pub fn percent(self) -> i64 {
        (self.0 * 100.0).round() as i64
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.percent())
    }
}

/// An invoice date exactly as the matching engine rendered it.
///
/// The text is what gets exported; `parse` recovers a calendar date when the
/// text is in one of the common layouts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvoiceDate(String);

impl InvoiceDate {
    pub fn new(text: impl Into<String>) -> Self {
        InvoiceDate(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn parse(&self) -> Option<NaiveDate> {
        let s = self.0.trim();
        // Timestamps such as "2024-01-15 00:00:00" carry the date up front.
        let s = s.split_whitespace().next().unwrap_or(s);
        [
            "%Y-%m-%d", "%d-%m-%Y", "%d/%m/%Y", "%Y/%m/%d", "%m/%d/%Y", "%d-%b-%Y",
        ]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
    }
}

impl fmt::Display for InvoiceDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One invoice's reconciliation outcome. Everything except the identifiers
/// may be missing, since one-sided records lack the other dataset's data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationRecord {
    #[serde(rename = "Invoice_No", default)]
    pub invoice_no: String,
    #[serde(rename = "GSTIN", default)]
    pub gstin: String,
    #[serde(rename = "GST_Amount", default, skip_serializing_if = "Option::is_none")]
    pub gst_amount: Option<Money>,
    #[serde(rename = "APAR_Amount", default, skip_serializing_if = "Option::is_none")]
    pub apar_amount: Option<Money>,
    #[serde(rename = "GST_Date", default, skip_serializing_if = "Option::is_none")]
    pub gst_date: Option<InvoiceDate>,
    #[serde(rename = "APAR_Date", default, skip_serializing_if = "Option::is_none")]
    pub apar_date: Option<InvoiceDate>,
    /// Positive when the GST amount exceeds the ledger amount.
    #[serde(rename = "Difference", default, skip_serializing_if = "Option::is_none")]
    pub difference: Option<Money>,
    #[serde(
        rename = "Difference_Percentage",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub difference_percentage: Option<Decimal>,
    #[serde(rename = "Date_Mismatch", default)]
    pub date_mismatch: bool,
    #[serde(
        rename = "Date_Difference_Days",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub date_difference_days: Option<u32>,
    #[serde(rename = "Confidence", default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<Confidence>,
    #[serde(rename = "Reason", default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(rename = "Match_Type", default, skip_serializing_if = "Option::is_none")]
    pub match_type: Option<String>,
}

/// One dataset's view of an invoice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Side<'a> {
    pub amount: Option<Money>,
    pub date: Option<&'a InvoiceDate>,
}

/// Which sides of the pairing exist, decided by the record's category.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sides<'a> {
    Paired { gst: Side<'a>, apar: Side<'a> },
    /// Filed in GST, absent from the ledger.
    GstOnly(Side<'a>),
    /// Booked in the ledger, never filed in GST.
    AparOnly(Side<'a>),
}

/// A record tagged with the bucket it was delivered in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CategorizedRecord<'a> {
    pub category: Category,
    pub record: &'a ReconciliationRecord,
}

impl<'a> CategorizedRecord<'a> {
    pub fn new(category: Category, record: &'a ReconciliationRecord) -> Self {
        Self { category, record }
    }

    /// Export `Status` label.
    pub fn status(&self) -> &'static str {
        self.category.status_label()
    }

    pub fn sides(&self) -> Sides<'a> {
        let r = self.record;
        let gst = Side {
            amount: r.gst_amount,
            date: r.gst_date.as_ref(),
        };
        let apar = Side {
            amount: r.apar_amount,
            date: r.apar_date.as_ref(),
        };
        match self.category {
            Category::MissingApar => Sides::GstOnly(gst),
            Category::MissingGst => Sides::AparOnly(apar),
            Category::Matched | Category::Partial | Category::Mismatched => {
                Sides::Paired { gst, apar }
            }
        }
    }
}

impl Deref for CategorizedRecord<'_> {
    type Target = ReconciliationRecord;

    fn deref(&self) -> &ReconciliationRecord {
        self.record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PARTIAL_JSON: &str = r#"{
        "Invoice_No": "INV-1001",
        "GSTIN": "27AAPFU0939F1ZV",
        "GST_Amount": 10000.0,
        "APAR_Amount": 9850.0,
        "GST_Date": "2024-01-15",
        "APAR_Date": "2024-01-18",
        "Difference": 150.0,
        "Difference_Percentage": 1.5,
        "Match_Type": "Partial Match",
        "Confidence": 0.98,
        "Reason": "Amount within ±2% threshold",
        "Date_Mismatch": true,
        "Date_Difference_Days": 3
    }"#;

    #[test]
    fn deserializes_full_pair() {
        let r: ReconciliationRecord = serde_json::from_str(PARTIAL_JSON).unwrap();
        assert_eq!(r.invoice_no, "INV-1001");
        assert_eq!(r.difference, Some(Money::from_cents(15000)));
        assert_eq!(r.confidence.map(Confidence::percent), Some(98));
        assert!(r.date_mismatch);
        assert_eq!(r.date_difference_days, Some(3));
    }

    #[test]
    fn out_of_range_confidence_is_clamped() {
        let r: ReconciliationRecord =
            serde_json::from_str(r#"{"Invoice_No": "A", "Confidence": 1.5}"#).unwrap();
        let c = r.confidence.unwrap();
        assert_eq!(c.value(), 1.0);
        assert_eq!(c.to_string(), "100%");

        let r: ReconciliationRecord =
            serde_json::from_str(r#"{"Invoice_No": "B", "Confidence": -0.2}"#).unwrap();
        assert_eq!(r.confidence.map(Confidence::value), Some(0.0));
        assert_eq!(serde_json::to_string(&Confidence::new(0.5)).unwrap(), "0.5");
    }

    #[test]
    fn missing_fields_are_absent_not_errors() {
        let r: ReconciliationRecord =
            serde_json::from_str(r#"{"Invoice_No": "INV-7", "APAR_Amount": 500}"#).unwrap();
        assert_eq!(r.gstin, "");
        assert!(r.gst_amount.is_none());
        assert!(r.confidence.is_none());
        assert!(!r.date_mismatch);
        assert!(r.reason.is_none());
    }

    #[test]
    fn null_fields_are_absent() {
        let r: ReconciliationRecord =
            serde_json::from_str(r#"{"Invoice_No": "INV-8", "Confidence": null, "Reason": null}"#)
                .unwrap();
        assert!(r.confidence.is_none());
        assert!(r.reason.is_none());
    }

    #[test]
    fn sides_follow_category_not_fields() {
        let r: ReconciliationRecord = serde_json::from_str(PARTIAL_JSON).unwrap();

        let paired = CategorizedRecord::new(Category::Partial, &r);
        assert!(matches!(paired.sides(), Sides::Paired { .. }));

        // Even with both amounts populated, a missing-side tag yields one side.
        match CategorizedRecord::new(Category::MissingApar, &r).sides() {
            Sides::GstOnly(side) => assert_eq!(side.amount, r.gst_amount),
            other => panic!("unexpected sides: {other:?}"),
        }
        match CategorizedRecord::new(Category::MissingGst, &r).sides() {
            Sides::AparOnly(side) => assert_eq!(side.date.map(InvoiceDate::as_str), Some("2024-01-18")),
            other => panic!("unexpected sides: {other:?}"),
        }
    }

    #[test]
    fn tagging_leaves_record_untouched() {
        let r: ReconciliationRecord = serde_json::from_str(PARTIAL_JSON).unwrap();
        let before = r.clone();
        let tagged = CategorizedRecord::new(Category::Mismatched, &r);
        assert_eq!(tagged.status(), "Mismatched");
        assert_eq!(tagged.invoice_no, "INV-1001");
        assert_eq!(r, before);
    }

    #[test]
    fn confidence_percent_and_display() {
        assert_eq!(Confidence::new(0.956).percent(), 96);
        assert_eq!(Confidence::new(1.0).to_string(), "100%");
        assert_eq!(Confidence::new(1.7).value(), 1.0);
    }

    #[test]
    fn invoice_date_parse_layouts() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 15);
        assert_eq!(InvoiceDate::new("2024-01-15").parse(), expected);
        assert_eq!(InvoiceDate::new("15-01-2024").parse(), expected);
        assert_eq!(InvoiceDate::new("15/01/2024").parse(), expected);
        assert_eq!(InvoiceDate::new("2024-01-15 00:00:00").parse(), expected);
        assert_eq!(InvoiceDate::new("not a date").parse(), None);
        assert_eq!(InvoiceDate::new("nan").to_string(), "nan");
    }
}
