//! Comma-separated report rows.
//!
//! Text columns are always quoted and numeric columns never are, so the
//! column types survive spreadsheet import. Currency is ungrouped.

use gstrecon_core::{CategorizedRecord, InvoiceDate, Money};

use crate::options::ExportOptions;

pub fn header(options: &ExportOptions) -> Vec<&'static str> {
    let mut cols = vec!["Invoice_No", "GSTIN", "Status", "GST_Amount", "APAR_Amount", "Difference"];
    if options.include_confidence {
        cols.push("Confidence");
    }
    if options.include_reasons {
        cols.push("Reason");
    }
    cols.extend(["GST_Date", "APAR_Date", "Date_Mismatch", "Date_Difference_Days"]);
    cols
}

pub fn render(records: &[CategorizedRecord<'_>], options: &ExportOptions) -> String {
    let mut lines = Vec::with_capacity(records.len() + 1);
    lines.push(header(options).join(","));
    lines.extend(records.iter().map(|r| row(r, options).join(",")));
    lines.join("\n")
}

fn row(record: &CategorizedRecord<'_>, options: &ExportOptions) -> Vec<String> {
    let mut fields = vec![
        quoted(&record.invoice_no),
        quoted(&record.gstin),
        quoted(record.status()),
        amount(record.gst_amount),
        amount(record.apar_amount),
        amount(record.difference),
    ];
    if options.include_confidence {
        fields.push(
            record
                .confidence
                .map(|c| c.to_string())
                .unwrap_or_else(|| "N/A".to_string()),
        );
    }
    if options.include_reasons {
        fields.push(quoted(record.reason.as_deref().unwrap_or("")));
    }
    fields.push(quoted(date(record.gst_date.as_ref())));
    fields.push(quoted(date(record.apar_date.as_ref())));
    fields.push(if record.date_mismatch { "Yes" } else { "No" }.to_string());
    fields.push(record.date_difference_days.unwrap_or(0).to_string());
    fields
}

fn quoted(text: &str) -> String {
    format!("\"{}\"", text.replace('"', "\"\""))
}

fn amount(value: Option<Money>) -> String {
    value.unwrap_or_else(Money::zero).to_plain_string()
}

fn date(value: Option<&InvoiceDate>) -> &str {
    value.map(InvoiceDate::as_str).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use gstrecon_core::{Category, Confidence, ReconciliationRecord};

    fn partial() -> ReconciliationRecord {
        ReconciliationRecord {
            invoice_no: "INV-1".to_string(),
            gstin: "27AAPFU0939F1ZV".to_string(),
            gst_amount: Some(Money::from_cents(1_000_000)),
            apar_amount: Some(Money::from_cents(985_000)),
            difference: Some(Money::from_cents(15_000)),
            confidence: Some(Confidence::new(0.95)),
            reason: Some("Amount within ±2% threshold".to_string()),
            gst_date: Some(InvoiceDate::new("2024-01-15")),
            apar_date: Some(InvoiceDate::new("2024-01-18")),
            date_mismatch: true,
            date_difference_days: Some(3),
            ..Default::default()
        }
    }

    #[test]
    fn header_with_all_columns() {
        assert_eq!(
            header(&ExportOptions::default()).join(","),
            "Invoice_No,GSTIN,Status,GST_Amount,APAR_Amount,Difference,Confidence,Reason,GST_Date,APAR_Date,Date_Mismatch,Date_Difference_Days"
        );
    }

    #[test]
    fn header_without_optional_columns() {
        let opts = ExportOptions {
            include_confidence: false,
            include_reasons: false,
            ..Default::default()
        };
        assert_eq!(
            header(&opts).join(","),
            "Invoice_No,GSTIN,Status,GST_Amount,APAR_Amount,Difference,GST_Date,APAR_Date,Date_Mismatch,Date_Difference_Days"
        );
    }

    #[test]
    fn row_formats_each_column() {
        let r = partial();
        let tagged = CategorizedRecord::new(Category::Partial, &r);
        let out = render(&[tagged], &ExportOptions::default());
        let line = out.lines().nth(1).unwrap();
        assert_eq!(
            line,
            r#""INV-1","27AAPFU0939F1ZV","Partial Match",10000.00,9850.00,150.00,95%,"Amount within ±2% threshold","2024-01-15","2024-01-18",Yes,3"#
        );
    }

    #[test]
    fn missing_values_use_placeholders() {
        let r = ReconciliationRecord {
            invoice_no: "INV-9".to_string(),
            apar_amount: Some(Money::from_cents(50_050)),
            ..Default::default()
        };
        let tagged = CategorizedRecord::new(Category::MissingGst, &r);
        let out = render(&[tagged], &ExportOptions::default());
        assert_eq!(
            out.lines().nth(1).unwrap(),
            r#""INV-9","","Missing in GST",0.00,500.50,0.00,N/A,"","","",No,0"#
        );
    }

    #[test]
    fn no_trailing_newline() {
        let r = partial();
        let out = render(&[CategorizedRecord::new(Category::Matched, &r)], &ExportOptions::default());
        assert!(!out.ends_with('\n'));
        assert_eq!(out.lines().count(), 2);
    }
}
