//! Self-contained printable HTML report.

use chrono::NaiveDateTime;
use gstrecon_core::{Category, CategorizedRecord, Money, ReconciliationResult};
use std::fmt::Write;

use crate::options::ExportOptions;
use crate::util::escape_html;

const STYLE: &str = r#"
    body { font-family: Arial, sans-serif; margin: 20px; color: #333; }
    .header { text-align: center; border-bottom: 3px solid #2563eb; padding-bottom: 20px; margin-bottom: 30px; }
    .header h1 { color: #1e40af; margin: 0; font-size: 28px; }
    .header .subtitle { color: #6b7280; margin-top: 5px; }
    .summary { display: grid; grid-template-columns: repeat(5, 1fr); gap: 15px; margin-bottom: 30px; }
    .summary-card { border: 1px solid #e5e7eb; border-radius: 8px; padding: 15px; text-align: center; }
    .summary-card h3 { margin: 0; font-size: 24px; color: #1f2937; }
    .summary-card p { margin: 5px 0 0 0; font-size: 12px; color: #6b7280; }
    .matched { border-left: 4px solid #10b981; }
    .partial { border-left: 4px solid #f59e0b; }
    .mismatched { border-left: 4px solid #ef4444; }
    .missing-gst { border-left: 4px solid #8b5cf6; }
    .missing-apar { border-left: 4px solid #3b82f6; }
    table { width: 100%; border-collapse: collapse; margin-top: 20px; font-size: 11px; }
    th { background-color: #f3f4f6; border: 1px solid #d1d5db; padding: 10px; text-align: left; font-weight: 600; color: #374151; }
    td { border: 1px solid #e5e7eb; padding: 8px; }
    tr:nth-child(even) { background-color: #f9fafb; }
    .num { text-align: right; }
    .status-badge { display: inline-block; padding: 4px 8px; border-radius: 12px; font-size: 10px; font-weight: 600; }
    .status-matched { background-color: #d1fae5; color: #065f46; }
    .status-partial { background-color: #fed7aa; color: #92400e; }
    .status-mismatched { background-color: #fee2e2; color: #991b1b; }
    .status-missing-gst { background-color: #ede9fe; color: #5b21b6; }
    .status-missing-apar { background-color: #dbeafe; color: #1e40af; }
    .insights { margin: 30px 0; padding: 20px; background-color: #eff6ff; border-left: 4px solid #3b82f6; border-radius: 8px; }
    .insights h3 { margin-top: 0; color: #1e40af; }
    .insights li { margin: 8px 0; color: #1f2937; }
    .footer { margin-top: 40px; padding-top: 20px; border-top: 2px solid #e5e7eb; text-align: center; color: #6b7280; font-size: 11px; }
"#;

const POSITIVE_DIFFERENCE: &str = "#dc2626";
const OTHER_DIFFERENCE: &str = "#16a34a";

/// Summary cards come from the reported counts; the table holds `records`.
pub fn render(
    result: &ReconciliationResult,
    records: &[CategorizedRecord<'_>],
    options: &ExportOptions,
    generated_at: NaiveDateTime,
) -> String {
    let mut html = String::with_capacity(4096 + records.len() * 512);
    html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"UTF-8\">\n");
    html.push_str("<title>Reconciliation Report</title>\n<style>");
    html.push_str(STYLE);
    html.push_str("</style>\n</head>\n<body>\n");

    let _ = write!(
        html,
        "<div class=\"header\">\n<h1>GST vs AP/AR Reconciliation Report</h1>\n\
         <p class=\"subtitle\">Generated on {}</p>\n</div>\n",
        generated_at.format("%d/%m/%Y, %H:%M:%S")
    );

    html.push_str("<div class=\"summary\">\n");
    for category in Category::ALL {
        let _ = writeln!(
            html,
            "<div class=\"summary-card {}\"><h3>{}</h3><p>{}</p></div>",
            category.css_class(),
            result.summary.count(category),
            category.status_label()
        );
    }
    html.push_str("</div>\n");

    html.push_str("<div class=\"insights\">\n<h3>Insights</h3>\n<ul>\n");
    for insight in &result.insights {
        let _ = writeln!(html, "<li>{}</li>", escape_html(insight));
    }
    html.push_str("</ul>\n</div>\n");

    let _ = writeln!(
        html,
        "<h2 style=\"margin-top: 40px; color: #1f2937;\">Detailed Records ({} total)</h2>",
        records.len()
    );
    html.push_str("<table>\n<thead>\n<tr>");
    for col in ["Invoice No", "GSTIN", "Status", "GST Amount", "AP/AR Amount", "Difference"] {
        let _ = write!(html, "<th>{col}</th>");
    }
    if options.include_confidence {
        html.push_str("<th>Confidence</th>");
    }
    if options.include_reasons {
        html.push_str("<th>Reason</th>");
    }
    html.push_str("</tr>\n</thead>\n<tbody>\n");
    for record in records {
        push_row(&mut html, record, options);
    }
    html.push_str("</tbody>\n</table>\n");

    let _ = write!(
        html,
        "<div class=\"footer\">\n<p><strong>GST vs AP/AR Reconciliation</strong></p>\n\
         <p>Match Rate: {}% | Total Records: {}</p>\n\
         <p>This report was generated automatically. Please verify critical data before making financial decisions.</p>\n\
         </div>\n</body>\n</html>\n",
        result.summary.match_rate,
        result.summary.total()
    );
    html
}

fn push_row(html: &mut String, record: &CategorizedRecord<'_>, options: &ExportOptions) {
    let difference = record.difference.unwrap_or_else(Money::zero);
    let diff_color = if difference.is_positive() {
        POSITIVE_DIFFERENCE
    } else {
        OTHER_DIFFERENCE
    };

    html.push_str("<tr>");
    let _ = write!(html, "<td>{}</td>", or_na(&record.invoice_no));
    let _ = write!(
        html,
        "<td style=\"font-family: monospace; font-size: 10px;\">{}</td>",
        or_na(&record.gstin)
    );
    let _ = write!(
        html,
        "<td><span class=\"status-badge status-{}\">{}</span></td>",
        record.category.css_class(),
        record.status()
    );
    let _ = write!(html, "<td class=\"num\">{}</td>", inr(record.gst_amount));
    let _ = write!(html, "<td class=\"num\">{}</td>", inr(record.apar_amount));
    let _ = write!(
        html,
        "<td class=\"num\" style=\"color: {diff_color}; font-weight: 600;\">{}</td>",
        difference.format_inr()
    );
    if options.include_confidence {
        let confidence = record
            .confidence
            .map(|c| c.to_string())
            .unwrap_or_else(|| "N/A".to_string());
        let _ = write!(html, "<td style=\"text-align: center;\">{confidence}</td>");
    }
    if options.include_reasons {
        let reason = record.reason.as_deref().unwrap_or("");
        let _ = write!(html, "<td style=\"font-size: 10px;\">{}</td>", or_na(reason));
    }
    html.push_str("</tr>\n");
}

fn or_na(text: &str) -> String {
    if text.is_empty() {
        "N/A".to_string()
    } else {
        escape_html(text)
    }
}

fn inr(value: Option<Money>) -> String {
    value.unwrap_or_else(Money::zero).format_inr()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use gstrecon_core::{Confidence, ReconciliationRecord};

    fn generated_at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_hms_opt(14, 3, 22)
            .unwrap()
    }

    fn result() -> ReconciliationResult {
        let mut result = ReconciliationResult::default();
        result.summary.matched = 120;
        result.summary.mismatched = 1;
        result.summary.match_rate = 66.67;
        result.insights = vec!["Top <vendor> & co".to_string()];
        result.details.mismatched = vec![ReconciliationRecord {
            invoice_no: "INV<1>".to_string(),
            gstin: String::new(),
            gst_amount: Some(Money::from_cents(123_456_789)),
            apar_amount: None,
            difference: Some(Money::from_cents(125_050)),
            confidence: Some(Confidence::new(0.5)),
            reason: Some("He said \"urgent\"".to_string()),
            ..Default::default()
        }];
        result
    }

    fn render_default(result: &ReconciliationResult) -> String {
        let opts = ExportOptions::default();
        let records = opts.select(result);
        render(result, &records, &opts, generated_at())
    }

    #[test]
    fn header_and_timestamp() {
        let html = render_default(&result());
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("Generated on 05/03/2024, 14:03:22"));
    }

    #[test]
    fn cards_use_reported_counts() {
        let html = render_default(&result());
        assert!(html.contains("<div class=\"summary-card matched\"><h3>120</h3><p>Matched</p></div>"));
        assert!(html.contains("<div class=\"summary-card missing-apar\"><h3>0</h3><p>Missing in AP/AR</p></div>"));
        assert!(html.contains("Detailed Records (1 total)"));
        assert!(html.contains("Match Rate: 66.67% | Total Records: 121"));
    }

    #[test]
    fn payload_text_is_escaped() {
        let html = render_default(&result());
        assert!(html.contains("<li>Top &lt;vendor&gt; &amp; co</li>"));
        assert!(html.contains("<td>INV&lt;1&gt;</td>"));
        assert!(html.contains("He said &quot;urgent&quot;"));
        assert!(!html.contains("INV<1>"));
    }

    #[test]
    fn currency_and_placeholders() {
        let html = render_default(&result());
        assert!(html.contains("₹12,34,567.89"));
        assert!(html.contains("<td class=\"num\">₹0.00</td>"));
        assert!(html.contains("color: #dc2626; font-weight: 600;\">₹1,250.50</td>"));
        assert!(html.contains("monospace; font-size: 10px;\">N/A</td>"));
        assert!(html.contains("<span class=\"status-badge status-mismatched\">Mismatched</span>"));
        assert!(html.contains(">50%</td>"));
    }

    #[test]
    fn optional_columns_follow_options() {
        let result = result();
        let opts = ExportOptions {
            include_confidence: false,
            include_reasons: false,
            ..Default::default()
        };
        let records = opts.select(&result);
        let html = render(&result, &records, &opts, generated_at());
        assert!(!html.contains("<th>Confidence</th>"));
        assert!(!html.contains("<th>Reason</th>"));
        assert!(!html.contains("urgent"));
    }

    #[test]
    fn negative_difference_is_green() {
        let mut result = result();
        result.details.mismatched[0].difference = Some(Money::from_cents(-5_000));
        let html = render_default(&result);
        assert!(html.contains("color: #16a34a; font-weight: 600;\">-₹50.00</td>"));
    }
}
