use anyhow::{bail, Context, Result};
use gstrecon_client::{Dataset, HttpBackend, InputFile, MissingPreview, ReconBackend, Workflow};
use gstrecon_core::{CategorizedRecord, Category, Money, ReconciliationResult, Side, Sides};
use gstrecon_report::{
    detect_issues, export_now, export_record, merge, suggested_actions, CategoryFilter, DatasetTotals,
    ExportFlag, ExportFormat, ExportOptions, ExportPreset, ResultsView, Statistics, ViewAction,
};
use std::fmt::Write;
use std::path::{Path, PathBuf};

use crate::config::AppConfig;

pub fn load_result(path: &Path) -> Result<ReconciliationResult> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    ReconciliationResult::from_json(&text).with_context(|| format!("parsing {}", path.display()))
}

/// Export options from config, replaced by a preset and narrowed by flags.
pub fn resolve_options(
    base: ExportOptions,
    preset: Option<ExportPreset>,
    exclude: &[Category],
    no_confidence: bool,
    no_reasons: bool,
) -> ExportOptions {
    let mut options = preset.map(ExportPreset::options).unwrap_or(base);
    for category in exclude {
        options.set(ExportFlag::Category(*category), false);
    }
    if no_confidence {
        options.set(ExportFlag::Confidence, false);
    }
    if no_reasons {
        options.set(ExportFlag::Reasons, false);
    }
    options
}

// ── summary ───────────────────────────────────────────────────────────────────

pub fn summary_text(result: &ReconciliationResult, totals: Option<DatasetTotals>) -> String {
    let stats = Statistics::compute(result);
    let mut out = String::new();

    let _ = writeln!(out, "Match rate: {}%", result.summary.match_rate);
    for (category, delivered) in &stats.per_category {
        let reported = result.summary.count(*category);
        let _ = write!(out, "  {:<18}{:>6}", category.label(), reported);
        if reported != *delivered {
            let _ = write!(out, "  ({delivered} listed)");
        }
        out.push('\n');
    }
    let _ = writeln!(out, "Records listed: {}", stats.total_records);
    let _ = writeln!(out, "Date mismatches: {}", stats.date_mismatches);
    let _ = writeln!(out, "Average confidence: {:.1}%", stats.average_confidence);
    for (band, count) in stats.distribution.iter() {
        let _ = writeln!(out, "  {:<8} {:<9}{:>6}", band.range_label(), band.level_label(), count);
    }

    if let Some(totals) = totals {
        let _ = writeln!(out, "GST total:   {}", totals.gst);
        let _ = writeln!(out, "AP/AR total: {}", totals.apar);
        if totals.has_value_difference() {
            let _ = writeln!(out, "Value difference: {}", totals.value_difference());
        }
    }

    if !result.insights.is_empty() {
        out.push_str("Insights:\n");
        for insight in &result.insights {
            let _ = writeln!(out, "  - {insight}");
        }
    }
    out
}

pub fn summary(input: &Path, gst_total: Option<Money>, apar_total: Option<Money>) -> Result<()> {
    let result = load_result(input)?;
    let totals = match (gst_total, apar_total) {
        (Some(gst), Some(apar)) => Some(DatasetTotals::new(gst, apar)),
        (None, None) => None,
        _ => bail!("--gst-total and --apar-total must be given together"),
    };
    print!("{}", summary_text(&result, totals));
    Ok(())
}

// ── list ──────────────────────────────────────────────────────────────────────

fn amount(value: Option<Money>) -> String {
    value.map(|m| m.to_string()).unwrap_or_else(|| "N/A".to_string())
}

pub fn list_text(result: &ReconciliationResult, filter: CategoryFilter, page: usize) -> String {
    let merged = merge(result);
    let view = ResultsView::new(&merged)
        .apply(ViewAction::SetFilter(filter))
        .apply(ViewAction::GoToPage(page));

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<16} {:<16} {:<17} {:>15} {:>15} {:>13} {:>5}",
        "Invoice", "GSTIN", "Status", "GST", "AP/AR", "Difference", "Conf"
    );
    for record in view.page_rows(&merged) {
        let confidence = record
            .confidence
            .map(|c| c.to_string())
            .unwrap_or_else(|| "-".to_string());
        let _ = writeln!(
            out,
            "{:<16} {:<16} {:<17} {:>15} {:>15} {:>13} {:>5}",
            record.invoice_no,
            record.gstin,
            record.category.label(),
            amount(record.gst_amount),
            amount(record.apar_amount),
            amount(record.difference),
            confidence
        );
    }
    let _ = writeln!(
        out,
        "Page {} of {} ({} records, filter: {})",
        view.page,
        view.last_page(),
        view.filtered_len(),
        view.filter
    );
    out
}

pub fn list(input: &Path, filter: CategoryFilter, page: usize) -> Result<()> {
    let result = load_result(input)?;
    print!("{}", list_text(&result, filter, page));
    Ok(())
}

// ── export ────────────────────────────────────────────────────────────────────

pub fn export(input: &Path, format: ExportFormat, options: ExportOptions, out_dir: &Path) -> Result<PathBuf> {
    let result = load_result(input)?;
    let artifact = export_now(&result, &options, format)?;
    let path = artifact.write_to(out_dir)?;
    println!("Wrote {} records to {}", options.selected_total(&result), path.display());
    Ok(path)
}

// ── detail ────────────────────────────────────────────────────────────────────

fn side_lines(out: &mut String, title: &str, side: Option<Side<'_>>) {
    let _ = writeln!(out, "{title}:");
    match side {
        Some(side) => {
            let _ = writeln!(out, "  Amount: {}", amount(side.amount));
            let date = side.date.map(|d| d.as_str()).unwrap_or("N/A");
            let _ = writeln!(out, "  Date:   {date}");
        }
        None => {
            let _ = writeln!(out, "  Not found");
        }
    }
}

pub fn detail_text(record: &CategorizedRecord<'_>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} [{}]", record.invoice_no, record.category.label());
    let _ = writeln!(out, "GSTIN: {}", record.gstin);
    if let Some(c) = record.confidence {
        let _ = writeln!(out, "Confidence: {c}");
    }

    let (gst, apar) = match record.sides() {
        Sides::Paired { gst, apar } => (Some(gst), Some(apar)),
        Sides::GstOnly(gst) => (Some(gst), None),
        Sides::AparOnly(apar) => (None, Some(apar)),
    };
    side_lines(&mut out, "GST", gst);
    side_lines(&mut out, "AP/AR", apar);

    if let Some(reason) = &record.reason {
        let _ = writeln!(out, "Reason: {reason}");
    }
    let issues = detect_issues(record);
    if !issues.is_empty() {
        out.push_str("Issues:\n");
        for issue in issues {
            let _ = writeln!(out, "  - {issue}");
        }
    }
    let actions = suggested_actions(record);
    if !actions.is_empty() {
        out.push_str("Suggested actions:\n");
        for action in actions {
            let _ = writeln!(out, "  - {action}");
        }
    }
    out
}

pub fn detail(input: &Path, invoice: &str, out_dir: Option<&Path>) -> Result<()> {
    let result = load_result(input)?;
    let merged = merge(&result);
    let record = merged
        .iter()
        .find(|r| r.invoice_no == invoice)
        .with_context(|| format!("invoice {invoice} not found"))?;
    print!("{}", detail_text(record));
    if let Some(dir) = out_dir {
        let path = export_record(record)?.write_to(dir)?;
        println!("Wrote {}", path.display());
    }
    Ok(())
}

// ── run ───────────────────────────────────────────────────────────────────────

async fn read_input(path: &Path) -> Result<InputFile> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string();
    Ok(InputFile::new(name, bytes))
}

fn preview_text(preview: &MissingPreview) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Common records: {}", preview.common_records);
    for (label, set) in [
        ("Missing in AP/AR", &preview.missing_in_apar),
        ("Missing in GST", &preview.missing_in_gst),
    ] {
        let _ = writeln!(out, "{label}: {} ({})", set.count, set.total_value);
    }
    out
}

pub async fn run(
    config: &AppConfig,
    gst: &Path,
    apar: &Path,
    format: ExportFormat,
    out_dir: &Path,
) -> Result<()> {
    let backend = HttpBackend::new(config.backend_url.clone(), config.timeout())?;
    let mut workflow = Workflow::new(backend);

    let gst_file = read_input(gst).await?;
    let apar_file = read_input(apar).await?;
    workflow.upload(&gst_file, &apar_file).await?;

    if let (Some(g), Some(a)) = (
        workflow.upload_summary(Dataset::Gst),
        workflow.upload_summary(Dataset::Apar),
    ) {
        println!("Uploaded {} GST and {} AP/AR records", g.records, a.records);
        let totals = DatasetTotals::new(g.total_invoice_value, a.total_invoice_value);
        if totals.has_value_difference() {
            println!("Dataset value difference: {}", totals.value_difference());
        }
    }
    match workflow.load_preview().await {
        Ok(preview) => print!("{}", preview_text(preview)),
        Err(e) => tracing::warn!(error = %e, "continuing without preview"),
    }

    let ticket = workflow.begin_reconcile()?;
    let outcome = tokio::select! {
        outcome = workflow.backend().reconcile() => Some(outcome),
        _ = tokio::signal::ctrl_c() => None,
    };
    let Some(outcome) = outcome else {
        workflow.cancel();
        bail!("reconciliation cancelled");
    };
    workflow.complete_reconcile(ticket, outcome)?;
    let result = workflow
        .result()
        .context("reconciliation finished without a result")?;

    print!("{}", summary_text(result, None));
    let artifact = export_now(result, &config.options, format)?;
    let path = artifact.write_to(out_dir)?;
    println!("Report written to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gstrecon_core::{Confidence, InvoiceDate, ReconciliationRecord};

    fn result() -> ReconciliationResult {
        let mut result = ReconciliationResult::default();
        result.summary.matched = 150;
        result.summary.missing_in_gst = 1;
        result.summary.match_rate = 93.75;
        result.details.matched = vec![ReconciliationRecord {
            invoice_no: "INV-1".into(),
            gstin: "G1".into(),
            gst_amount: Some(Money::from_cents(10_000)),
            apar_amount: Some(Money::from_cents(10_000)),
            confidence: Some(Confidence::new(1.0)),
            ..Default::default()
        }];
        result.details.missing_in_gst = vec![ReconciliationRecord {
            invoice_no: "INV-2".into(),
            gstin: "G2".into(),
            apar_amount: Some(Money::from_cents(55_000)),
            apar_date: Some(InvoiceDate::new("2024-02-10")),
            ..Default::default()
        }];
        result.insights = vec!["1 invoice in AP/AR but not yet filed in GST".into()];
        result
    }

    #[test]
    fn options_resolution_order() {
        let base = ExportOptions {
            include_reasons: false,
            ..Default::default()
        };
        let opts = resolve_options(base, None, &[Category::Partial], false, false);
        assert!(!opts.include_reasons);
        assert!(!opts.include_partial);

        let opts = resolve_options(base, Some(ExportPreset::IssuesOnly), &[], true, false);
        assert!(opts.include_reasons);
        assert!(!opts.include_matched);
        assert!(!opts.include_confidence);
    }

    #[test]
    fn summary_flags_capped_bucket() {
        let text = summary_text(&result(), None);
        assert!(text.contains("Match rate: 93.75%"));
        assert!(text.contains("(1 listed)"));
        assert!(text.contains("Average confidence: 100.0%"));
        assert!(text.contains("  - 1 invoice in AP/AR"));
    }

    #[test]
    fn summary_with_totals() {
        let totals = DatasetTotals::new(Money::from_cents(100_000), Money::from_cents(90_000));
        let text = summary_text(&result(), Some(totals));
        assert!(text.contains("Value difference: ₹100.00"));
    }

    #[test]
    fn list_pages_filtered_rows() {
        let text = list_text(&result(), CategoryFilter::Only(Category::MissingGst), 1);
        assert!(text.contains("INV-2"));
        assert!(!text.contains("INV-1 "));
        assert!(text.contains("Page 1 of 1 (1 records, filter: missing_gst)"));
    }

    #[test]
    fn list_page_past_end_shows_last_page() {
        let text = list_text(&result(), CategoryFilter::All, 7);
        assert!(text.contains("INV-1"));
        assert!(text.contains("Page 1 of 1 (2 records, filter: all)"));
    }

    #[test]
    fn detail_of_one_sided_record() {
        let result = result();
        let merged = merge(&result);
        let text = detail_text(&merged[1]);
        assert!(text.starts_with("INV-2 [Missing in GST]"));
        assert!(text.contains("GST:\n  Not found"));
        assert!(text.contains("  Date:   2024-02-10"));
        assert!(text.contains("File GST return for this invoice"));
        assert!(!text.contains("Issues:"));
    }

    #[test]
    fn export_writes_into_out_dir() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("result.json");
        std::fs::write(&input, r#"{"details": {"mismatched": [{"Invoice_No": "X"}]}}"#).unwrap();
        let path = export(&input, ExportFormat::Csv, ExportOptions::default(), &dir.path().join("out")).unwrap();
        let text = std::fs::read_to_string(path).unwrap();
        assert!(text.starts_with("Invoice_No,GSTIN,Status"));
        assert!(text.contains("\"X\",\"\",\"Mismatched\""));
    }

    #[test]
    fn export_nothing_selected_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("result.json");
        std::fs::write(&input, r#"{"details": {"matched": [{"Invoice_No": "X"}]}}"#).unwrap();
        let opts = ExportPreset::IssuesOnly.options();
        let err = export(&input, ExportFormat::Html, opts, dir.path()).unwrap_err();
        assert!(err.to_string().contains("No records to export"));
    }
}
