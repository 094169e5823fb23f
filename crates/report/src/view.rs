//! Results screen state.
//!
//! All transitions go through [`ResultsView::apply`]; the view never holds
//! the payload itself, only positions into the merged record list and the
//! number of rows each category contributes, which bounds paging.

use chrono::NaiveDateTime;
use gstrecon_core::{CategorizedRecord, Category, ReconciliationResult};
use std::collections::{BTreeMap, BTreeSet};

use crate::export::{export, ExportArtifact, ExportError, ExportFormat};
use crate::filter::{filter, paginate, total_pages, CategoryFilter, PAGE_SIZE};
use crate::options::{ExportFlag, ExportOptions, ExportPreset};

/// An open export dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportSession {
    pub format: ExportFormat,
    pub options: ExportOptions,
}

impl ExportSession {
    pub fn new(format: ExportFormat) -> Self {
        Self {
            format,
            options: ExportOptions::default(),
        }
    }

    pub fn selected_total(&self, result: &ReconciliationResult) -> usize {
        self.options.selected_total(result)
    }

    pub fn can_export(&self, result: &ReconciliationResult) -> bool {
        self.selected_total(result) > 0
    }

    pub fn run(
        &self,
        result: &ReconciliationResult,
        generated_at: NaiveDateTime,
    ) -> Result<ExportArtifact, ExportError> {
        export(result, &self.options, self.format, generated_at)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewAction {
    SetFilter(CategoryFilter),
    GoToPage(usize),
    NextPage,
    PreviousPage,
    /// Expand or collapse a row of the current page.
    ToggleRow(usize),
    /// Open the detail panel for a position in the filtered list.
    Select(usize),
    CloseDetail,
    ToggleReview(String),
    OpenExport(ExportFormat),
    ToggleExportFlag(ExportFlag),
    ApplyPreset(ExportPreset),
    /// The export session produced a file.
    ExportCompleted,
    CloseExport,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultsView {
    pub filter: CategoryFilter,
    /// One-based.
    pub page: usize,
    pub expanded_row: Option<usize>,
    pub selected: Option<usize>,
    pub export: Option<ExportSession>,
    /// Invoice numbers marked for review. Not persisted.
    pub marked_for_review: BTreeSet<String>,
    row_counts: BTreeMap<Category, usize>,
}

impl Default for ResultsView {
    fn default() -> Self {
        Self {
            filter: CategoryFilter::All,
            page: 1,
            expanded_row: None,
            selected: None,
            export: None,
            marked_for_review: BTreeSet::new(),
            row_counts: BTreeMap::new(),
        }
    }
}

impl ResultsView {
    /// A fresh view over the merged records of one result.
    pub fn new(merged: &[CategorizedRecord<'_>]) -> Self {
        let mut row_counts = BTreeMap::new();
        for record in merged {
            *row_counts.entry(record.category).or_insert(0) += 1;
        }
        Self {
            row_counts,
            ..Self::default()
        }
    }

    /// Rows the current filter lets through.
    pub fn filtered_len(&self) -> usize {
        match self.filter {
            CategoryFilter::All => self.row_counts.values().sum(),
            CategoryFilter::Only(category) => self.row_counts.get(&category).copied().unwrap_or(0),
        }
    }

    /// Highest reachable page. An empty list still shows page 1.
    pub fn last_page(&self) -> usize {
        total_pages(self.filtered_len(), PAGE_SIZE).max(1)
    }

    pub fn apply(mut self, action: ViewAction) -> Self {
        match action {
            ViewAction::SetFilter(f) => {
                self.filter = f;
                self.page = 1;
                self.expanded_row = None;
                self.selected = None;
            }
            ViewAction::GoToPage(page) => self.turn_to(page),
            ViewAction::NextPage => self.turn_to(self.page.saturating_add(1)),
            ViewAction::PreviousPage => self.turn_to(self.page.saturating_sub(1)),
            ViewAction::ToggleRow(row) => {
                self.expanded_row = if self.expanded_row == Some(row) {
                    None
                } else {
                    Some(row)
                };
            }
            ViewAction::Select(index) => self.selected = Some(index),
            ViewAction::CloseDetail => self.selected = None,
            ViewAction::ToggleReview(invoice) => {
                if !self.marked_for_review.remove(&invoice) {
                    self.marked_for_review.insert(invoice);
                }
            }
            ViewAction::OpenExport(format) => self.export = Some(ExportSession::new(format)),
            ViewAction::ToggleExportFlag(flag) => {
                if let Some(session) = self.export.as_mut() {
                    session.options.toggle(flag);
                }
            }
            ViewAction::ApplyPreset(preset) => {
                if let Some(session) = self.export.as_mut() {
                    session.options = preset.options();
                }
            }
            ViewAction::ExportCompleted | ViewAction::CloseExport => self.export = None,
        }
        self
    }

    fn turn_to(&mut self, page: usize) {
        let page = page.clamp(1, self.last_page());
        if page != self.page {
            self.page = page;
            self.expanded_row = None;
        }
    }

    pub fn filtered<'a>(&self, merged: &[CategorizedRecord<'a>]) -> Vec<CategorizedRecord<'a>> {
        filter(merged, self.filter)
    }

    /// Rows shown on the current page.
    pub fn page_rows<'a>(&self, merged: &[CategorizedRecord<'a>]) -> Vec<CategorizedRecord<'a>> {
        paginate(&self.filtered(merged), PAGE_SIZE, self.page).to_vec()
    }

    pub fn total_pages(&self) -> usize {
        total_pages(self.filtered_len(), PAGE_SIZE)
    }

    pub fn selected_record<'a>(&self, merged: &[CategorizedRecord<'a>]) -> Option<CategorizedRecord<'a>> {
        self.selected
            .and_then(|i| self.filtered(merged).get(i).copied())
    }

    pub fn is_marked(&self, invoice_no: &str) -> bool {
        self.marked_for_review.contains(invoice_no)
    }
}
