use gstrecon_core::{Category, CategorizedRecord, ReconciliationResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OptionsError {
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Unknown export preset: {0}")]
    UnknownPreset(String),
}

/// What goes into an export. Defaults to everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    pub include_matched: bool,
    pub include_partial: bool,
    pub include_mismatched: bool,
    pub include_missing_gst: bool,
    pub include_missing_apar: bool,
    pub include_confidence: bool,
    pub include_reasons: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        ExportPreset::AllRecords.options()
    }
}

/// One checkbox in the export dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFlag {
    Category(Category),
    Confidence,
    Reasons,
}

impl ExportOptions {
    /// Parse a saved option set, e.g.
    ///
    /// ```toml
    /// include_matched = false
    /// include_reasons = false
    /// ```
    ///
    /// Keys left out keep their default.
    pub fn from_toml(toml_str: &str) -> Result<Self, OptionsError> {
        Ok(toml::from_str(toml_str)?)
    }

    pub fn includes(&self, category: Category) -> bool {
        match category {
            Category::Matched => self.include_matched,
            Category::Partial => self.include_partial,
            Category::Mismatched => self.include_mismatched,
            Category::MissingGst => self.include_missing_gst,
            Category::MissingApar => self.include_missing_apar,
        }
    }

    pub fn set(&mut self, flag: ExportFlag, on: bool) {
        let slot = match flag {
            ExportFlag::Category(Category::Matched) => &mut self.include_matched,
            ExportFlag::Category(Category::Partial) => &mut self.include_partial,
            ExportFlag::Category(Category::Mismatched) => &mut self.include_mismatched,
            ExportFlag::Category(Category::MissingGst) => &mut self.include_missing_gst,
            ExportFlag::Category(Category::MissingApar) => &mut self.include_missing_apar,
            ExportFlag::Confidence => &mut self.include_confidence,
            ExportFlag::Reasons => &mut self.include_reasons,
        };
        *slot = on;
    }

    pub fn get(&self, flag: ExportFlag) -> bool {
        match flag {
            ExportFlag::Category(c) => self.includes(c),
            ExportFlag::Confidence => self.include_confidence,
            ExportFlag::Reasons => self.include_reasons,
        }
    }

    pub fn toggle(&mut self, flag: ExportFlag) {
        let current = self.get(flag);
        self.set(flag, !current);
    }

    pub fn categories(&self) -> impl Iterator<Item = Category> + '_ {
        Category::ALL.into_iter().filter(|c| self.includes(*c))
    }

    /// Records the export will contain, counted from the delivered buckets.
    pub fn selected_total(&self, result: &ReconciliationResult) -> usize {
        self.categories().map(|c| result.bucket(c).len()).sum()
    }

    /// Included buckets in category order, each record tagged for its `Status`.
    pub fn select<'a>(&self, result: &'a ReconciliationResult) -> Vec<CategorizedRecord<'a>> {
        self.categories()
            .flat_map(|c| {
                result
                    .bucket(c)
                    .iter()
                    .map(move |r| CategorizedRecord::new(c, r))
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportPreset {
    AllRecords,
    IssuesOnly,
}

impl ExportPreset {
    pub fn name(self) -> &'static str {
        match self {
            ExportPreset::AllRecords => "All Records",
            ExportPreset::IssuesOnly => "Issues Only",
        }
    }

    pub fn options(self) -> ExportOptions {
        ExportOptions {
            include_matched: self == ExportPreset::AllRecords,
            include_partial: true,
            include_mismatched: true,
            include_missing_gst: true,
            include_missing_apar: true,
            include_confidence: true,
            include_reasons: true,
        }
    }
}

impl fmt::Display for ExportPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ExportPreset {
    type Err = OptionsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" | "all-records" | "all records" => Ok(ExportPreset::AllRecords),
            "issues" | "issues-only" | "issues only" => Ok(ExportPreset::IssuesOnly),
            other => Err(OptionsError::UnknownPreset(other.to_string())),
        }
    }
}
