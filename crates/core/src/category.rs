use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// The five mutually exclusive reconciliation outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Matched,
    Partial,
    Mismatched,
    MissingGst,
    MissingApar,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CategoryError {
    #[error("Unknown category: '{0}'")]
    Unknown(String),
}

impl Category {
    /// Display and merge order.
    pub const ALL: [Category; 5] = [
        Category::Matched,
        Category::Partial,
        Category::Mismatched,
        Category::MissingGst,
        Category::MissingApar,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Category::Matched => "matched",
            Category::Partial => "partial",
            Category::Mismatched => "mismatched",
            Category::MissingGst => "missing_gst",
            Category::MissingApar => "missing_apar",
        }
    }

    /// Badge label on the results table and detail view.
    pub fn label(self) -> &'static str {
        match self {
            Category::Matched => "Exact Match",
            Category::Partial => "Partial Match",
            Category::Mismatched => "Mismatched",
            Category::MissingGst => "Missing in GST",
            Category::MissingApar => "Missing in AP/AR",
        }
    }

    /// `Status` column value stamped onto exported records.
    pub fn status_label(self) -> &'static str {
        match self {
            Category::Matched => "Matched",
            Category::Partial => "Partial Match",
            Category::Mismatched => "Mismatched",
            Category::MissingGst => "Missing in GST",
            Category::MissingApar => "Missing in AP/AR",
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            Category::Matched => "green",
            Category::Partial => "orange",
            Category::Mismatched => "red",
            Category::MissingGst => "purple",
            Category::MissingApar => "blue",
        }
    }

    pub fn hex(self) -> &'static str {
        match self {
            Category::Matched => "#10b981",
            Category::Partial => "#f59e0b",
            Category::Mismatched => "#ef4444",
            Category::MissingGst => "#8b5cf6",
            Category::MissingApar => "#3b82f6",
        }
    }

    /// Class shared by the summary card and the status badge in the printable report.
    pub fn css_class(self) -> &'static str {
        match self {
            Category::Matched => "matched",
            Category::Partial => "partial",
            Category::Mismatched => "mismatched",
            Category::MissingGst => "missing-gst",
            Category::MissingApar => "missing-apar",
        }
    }

    /// Only one side of the pair exists, so amount, date and confidence are
    /// meaningful for that side alone.
    pub fn is_missing_side(self) -> bool {
        matches!(self, Category::MissingGst | Category::MissingApar)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl std::str::FromStr for Category {
    type Err = CategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        Category::ALL
            .into_iter()
            .find(|c| c.key() == needle)
            .ok_or_else(|| CategoryError::Unknown(s.to_string()))
    }
}
