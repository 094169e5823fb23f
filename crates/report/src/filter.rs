use gstrecon_core::{Category, CategoryError, CategorizedRecord};
use std::fmt;
use std::str::FromStr;

/// Rows per page in the on-screen results table.
pub const PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Category),
}

impl CategoryFilter {
    pub fn matches(self, category: Category) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(c) => c == category,
        }
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryFilter::All => f.write_str("all"),
            CategoryFilter::Only(c) => write!(f, "{c}"),
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = CategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(CategoryFilter::All);
        }
        s.parse().map(CategoryFilter::Only)
    }
}

pub fn filter<'a>(records: &[CategorizedRecord<'a>], by: CategoryFilter) -> Vec<CategorizedRecord<'a>> {
    records
        .iter()
        .filter(|r| by.matches(r.category))
        .copied()
        .collect()
}

/// One-based page window. Page zero and pages past the end are empty.
pub fn paginate<T>(items: &[T], page_size: usize, page: usize) -> &[T] {
    if page == 0 || page_size == 0 {
        return &[];
    }
    let start = (page - 1).saturating_mul(page_size).min(items.len());
    let end = page.saturating_mul(page_size).min(items.len());
    &items[start..end]
}

pub fn total_pages(len: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    len.div_ceil(page_size)
}
