use gstrecon_core::{Category, CategorizedRecord, Confidence, Money, ReconciliationResult};
use serde::{Deserialize, Serialize};

/// Concatenates the five buckets in category order, tagging each record with
/// the bucket it came from. Order inside a bucket is kept as delivered.
pub fn merge(result: &ReconciliationResult) -> Vec<CategorizedRecord<'_>> {
    Category::ALL
        .into_iter()
        .flat_map(|category| {
            result
                .bucket(category)
                .iter()
                .map(move |record| CategorizedRecord::new(category, record))
        })
        .collect()
}

// ── Confidence ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ConfidenceBand {
    High,
    Medium,
    Low,
    VeryLow,
}

impl ConfidenceBand {
    pub const ALL: [ConfidenceBand; 4] = [
        ConfidenceBand::High,
        ConfidenceBand::Medium,
        ConfidenceBand::Low,
        ConfidenceBand::VeryLow,
    ];

    /// Lower bounds are inclusive: 0.9, 0.7 and 0.5 belong to the higher band.
    pub fn of(confidence: Confidence) -> Self {
        let v = confidence.value();
        if v >= 0.9 {
            ConfidenceBand::High
        } else if v >= 0.7 {
            ConfidenceBand::Medium
        } else if v >= 0.5 {
            ConfidenceBand::Low
        } else {
            ConfidenceBand::VeryLow
        }
    }

    pub fn range_label(self) -> &'static str {
        match self {
            ConfidenceBand::High => "90-100%",
            ConfidenceBand::Medium => "70-89%",
            ConfidenceBand::Low => "50-69%",
            ConfidenceBand::VeryLow => "0-49%",
        }
    }

    pub fn level_label(self) -> &'static str {
        match self {
            ConfidenceBand::High => "High",
            ConfidenceBand::Medium => "Medium",
            ConfidenceBand::Low => "Low",
            ConfidenceBand::VeryLow => "Very Low",
        }
    }

    pub fn hex(self) -> &'static str {
        match self {
            ConfidenceBand::High => "#10b981",
            ConfidenceBand::Medium => "#3b82f6",
            ConfidenceBand::Low => "#f59e0b",
            ConfidenceBand::VeryLow => "#ef4444",
        }
    }

    fn index(self) -> usize {
        match self {
            ConfidenceBand::High => 0,
            ConfidenceBand::Medium => 1,
            ConfidenceBand::Low => 2,
            ConfidenceBand::VeryLow => 3,
        }
    }
}

/// Record counts per confidence band. Records without a confidence are not counted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfidenceDistribution {
    counts: [usize; 4],
}

impl ConfidenceDistribution {
    pub fn count(&self, band: ConfidenceBand) -> usize {
        self.counts[band.index()]
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ConfidenceBand, usize)> + '_ {
        ConfidenceBand::ALL.into_iter().map(|b| (b, self.count(b)))
    }
}

pub fn confidence_distribution(records: &[CategorizedRecord<'_>]) -> ConfidenceDistribution {
    let mut dist = ConfidenceDistribution::default();
    for confidence in records.iter().filter_map(|r| r.confidence) {
        dist.counts[ConfidenceBand::of(confidence).index()] += 1;
    }
    dist
}

/// Mean confidence as a percentage rounded to one decimal place; `0.0` when
/// no record carries a confidence.
pub fn average_confidence(records: &[CategorizedRecord<'_>]) -> f64 {
    let (sum, n) = records
        .iter()
        .filter_map(|r| r.confidence)
        .fold((0.0f64, 0usize), |(s, n), c| (s + c.value(), n + 1));
    if n == 0 {
        return 0.0;
    }
    (sum / n as f64 * 1000.0).round() / 10.0
}

// ── Dataset totals ───────────────────────────────────────────────────────────

/// Total invoice value of each uploaded dataset, as reported by the upload step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetTotals {
    pub gst: Money,
    pub apar: Money,
}

impl DatasetTotals {
    pub fn new(gst: Money, apar: Money) -> Self {
        Self { gst, apar }
    }

    pub fn value_difference(&self) -> Money {
        (self.gst - self.apar).abs()
    }

    /// Differences up to one paisa are rounding noise.
    pub fn has_value_difference(&self) -> bool {
        self.value_difference() > Money::from_cents(1)
    }
}

// ── Statistics ───────────────────────────────────────────────────────────────

/// Everything the results view derives from a payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Statistics {
    pub total_records: usize,
    pub per_category: Vec<(Category, usize)>,
    pub distribution: ConfidenceDistribution,
    pub average_confidence: f64,
    pub date_mismatches: usize,
}

impl Statistics {
    pub fn compute(result: &ReconciliationResult) -> Self {
        for drift in result.summary_drift() {
            tracing::warn!(
                category = %drift.category,
                reported = drift.reported,
                delivered = drift.delivered,
                "summary count differs from delivered records"
            );
        }

        let merged = merge(result);
        let stats = Statistics {
            total_records: merged.len(),
            per_category: Category::ALL
                .into_iter()
                .map(|c| (c, result.bucket(c).len()))
                .collect(),
            distribution: confidence_distribution(&merged),
            average_confidence: average_confidence(&merged),
            date_mismatches: merged.iter().filter(|r| r.date_mismatch).count(),
        };
        tracing::debug!(
            total = stats.total_records,
            average_confidence = stats.average_confidence,
            "computed reconciliation statistics"
        );
        stats
    }
}
