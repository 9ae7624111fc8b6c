//! Harvest orchestration and its run report.

pub mod orchestrator;

use chrono::{DateTime, Utc};
use handbook_requisites::SubjectRecord;
use serde::{Deserialize, Serialize};

pub use orchestrator::Harvester;

/// A subject whose pipeline failed somewhere between locate and parse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedSubject {
    pub code: String,
    pub href: String,
    pub error: String,
}

/// A listing page that contributed no subjects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedPage {
    pub page: u32,
    pub error: String,
}

/// Outcome of one harvest run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarvestReport {
    /// Records to write. Incomplete ones only appear when configured to.
    pub records: Vec<SubjectRecord>,
    pub failed_subjects: Vec<FailedSubject>,
    pub failed_pages: Vec<FailedPage>,
    /// Total pages in the listing, before any page selection.
    pub page_count: u32,
    pub elapsed_ms: u64,
    pub harvested_at: DateTime<Utc>,
}

impl HarvestReport {
    /// Number of subjects harvested without error.
    pub fn complete_count(&self) -> usize {
        self.records.iter().filter(|r| r.is_complete()).count()
    }

    pub fn summary(&self) -> String {
        format!(
            "Downloaded requisite information for {} subjects in {:.1} seconds",
            self.complete_count(),
            self.elapsed_ms as f64 / 1000.0
        )
    }
}
