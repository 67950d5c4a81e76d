//! Review decisions stored beside the images.
//!
//! Each reviewed folder holds a `review_results.json` mapping file names to
//! a status string. The overview only reads it (for status badges); review
//! views write it through [`ResultsStore::save`].

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::OverviewError;
use crate::project::FileRef;

/// Name of the results file inside a reviewed folder.
pub const RESULTS_FILENAME: &str = "review_results.json";

/// Decision recorded for one image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    Pass,
    Fail,
    Invalid,
}

impl ReviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewStatus::Pass => "pass",
            ReviewStatus::Fail => "fail",
            ReviewStatus::Invalid => "invalid",
        }
    }

    /// Parse a stored status string. `None` for values this version does not know.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "pass" => Some(ReviewStatus::Pass),
            "fail" => Some(ReviewStatus::Fail),
            "invalid" => Some(ReviewStatus::Invalid),
            _ => None,
        }
    }
}

impl std::fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decisions keyed by file name.
///
/// Entries are kept as written, so values this version cannot interpret
/// (hand edits, statuses from newer versions) survive a load and save.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReviewResults {
    by_filename: BTreeMap<String, serde_json::Value>,
}

impl ReviewResults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `status` for `filename`, replacing any earlier decision.
    pub fn set(&mut self, filename: impl Into<String>, status: ReviewStatus) {
        self.by_filename
            .insert(filename.into(), serde_json::Value::from(status.as_str()));
    }

    /// Forget the decision for `filename`. Returns the removed status.
    pub fn clear(&mut self, filename: &str) -> Option<ReviewStatus> {
        self.by_filename
            .remove(filename)
            .and_then(|value| value.as_str().and_then(ReviewStatus::from_name))
    }

    /// Decision for `filename`, if it holds a known status.
    pub fn get(&self, filename: &str) -> Option<ReviewStatus> {
        self.raw(filename)
            .and_then(serde_json::Value::as_str)
            .and_then(ReviewStatus::from_name)
    }

    /// The stored value for `filename`, known or not.
    pub fn raw(&self, filename: &str) -> Option<&serde_json::Value> {
        self.by_filename.get(filename)
    }

    /// Number of entries, including ones with unknown values.
    pub fn len(&self) -> usize {
        self.by_filename.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_filename.is_empty()
    }

    /// Entries holding a known status.
    pub fn iter(&self) -> impl Iterator<Item = (&str, ReviewStatus)> {
        self.by_filename.iter().filter_map(|(name, value)| {
            let status = value.as_str().and_then(ReviewStatus::from_name)?;
            Some((name.as_str(), status))
        })
    }
}

/// Persistence for [`ReviewResults`].
pub trait ResultsStore {
    /// Load saved decisions. Missing or unreadable data yields an empty map.
    fn load(&self) -> ReviewResults;

    /// Replace the saved decisions with `results`.
    fn save(&self, results: &ReviewResults) -> Result<(), OverviewError>;
}

/// [`ResultsStore`] backed by `review_results.json` in a folder.
#[derive(Debug, Clone)]
pub struct JsonResultsStore {
    path: PathBuf,
}

impl JsonResultsStore {
    /// Store for the results file of `folder`.
    pub fn for_folder(folder: &Path) -> Self {
        Self {
            path: folder.join(RESULTS_FILENAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ResultsStore for JsonResultsStore {
    fn load(&self) -> ReviewResults {
        let json = match std::fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("No results file at {:?}", self.path);
                return ReviewResults::new();
            }
            Err(e) => {
                log::warn!("Failed to read results file {:?}: {}", self.path, e);
                return ReviewResults::new();
            }
        };

        match serde_json::from_str::<ReviewResults>(&json) {
            Ok(results) => {
                let unknown = results.len() - results.iter().count();
                if unknown > 0 {
                    log::warn!(
                        "Results file {:?} has {} entries with unknown status, keeping them as-is",
                        self.path,
                        unknown
                    );
                }
                results
            }
            Err(e) => {
                log::warn!("Failed to parse results file {:?}: {}", self.path, e);
                ReviewResults::new()
            }
        }
    }

    fn save(&self, results: &ReviewResults) -> Result<(), OverviewError> {
        let json = serde_json::to_string_pretty(results)?;
        std::fs::write(&self.path, json)?;
        log::debug!("Saved {} review results to {:?}", results.len(), self.path);
        Ok(())
    }
}

/// Review progress over the files currently listed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReviewStats {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub invalid: usize,
    /// Files whose stored value is not a known status.
    pub unrecognized: usize,
    pub unreviewed: usize,
}

impl ReviewStats {
    /// Count decisions for `files`. Results for files not listed are ignored.
    pub fn compute(files: &[FileRef], results: &ReviewResults) -> Self {
        let mut stats = Self {
            total: files.len(),
            ..Self::default()
        };
        for file in files {
            match (results.get(file.name()), results.raw(file.name())) {
                (Some(ReviewStatus::Pass), _) => stats.passed += 1,
                (Some(ReviewStatus::Fail), _) => stats.failed += 1,
                (Some(ReviewStatus::Invalid), _) => stats.invalid += 1,
                (None, Some(_)) => stats.unrecognized += 1,
                (None, None) => stats.unreviewed += 1,
            }
        }
        stats
    }

    pub fn reviewed(&self) -> usize {
        self.total - self.unreviewed
    }
}
