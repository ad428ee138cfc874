//! Report settings loaded from an optional JSON file.

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::analyzers::types::Thresholds;
use crate::chart::MAX_BINS;

/// Default number of histogram buckets.
pub const DEFAULT_BINS: usize = 10;

/// Report settings stored as a plain JSON object on disk; every field is
/// optional:
/// ```json
/// {
///   "passing": 50,
///   "merit": 60,
///   "distinction": 75,
///   "title": "Mid-Term Grades",
///   "author": "Course Office",
///   "grade_column": "Final Score",
///   "group_column": "Section"
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReportConfig {
    pub passing: Option<f64>,
    pub merit: Option<f64>,
    pub distinction: Option<f64>,
    pub title: Option<String>,
    pub author: Option<String>,
    pub grade_column: Option<String>,
    pub group_column: Option<String>,
    pub sheet: Option<String>,
    pub histogram_bins: Option<usize>,
}

impl ReportConfig {
    /// Loads the config from a JSON file at `path`.
    pub fn load(path: &str) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).with_context(|| format!("Failed to read config {path}"))?;
        Self::from_json(&content).with_context(|| format!("Invalid config {path}"))
    }

    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Fills every field that `overrides` leaves unset from `self`.
    pub fn merged_with(self, overrides: ReportConfig) -> ReportConfig {
        ReportConfig {
            passing: overrides.passing.or(self.passing),
            merit: overrides.merit.or(self.merit),
            distinction: overrides.distinction.or(self.distinction),
            title: overrides.title.or(self.title),
            author: overrides.author.or(self.author),
            grade_column: overrides.grade_column.or(self.grade_column),
            group_column: overrides.group_column.or(self.group_column),
            sheet: overrides.sheet.or(self.sheet),
            histogram_bins: overrides.histogram_bins.or(self.histogram_bins),
        }
    }

    /// Thresholds with defaults for any value left unset.
    pub fn thresholds(&self) -> Thresholds {
        let defaults = Thresholds::default();
        Thresholds {
            passing: self.passing.unwrap_or(defaults.passing),
            merit: self.merit.unwrap_or(defaults.merit),
            distinction: self.distinction.unwrap_or(defaults.distinction),
        }
    }

    /// Histogram bucket count: unset or zero means [`DEFAULT_BINS`], and
    /// anything above [`MAX_BINS`] is clamped.
    pub fn bins(&self) -> usize {
        self.histogram_bins
            .filter(|b| *b > 0)
            .unwrap_or(DEFAULT_BINS)
            .min(MAX_BINS)
    }
}
