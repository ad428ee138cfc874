//! Data types used by the aggregation pipeline.

use serde::{Deserialize, Serialize};

/// Numeric cutoffs a grade must reach (inclusive) to count toward each rate.
///
/// No ordering between the three is enforced; see
/// [`Thresholds::ordering_warnings`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub passing: f64,
    pub merit: f64,
    pub distinction: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            passing: 40.0,
            merit: 55.0,
            distinction: 70.0,
        }
    }
}

impl Thresholds {
    /// Describes every pair of thresholds that is out of the usual
    /// passing <= merit <= distinction order. Values are left untouched.
    pub fn ordering_warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if self.merit < self.passing {
            warnings.push(format!(
                "merit threshold {} is below passing threshold {}",
                self.merit, self.passing
            ));
        }
        if self.distinction < self.merit {
            warnings.push(format!(
                "distinction threshold {} is below merit threshold {}",
                self.distinction, self.merit
            ));
        }
        if self.distinction < self.passing {
            warnings.push(format!(
                "distinction threshold {} is below passing threshold {}",
                self.distinction, self.passing
            ));
        }
        warnings
    }
}

/// A roster row reduced to its group label and numeric grade.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub group: String,
    pub grade: f64,
}

/// All usable samples of a roster plus the number of rows dropped for a
/// non-numeric grade.
#[derive(Debug, Clone, Default)]
pub struct Samples {
    pub grade_column: String,
    pub group_column: String,
    pub samples: Vec<Sample>,
    pub excluded: usize,
}

impl Samples {
    pub fn grades(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.grade).collect()
    }
}

/// Descriptive statistics for one scope: the whole roster (`group == None`)
/// or a single group. Rates are percentages in `0..=100`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRecord {
    pub group: Option<String>,
    pub count: usize,
    pub pass_count: usize,
    pub fail_count: usize,
    pub passing_rate: f64,
    pub merit_rate: f64,
    pub distinction_rate: f64,
    pub mean: f64,
    pub std_dev: f64,
    pub max: Option<f64>,
    pub min: Option<f64>,
}

/// Complete report: overall summary followed by one summary per group in
/// first-seen order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradeReport {
    pub grade_column: String,
    pub group_column: String,
    pub thresholds: Thresholds,
    pub excluded_rows: usize,
    pub overall: SummaryRecord,
    pub groups: Vec<SummaryRecord>,
}
