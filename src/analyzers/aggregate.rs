use crate::analyzers::types::{GradeReport, Samples, SummaryRecord, Thresholds};
use crate::analyzers::utility::{mean, pct, stddev};
use std::collections::HashMap;
use tracing::{debug, warn};

impl SummaryRecord {
    /// Summarises one scope's grades against the given thresholds.
    pub fn from_grades(group: Option<String>, grades: &[f64], thresholds: &Thresholds) -> Self {
        let count = grades.len();

        let mut pass_count = 0;
        let mut merit_count = 0;
        let mut distinction_count = 0;
        let mut max: Option<f64> = None;
        let mut min: Option<f64> = None;

        for &g in grades {
            if g >= thresholds.passing {
                pass_count += 1;
            }
            if g >= thresholds.merit {
                merit_count += 1;
            }
            if g >= thresholds.distinction {
                distinction_count += 1;
            }
            max = Some(max.map_or(g, |m| m.max(g)));
            min = Some(min.map_or(g, |m| m.min(g)));
        }

        let avg = mean(grades);

        SummaryRecord {
            group,
            count,
            pass_count,
            fail_count: count - pass_count,
            passing_rate: pct(pass_count, count),
            merit_rate: pct(merit_count, count),
            distinction_rate: pct(distinction_count, count),
            mean: avg,
            std_dev: stddev(grades, avg),
            max,
            min,
        }
    }
}

impl Samples {
    /// Grades bucketed per group in a single pass, groups in first-seen order.
    pub fn grades_by_group(&self) -> Vec<(String, Vec<f64>)> {
        let mut index: HashMap<&str, usize> = HashMap::new();
        let mut buckets: Vec<(String, Vec<f64>)> = Vec::new();

        for sample in &self.samples {
            let slot = *index.entry(sample.group.as_str()).or_insert_with(|| {
                buckets.push((sample.group.clone(), Vec::new()));
                buckets.len() - 1
            });
            buckets[slot].1.push(sample.grade);
        }

        buckets
    }
}

impl GradeReport {
    /// Builds the overall and per-group summaries from one bucketing pass
    /// over the samples. Groups keep the order in which they first appear.
    pub fn build(samples: &Samples, thresholds: &Thresholds) -> Self {
        Self::from_buckets(samples, &samples.grades_by_group(), thresholds)
    }

    /// Same as [`GradeReport::build`], reusing buckets already produced by
    /// [`Samples::grades_by_group`].
    pub fn from_buckets(
        samples: &Samples,
        by_group: &[(String, Vec<f64>)],
        thresholds: &Thresholds,
    ) -> Self {
        for warning in thresholds.ordering_warnings() {
            warn!(%warning, "Inconsistent thresholds");
        }

        let overall = SummaryRecord::from_grades(None, &samples.grades(), thresholds);
        let groups: Vec<SummaryRecord> = by_group
            .iter()
            .map(|(name, grades)| SummaryRecord::from_grades(Some(name.clone()), grades, thresholds))
            .collect();

        debug!(
            count = overall.count,
            groups = groups.len(),
            excluded = samples.excluded,
            "Report aggregated"
        );

        GradeReport {
            grade_column: samples.grade_column.clone(),
            group_column: samples.group_column.clone(),
            thresholds: *thresholds,
            excluded_rows: samples.excluded,
            overall,
            groups,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::types::Sample;

    fn samples(pairs: &[(&str, f64)]) -> Samples {
        Samples {
            grade_column: "Grade".into(),
            group_column: "Group".into(),
            samples: pairs
                .iter()
                .map(|(g, v)| Sample {
                    group: g.to_string(),
                    grade: *v,
                })
                .collect(),
            excluded: 0,
        }
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_from_grades_empty() {
        let s = SummaryRecord::from_grades(None, &[], &Thresholds::default());
        assert_eq!(s.count, 0);
        assert_eq!(s.passing_rate, 0.0);
        assert_eq!(s.mean, 0.0);
        assert_eq!(s.std_dev, 0.0);
        assert_eq!(s.max, None);
        assert_eq!(s.min, None);
    }

    #[test]
    fn test_from_grades_rates_are_inclusive() {
        let t = Thresholds {
            passing: 40.0,
            merit: 60.0,
            distinction: 80.0,
        };
        let s = SummaryRecord::from_grades(None, &[39.9, 40.0, 60.0, 80.0], &t);
        assert_eq!(s.pass_count, 3);
        assert_eq!(s.fail_count, 1);
        assert_eq!(s.passing_rate, 75.0);
        assert_eq!(s.merit_rate, 50.0);
        assert_eq!(s.distinction_rate, 25.0);
        assert_eq!(s.max, Some(80.0));
        assert_eq!(s.min, Some(39.9));
    }

    #[test]
    fn test_from_grades_population_sd() {
        let s = SummaryRecord::from_grades(None, &[50.0, 70.0], &Thresholds::default());
        assert_eq!(s.mean, 60.0);
        assert_eq!(s.std_dev, 10.0);
    }

    #[test]
    fn test_inverted_thresholds_are_not_corrected() {
        let t = Thresholds {
            passing: 70.0,
            merit: 50.0,
            distinction: 40.0,
        };
        let s = SummaryRecord::from_grades(None, &[45.0, 60.0, 90.0], &t);
        assert_eq!(s.pass_count, 1);
        assert!(close(s.merit_rate, 200.0 / 3.0));
        assert_eq!(s.distinction_rate, 100.0);
        assert_eq!(t.ordering_warnings().len(), 3);
    }

    #[test]
    fn test_default_thresholds_are_ordered() {
        assert!(Thresholds::default().ordering_warnings().is_empty());
    }

    #[test]
    fn test_build_groups_in_first_seen_order() {
        let s = samples(&[("B", 50.0), ("A", 80.0), ("B", 70.0), ("C", 30.0)]);
        let report = GradeReport::build(&s, &Thresholds::default());

        let names: Vec<_> = report.groups.iter().map(|g| g.group.clone().unwrap()).collect();
        assert_eq!(names, vec!["B", "A", "C"]);
        assert_eq!(report.overall.count, 4);
        assert_eq!(report.overall.group, None);
        assert_eq!(report.groups[0].count, 2);
        assert_eq!(report.groups[0].mean, 60.0);
        assert_eq!(report.groups[2].pass_count, 0);
    }

    #[test]
    fn test_build_carries_exclusions() {
        let mut s = samples(&[("A", 55.0)]);
        s.excluded = 3;
        let report = GradeReport::build(&s, &Thresholds::default());
        assert_eq!(report.excluded_rows, 3);
        assert_eq!(report.grade_column, "Grade");
    }

    #[test]
    fn test_grades_by_group() {
        let s = samples(&[("B", 50.0), ("A", 80.0), ("B", 70.0)]);
        assert_eq!(
            s.grades_by_group(),
            vec![
                ("B".to_string(), vec![50.0, 70.0]),
                ("A".to_string(), vec![80.0]),
            ]
        );
    }

    #[test]
    fn test_from_buckets_matches_build() {
        let pairs: Vec<(String, f64)> = (0..60)
            .map(|i| (format!("G{}", i % 7), (i * 13 % 100) as f64))
            .collect();
        let refs: Vec<(&str, f64)> = pairs.iter().map(|(g, v)| (g.as_str(), *v)).collect();
        let s = samples(&refs);

        let by_group = s.grades_by_group();
        let report = GradeReport::from_buckets(&s, &by_group, &Thresholds::default());
        assert_eq!(report, GradeReport::build(&s, &Thresholds::default()));
        assert_eq!(by_group.len(), report.groups.len());
        for ((name, grades), record) in by_group.iter().zip(&report.groups) {
            assert_eq!(record.group.as_deref(), Some(name.as_str()));
            assert_eq!(record.count, grades.len());
        }
    }
}
