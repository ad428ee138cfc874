use grade_report::analyzers::grade::MISSING_GROUP;
use grade_report::analyzers::samples::extract_samples;
use grade_report::analyzers::types::{GradeReport, Thresholds};
use grade_report::document::{DocumentOptions, render_pdf};
use grade_report::parser::Roster;

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn test_full_pipeline_csv() {
    let bytes = include_bytes!("fixtures/roster.csv").to_vec();
    let roster = Roster::from_bytes("roster.csv", bytes, None).expect("Failed to parse roster");

    let grade_col = roster.guess_grade_column().unwrap().to_string();
    let group_col = roster.guess_group_column().unwrap().to_string();
    assert_eq!(grade_col, "Grade");
    assert_eq!(group_col, "Group");

    let samples = extract_samples(&roster, &grade_col, &group_col).unwrap();
    assert_eq!(samples.excluded, 1);

    let report = GradeReport::build(&samples, &Thresholds::default());
    let overall = &report.overall;

    assert_eq!(overall.count, 7);
    assert_eq!(overall.pass_count, 6);
    assert_eq!(overall.fail_count, 1);
    assert!(close(overall.mean, 449.5 / 7.0));
    assert!(close(overall.merit_rate, 500.0 / 7.0));
    assert!(close(overall.distinction_rate, 300.0 / 7.0));
    assert_eq!(overall.max, Some(91.0));
    assert_eq!(overall.min, Some(39.0));

    let names: Vec<_> = report.groups.iter().map(|g| g.group.as_deref().unwrap()).collect();
    assert_eq!(names, vec!["A", "B", "C"]);
    assert!(!names.contains(&MISSING_GROUP));

    let b = &report.groups[1];
    assert_eq!(b.count, 2);
    assert_eq!(b.passing_rate, 50.0);
    assert_eq!(b.mean, 55.5);
    assert_eq!(b.std_dev, 16.5);

    let pdf = render_pdf(&report, &DocumentOptions::default()).unwrap();
    assert!(pdf.starts_with(b"%PDF"));
}

#[test]
fn test_full_pipeline_workbook() {
    let bytes = include_bytes!("fixtures/roster.xlsx").to_vec();
    let roster = Roster::from_bytes("roster.xlsx", bytes, None).expect("Failed to parse workbook");

    assert_eq!(roster.guess_grade_column(), Some("Final Score"));
    assert_eq!(roster.guess_group_column(), Some("Section"));

    let samples = extract_samples(&roster, "Final Score", "Section").unwrap();
    assert_eq!(samples.samples.len(), 5);
    assert_eq!(samples.excluded, 1);

    let report = GradeReport::build(&samples, &Thresholds::default());
    assert_eq!(report.overall.count, 5);
    assert_eq!(report.overall.pass_count, 4);
    assert_eq!(report.groups.len(), 3);
    assert_eq!(report.groups[2].mean, 64.5);
}
