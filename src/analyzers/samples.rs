use crate::analyzers::grade::{group_label, parse_grade};
use crate::analyzers::types::{Sample, Samples};
use crate::parser::Roster;
use anyhow::{Result, bail};
use tracing::debug;

/// Pulls `(group, grade)` pairs out of a roster.
///
/// Rows whose grade cell is missing or non-numeric are counted in
/// [`Samples::excluded`] and left out; they are never treated as zero.
pub fn extract_samples(roster: &Roster, grade_column: &str, group_column: &str) -> Result<Samples> {
    for column in [grade_column, group_column] {
        if !roster.has_column(column) {
            bail!(
                "Column '{}' not found; available columns: {}",
                column,
                roster.columns.join(", ")
            );
        }
    }

    let mut samples = Vec::with_capacity(roster.rows.len());
    let mut excluded = 0;

    for row in &roster.rows {
        match row.get(grade_column).and_then(parse_grade) {
            Some(grade) => samples.push(Sample {
                group: group_label(row.get(group_column)),
                grade,
            }),
            None => excluded += 1,
        }
    }

    debug!(kept = samples.len(), excluded, "Samples extracted");

    Ok(Samples {
        grade_column: grade_column.to_string(),
        group_column: group_column.to_string(),
        samples,
        excluded,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::grade::MISSING_GROUP;

    fn roster() -> Roster {
        let csv = "Name,Group,Grade\nAda,A,91\nBo,,58%\nCy,B,absent\nDi,B,\n";
        Roster::from_csv_reader(csv.as_bytes()).unwrap()
    }

    #[test]
    fn test_extract_excludes_non_numeric() {
        let samples = extract_samples(&roster(), "Grade", "Group").unwrap();
        assert_eq!(samples.samples.len(), 2);
        assert_eq!(samples.excluded, 2);
        assert_eq!(samples.grades(), vec![91.0, 58.0]);
    }

    #[test]
    fn test_extract_missing_group_uses_sentinel() {
        let samples = extract_samples(&roster(), "Grade", "Group").unwrap();
        assert_eq!(samples.samples[1].group, MISSING_GROUP);
    }

    #[test]
    fn test_extract_unknown_column() {
        let err = extract_samples(&roster(), "Mark", "Group").unwrap_err();
        assert!(err.to_string().contains("Mark"));
        assert!(err.to_string().contains("Name, Group, Grade"));
    }
}
