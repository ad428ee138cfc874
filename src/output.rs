//! Output formatting and persistence for grade reports.
//!
//! Supports terminal tables, pretty-printing, JSON serialization, and CSV export.

use anyhow::{Context, Result};
use comfy_table::{Cell, CellAlignment, ContentArrangement, Table, presets::UTF8_FULL};
use csv::Writer;
use serde::Serialize;
use std::path::Path;
use tracing::debug;

use crate::analyzers::types::{GradeReport, SummaryRecord};
use crate::parser::Roster;

/// Column headings shared by the terminal tables and the PDF export.
pub fn summary_headers(with_group: bool) -> Vec<&'static str> {
    let mut headers = vec![
        "N",
        "Pass",
        "Fail",
        "Passing Rate (%)",
        "Merit Rate (%)",
        "Distinction Rate (%)",
        "Mean",
        "SD",
        "Max",
        "Min",
    ];
    if with_group {
        headers.insert(0, "Group");
    }
    headers
}

/// Display strings for one record: rates to one decimal, mean and SD to two.
pub fn summary_cells(record: &SummaryRecord, with_group: bool) -> Vec<String> {
    let mut cells = vec![
        record.count.to_string(),
        record.pass_count.to_string(),
        record.fail_count.to_string(),
        format!("{:.1}", record.passing_rate),
        format!("{:.1}", record.merit_rate),
        format!("{:.1}", record.distinction_rate),
        format!("{:.2}", record.mean),
        format!("{:.2}", record.std_dev),
        format_bound(record.max),
        format_bound(record.min),
    ];
    if with_group {
        cells.insert(0, record.group.clone().unwrap_or_else(|| "Overall".into()));
    }
    cells
}

fn format_bound(value: Option<f64>) -> String {
    match value {
        Some(v) if v.fract() == 0.0 => format!("{v:.0}"),
        Some(v) => format!("{v}"),
        None => "-".to_string(),
    }
}

/// Builds a terminal table for a set of summary records.
pub fn summary_table(records: &[SummaryRecord], with_group: bool) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(summary_headers(with_group));

    for record in records {
        let cells = summary_cells(record, with_group);
        let first_numeric = usize::from(with_group);
        table.add_row(cells.into_iter().enumerate().map(|(i, text)| {
            let align = if i >= first_numeric {
                CellAlignment::Right
            } else {
                CellAlignment::Left
            };
            Cell::new(text).set_alignment(align)
        }));
    }

    table
}

/// Prints the overall and group summary tables to stdout.
pub fn print_report(report: &GradeReport) {
    let t = &report.thresholds;
    println!(
        "Grade column: {}  Group column: {}  (passing {}, merit {}, distinction {})",
        report.grade_column, report.group_column, t.passing, t.merit, t.distinction
    );

    println!("\nOverall Summary");
    println!("{}", summary_table(std::slice::from_ref(&report.overall), false));

    println!("\nGroup Summary");
    println!("{}", summary_table(&report.groups, true));

    if report.excluded_rows > 0 {
        println!(
            "\n{} row(s) excluded for a non-numeric grade",
            report.excluded_rows
        );
    }
}

/// Logs the report using Rust's debug pretty-print format.
pub fn print_pretty(report: &GradeReport) {
    debug!("{:#?}", report);
}

/// Prints the report as pretty-printed JSON.
pub fn print_json(report: &GradeReport) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}

/// One CSV line per summary record.
#[derive(Debug, Serialize)]
struct SummaryCsvRow<'a> {
    group: &'a str,
    count: usize,
    pass_count: usize,
    fail_count: usize,
    passing_rate: f64,
    merit_rate: f64,
    distinction_rate: f64,
    mean: f64,
    std_dev: f64,
    max: Option<f64>,
    min: Option<f64>,
}

impl<'a> From<&'a SummaryRecord> for SummaryCsvRow<'a> {
    fn from(r: &'a SummaryRecord) -> Self {
        Self {
            group: r.group.as_deref().unwrap_or("Overall"),
            count: r.count,
            pass_count: r.pass_count,
            fail_count: r.fail_count,
            passing_rate: r.passing_rate,
            merit_rate: r.merit_rate,
            distinction_rate: r.distinction_rate,
            mean: r.mean,
            std_dev: r.std_dev,
            max: r.max,
            min: r.min,
        }
    }
}

/// Writes the overall record followed by every group record to a CSV file,
/// replacing any existing file.
pub fn write_csv(path: &Path, report: &GradeReport) -> Result<()> {
    debug!(path = %path.display(), "Writing CSV summary");

    let mut writer = Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;

    writer.serialize(SummaryCsvRow::from(&report.overall))?;
    for group in &report.groups {
        writer.serialize(SummaryCsvRow::from(group))?;
    }
    writer.flush()?;

    Ok(())
}

/// Prints the roster's columns and the detected grade/group columns.
pub fn print_columns(roster: &Roster) {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["#", "Column", "Detected as"]);

    let grade = roster.guess_grade_column();
    let group = roster.guess_group_column();

    for (i, column) in roster.columns.iter().enumerate() {
        let role = if Some(column.as_str()) == grade {
            "grade"
        } else if Some(column.as_str()) == group {
            "group"
        } else {
            ""
        };
        table.add_row(vec![(i + 1).to_string(), column.clone(), role.to_string()]);
    }

    println!("{table}");
    println!("\n{} row(s)", roster.rows.len());
}
