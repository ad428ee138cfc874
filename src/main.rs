//! CLI entry point for the grade report generator.
//!
//! Provides subcommands for inspecting a roster's columns and for producing
//! the overall/group summary report as tables, JSON, CSV, SVG charts and PDF.

use anyhow::{Result, anyhow, bail};
use clap::{Args, Parser, Subcommand};
use grade_report::{
    analyzers::{samples::extract_samples, types::GradeReport},
    chart::write_charts,
    config::ReportConfig,
    document::{DocumentOptions, write_pdf},
    fetch::load_source,
    output::{print_columns, print_json, print_pretty, print_report, write_csv},
    parser::Roster,
};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "grade_report")]
#[command(about = "Summarise a grade roster overall and per group", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the roster's columns and the detected grade/group columns
    Columns {
        /// Path to a CSV/XLSX/ODS file or URL to fetch
        #[arg(value_name = "FILE_OR_URL")]
        source: String,

        /// Sheet to read from a workbook (default: first sheet)
        #[arg(long)]
        sheet: Option<String>,
    },
    /// Compute overall and per-group statistics
    Report(ReportArgs),
}

#[derive(Args)]
struct ReportArgs {
    /// Path to a CSV/XLSX/ODS file or URL to fetch
    #[arg(value_name = "FILE_OR_URL")]
    source: String,

    /// Sheet to read from a workbook (default: first sheet)
    #[arg(long)]
    sheet: Option<String>,

    /// Column holding the numeric grade (default: auto-detect)
    #[arg(short = 'g', long)]
    grade_column: Option<String>,

    /// Column holding the group/section (default: auto-detect)
    #[arg(short = 'G', long)]
    group_column: Option<String>,

    /// Passing threshold (inclusive)
    #[arg(long)]
    passing: Option<f64>,

    /// Merit threshold (inclusive)
    #[arg(long)]
    merit: Option<f64>,

    /// Distinction threshold (inclusive)
    #[arg(long)]
    distinction: Option<f64>,

    /// Report title used on the PDF cover
    #[arg(short, long)]
    title: Option<String>,

    /// Author printed as "Prepared by" on the PDF cover
    #[arg(short, long)]
    author: Option<String>,

    /// JSON config file with thresholds, title and column choices
    #[arg(short, long)]
    config: Option<String>,

    /// Print the report as JSON instead of tables
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Write the summaries to a CSV file
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Write a PDF report
    #[arg(long)]
    pdf: Option<PathBuf>,

    /// Directory to write SVG charts into
    #[arg(long)]
    charts_dir: Option<PathBuf>,

    /// Number of histogram buckets
    #[arg(long)]
    bins: Option<usize>,
}

impl ReportArgs {
    fn overrides(&self) -> ReportConfig {
        ReportConfig {
            passing: self.passing,
            merit: self.merit,
            distinction: self.distinction,
            title: self.title.clone(),
            author: self.author.clone(),
            grade_column: self.grade_column.clone(),
            group_column: self.group_column.clone(),
            sheet: self.sheet.clone(),
            histogram_bins: self.bins,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/grade_report.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("grade_report.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();
    let token = std::env::var("ROSTER_TOKEN").ok();

    match cli.command {
        Commands::Columns { source, sheet } => {
            let roster = load_roster(&source, sheet.as_deref(), token.as_deref()).await?;
            print_columns(&roster);
        }
        Commands::Report(args) => {
            report(args, token.as_deref()).await?;
        }
    }

    Ok(())
}

/// Fetches or reads the roster and decodes it.
#[tracing::instrument(skip(token))]
async fn load_roster(source: &str, sheet: Option<&str>, token: Option<&str>) -> Result<Roster> {
    let bytes = load_source(source, token).await?;
    let roster = Roster::from_bytes(source, bytes, sheet)?;
    info!(
        columns = roster.columns.len(),
        rows = roster.rows.len(),
        "Roster loaded"
    );
    Ok(roster)
}

/// Builds the report and writes every requested output.
#[tracing::instrument(skip_all, fields(source = %args.source))]
async fn report(args: ReportArgs, token: Option<&str>) -> Result<()> {
    let file_config = match &args.config {
        Some(path) => ReportConfig::load(path)?,
        None => ReportConfig::default(),
    };
    let config = file_config.merged_with(args.overrides());

    let roster = load_roster(&args.source, config.sheet.as_deref(), token).await?;

    let grade_column = select_column(&roster, config.grade_column.as_deref(), "grade", |r| {
        r.guess_grade_column()
    })?;
    let group_column = select_column(&roster, config.group_column.as_deref(), "group", |r| {
        r.guess_group_column()
    })?;
    info!(%grade_column, %group_column, "Columns selected");

    let samples = extract_samples(&roster, &grade_column, &group_column)?;
    if samples.excluded > 0 {
        warn!(
            excluded = samples.excluded,
            "Rows with a non-numeric grade were excluded"
        );
    }
    if samples.samples.is_empty() {
        bail!("No numeric grades found in column '{grade_column}'");
    }

    let by_group = samples.grades_by_group();
    let report = GradeReport::from_buckets(&samples, &by_group, &config.thresholds());
    print_pretty(&report);

    if args.json {
        print_json(&report)?;
    } else {
        print_report(&report);
    }

    if let Some(path) = &args.csv {
        write_csv(path, &report)?;
        info!(path = %path.display(), "CSV summary written");
    }

    if let Some(dir) = &args.charts_dir {
        write_charts(
            dir,
            &samples.grades(),
            &by_group,
            config.bins(),
        )?;
        info!(dir = %dir.display(), "Charts written");
    }

    if let Some(path) = &args.pdf {
        let mut options = DocumentOptions {
            author: config.author.clone().filter(|a| !a.trim().is_empty()),
            ..Default::default()
        };
        if let Some(title) = config.title.clone().filter(|t| !t.trim().is_empty()) {
            options.title = title;
        }
        write_pdf(path, &report, &options)?;
        info!(path = %path.display(), "PDF report written");
    }

    Ok(())
}

/// Uses the explicitly chosen column, or falls back to the roster's guess.
fn select_column(
    roster: &Roster,
    chosen: Option<&str>,
    role: &str,
    guess: impl Fn(&Roster) -> Option<&str>,
) -> Result<String> {
    chosen
        .or_else(|| guess(roster))
        .map(str::to_string)
        .ok_or_else(|| {
            anyhow!(
                "No {role} column selected or detected; pass --{role}-column (available: {})",
                roster.columns.join(", ")
            )
        })
}
