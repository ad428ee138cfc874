//! Multi-page PDF export: a cover page followed by grid tables for the
//! overall and per-group summaries.

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use printpdf::{
    BuiltinFont, Color, Greyscale, IndirectFontRef, Line, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerReference, Point,
};
use std::path::Path;
use tracing::debug;

use crate::analyzers::types::{GradeReport, Thresholds};
use crate::output::{summary_cells, summary_headers};

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 14.0;
const TABLE_TOP: f32 = PAGE_HEIGHT - 34.0;
const BOTTOM_MARGIN: f32 = 15.0;
const ROW_HEIGHT: f32 = 7.0;
const CELL_PADDING: f32 = 1.5;
const TABLE_FONT_SIZE: f32 = 9.0;
const MAX_LABEL_CHARS: usize = 28;

/// Cover page details for the exported document.
#[derive(Debug, Clone)]
pub struct DocumentOptions {
    pub title: String,
    pub author: Option<String>,
    pub date: NaiveDate,
}

impl Default for DocumentOptions {
    fn default() -> Self {
        Self {
            title: "Grade Report".to_string(),
            author: None,
            date: Local::now().date_naive(),
        }
    }
}

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

/// Number of body rows that fit under the header row on one table page.
pub fn rows_per_page() -> usize {
    // one row is taken by the header
    (((TABLE_TOP - BOTTOM_MARGIN) / ROW_HEIGHT).floor() as usize).saturating_sub(1)
}

/// Pages needed for a table with `rows` body rows. An empty table still
/// gets one page for its header.
pub fn table_pages(rows: usize) -> usize {
    rows.div_ceil(rows_per_page()).max(1)
}

/// Lays out the report and returns the encoded PDF.
pub fn render_pdf(report: &GradeReport, options: &DocumentOptions) -> Result<Vec<u8>> {
    let (doc, page, layer) = PdfDocument::new(
        options.title.as_str(),
        Mm(PAGE_WIDTH),
        Mm(PAGE_HEIGHT),
        "Cover",
    );
    let fonts = Fonts {
        regular: doc.add_builtin_font(BuiltinFont::TimesRoman)?,
        bold: doc.add_builtin_font(BuiltinFont::TimesBold)?,
    };

    let cover = doc.get_page(page).get_layer(layer);
    draw_cover(&cover, &fonts, report, options);

    let overall_rows = vec![summary_cells(&report.overall, false)];
    let mut pages = 1 + draw_table(
        &doc,
        &fonts,
        "Overall Summary",
        &threshold_line(&report.thresholds),
        &summary_headers(false),
        &overall_rows,
    );

    let group_rows: Vec<Vec<String>> = report
        .groups
        .iter()
        .map(|g| summary_cells(g, true))
        .collect();
    pages += draw_table(
        &doc,
        &fonts,
        "Group Summary",
        &threshold_line(&report.thresholds),
        &summary_headers(true),
        &group_rows,
    );

    debug!(pages, groups = report.groups.len(), "PDF laid out");
    Ok(doc.save_to_bytes()?)
}

/// Renders the report and writes it to `path`.
pub fn write_pdf(path: &Path, report: &GradeReport, options: &DocumentOptions) -> Result<()> {
    let bytes = render_pdf(report, options)?;
    std::fs::write(path, &bytes).with_context(|| format!("Failed to write {}", path.display()))?;
    debug!(path = %path.display(), bytes = bytes.len(), "PDF written");
    Ok(())
}

fn threshold_line(t: &Thresholds) -> String {
    format!(
        "Passing >= {}   Merit >= {}   Distinction >= {}",
        t.passing, t.merit, t.distinction
    )
}

/// Cover page lines as `(text, font size, gap below in mm)`. Everything on
/// the cover is set in Times Roman.
fn cover_lines(report: &GradeReport, options: &DocumentOptions) -> Vec<(String, f32, f32)> {
    let mut lines = vec![(options.title.clone(), 14.0, 10.0)];
    if let Some(author) = &options.author {
        lines.push((format!("Prepared by: {author}"), 11.0, 7.0));
    }
    lines.push((format!("Date: {}", options.date.format("%d %B %Y")), 11.0, 14.0));

    let details = [
        format!("Grade column: {}", report.grade_column),
        format!("Group column: {}", report.group_column),
        format!("Students graded: {}", report.overall.count),
        format!("Groups: {}", report.groups.len()),
        format!("Rows excluded (non-numeric grade): {}", report.excluded_rows),
    ];
    lines.extend(details.into_iter().map(|line| (line, 11.0, 7.0)));
    lines
}

fn draw_cover(
    layer: &PdfLayerReference,
    fonts: &Fonts,
    report: &GradeReport,
    options: &DocumentOptions,
) {
    let mut y = PAGE_HEIGHT - 20.0;
    for (text, size, gap) in cover_lines(report, options) {
        layer.use_text(text, size, Mm(MARGIN), Mm(y), &fonts.regular);
        y -= gap;
    }
}

fn truncate_label(text: &str) -> String {
    if text.chars().count() <= MAX_LABEL_CHARS {
        text.to_string()
    } else {
        let mut cut: String = text.chars().take(MAX_LABEL_CHARS - 3).collect();
        cut.push_str("...");
        cut
    }
}

/// Built-in fonts carry no metrics here, so widths are estimated at half an
/// em per character.
fn text_width_mm(text: &str, font_size: f32) -> f32 {
    text.chars().count() as f32 * font_size * 0.5 * 0.3528
}

/// Draws a grid table on as many new pages as needed and returns the page count.
fn draw_table(
    doc: &PdfDocumentReference,
    fonts: &Fonts,
    heading: &str,
    subheading: &str,
    headers: &[&str],
    rows: &[Vec<String>],
) -> usize {
    let rows: Vec<Vec<String>> = rows
        .iter()
        .map(|r| r.iter().map(|c| truncate_label(c)).collect())
        .collect();

    let mut widths: Vec<f32> = headers
        .iter()
        .map(|h| text_width_mm(h, TABLE_FONT_SIZE))
        .collect();
    for row in &rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = w.max(text_width_mm(cell, TABLE_FONT_SIZE));
        }
    }
    for w in &mut widths {
        *w += 2.0 * CELL_PADDING;
    }

    let available = PAGE_WIDTH - 2.0 * MARGIN;
    let natural: f32 = widths.iter().sum();
    let scale = if natural > available { available / natural } else { 1.0 };
    let font_size = TABLE_FONT_SIZE * scale;
    for w in &mut widths {
        *w *= scale;
    }

    let per_page = rows_per_page();
    let pages = table_pages(rows.len());
    let chunks: Vec<&[Vec<String>]> = if rows.is_empty() {
        vec![rows.as_slice()]
    } else {
        rows.chunks(per_page).collect()
    };

    for (index, chunk) in chunks.iter().enumerate() {
        let (page, layer) = doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), heading);
        let layer = doc.get_page(page).get_layer(layer);

        let title = if pages > 1 {
            format!("{heading} ({}/{pages})", index + 1)
        } else {
            heading.to_string()
        };
        layer.use_text(title, 14.0, Mm(MARGIN), Mm(PAGE_HEIGHT - 20.0), &fonts.bold);
        layer.use_text(subheading, 10.0, Mm(MARGIN), Mm(PAGE_HEIGHT - 27.0), &fonts.regular);

        let cells: Vec<&[String]> = chunk.iter().map(Vec::as_slice).collect();
        draw_grid(&layer, fonts, &widths, font_size, headers, &cells);
    }

    pages
}

fn draw_grid(
    layer: &PdfLayerReference,
    fonts: &Fonts,
    widths: &[f32],
    font_size: f32,
    headers: &[&str],
    rows: &[&[String]],
) {
    layer.set_outline_color(Color::Greyscale(Greyscale::new(0.35, None)));
    layer.set_outline_thickness(0.5);

    let total_width: f32 = widths.iter().sum();
    let line_count = rows.len() + 1;

    let mut x = MARGIN;
    for (header, width) in headers.iter().zip(widths) {
        let baseline = TABLE_TOP - ROW_HEIGHT + 2.2;
        layer.use_text(*header, font_size, Mm(x + CELL_PADDING), Mm(baseline), &fonts.bold);
        x += width;
    }

    for (r, row) in rows.iter().enumerate() {
        let baseline = TABLE_TOP - ROW_HEIGHT * (r as f32 + 2.0) + 2.2;
        let mut x = MARGIN;
        for (cell, width) in row.iter().zip(widths) {
            layer.use_text(cell.as_str(), font_size, Mm(x + CELL_PADDING), Mm(baseline), &fonts.regular);
            x += width;
        }
    }

    for i in 0..=line_count {
        let y = TABLE_TOP - ROW_HEIGHT * i as f32;
        layer.add_line(segment((MARGIN, y), (MARGIN + total_width, y)));
    }

    let bottom = TABLE_TOP - ROW_HEIGHT * line_count as f32;
    let mut x = MARGIN;
    layer.add_line(segment((x, TABLE_TOP), (x, bottom)));
    for width in widths {
        x += width;
        layer.add_line(segment((x, TABLE_TOP), (x, bottom)));
    }
}

fn segment(from: (f32, f32), to: (f32, f32)) -> Line {
    Line {
        points: vec![
            (Point::new(Mm(from.0), Mm(from.1)), false),
            (Point::new(Mm(to.0), Mm(to.1)), false),
        ],
        is_closed: false,
    }
}
