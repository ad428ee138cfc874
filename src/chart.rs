//! SVG charts: grade distribution histogram and per-group box plot.

use anyhow::{Context, Result, bail};
use plotters::prelude::*;
use std::path::Path;
use tracing::debug;

const CHART_SIZE: (u32, u32) = (900, 540);

/// Upper bound on histogram buckets; larger requests are clamped.
pub const MAX_BINS: usize = 100;

/// One histogram bucket covering `[lower, upper)`; the last bucket is closed.
#[derive(Debug, Clone, PartialEq)]
pub struct Bin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

/// Splits `values` into `bins` equal-width buckets spanning `[min, max]`.
///
/// All values identical (or a single value) produce one bucket. `bins` is
/// clamped to [`MAX_BINS`].
pub fn histogram_bins(values: &[f64], bins: usize) -> Vec<Bin> {
    if values.is_empty() || bins == 0 {
        return Vec::new();
    }
    let bins = bins.min(MAX_BINS);

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    if max == min {
        return vec![Bin {
            lower: min,
            upper: max,
            count: values.len(),
        }];
    }

    let width = (max - min) / bins as f64;
    let mut out: Vec<Bin> = (0..bins)
        .map(|i| Bin {
            lower: min + width * i as f64,
            upper: if i + 1 == bins { max } else { min + width * (i + 1) as f64 },
            count: 0,
        })
        .collect();

    for v in values {
        let idx = (((v - min) / width).floor() as usize).min(bins - 1);
        out[idx].count += 1;
    }

    out
}

/// Renders the grade distribution as an SVG document.
pub fn histogram_svg(values: &[f64], bins: usize) -> Result<String> {
    let bins = histogram_bins(values, bins);
    if bins.is_empty() {
        bail!("No grades to plot");
    }

    let max_count = bins.iter().map(|b| b.count).max().unwrap_or(0) as u32;
    let labels: Vec<String> = bins
        .iter()
        .map(|b| format!("{:.0}-{:.0}", b.lower, b.upper))
        .collect();
    let label_of = |v: &SegmentValue<u32>| match v {
        SegmentValue::Exact(i) | SegmentValue::CenterOf(i) => {
            labels.get(*i as usize).cloned().unwrap_or_default()
        }
        SegmentValue::Last => String::new(),
    };

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, CHART_SIZE).into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .caption("Grade Distribution", ("sans-serif", 28))
            .margin(12)
            .x_label_area_size(40)
            .y_label_area_size(50)
            .build_cartesian_2d(
                (0u32..bins.len() as u32).into_segmented(),
                0u32..max_count + 1,
            )?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_desc("Grade")
            .y_desc("Students")
            .x_label_formatter(&label_of)
            .draw()?;

        chart.draw_series(
            Histogram::vertical(&chart)
                .style(BLUE.mix(0.6).filled())
                .margin(2)
                .data(
                    bins.iter()
                        .enumerate()
                        .map(|(i, b)| (i as u32, b.count as u32)),
                ),
        )?;

        root.present()?;
    }

    Ok(svg)
}

/// Renders one box (quartiles with Tukey whiskers) per group as an SVG document.
/// Groups without grades are skipped.
pub fn boxplot_svg(groups: &[(String, Vec<f64>)]) -> Result<String> {
    let boxes: Vec<(&str, Quartiles)> = groups
        .iter()
        .filter(|(_, grades)| !grades.is_empty())
        .map(|(name, grades)| (name.as_str(), Quartiles::new(grades.as_slice())))
        .collect();
    if boxes.is_empty() {
        bail!("No grades to plot");
    }

    let (lo, hi) = boxes
        .iter()
        .flat_map(|(_, q)| q.values())
        .fold((f32::MAX, f32::MIN), |(lo, hi), v| (lo.min(v), hi.max(v)));
    let pad = ((hi - lo) * 0.1).max(1.0);

    let names: Vec<&str> = boxes.iter().map(|(name, _)| *name).collect();
    let label_of = |v: &SegmentValue<i32>| match v {
        SegmentValue::Exact(i) | SegmentValue::CenterOf(i) => usize::try_from(*i)
            .ok()
            .and_then(|i| names.get(i))
            .map(|s| s.to_string())
            .unwrap_or_default(),
        SegmentValue::Last => String::new(),
    };

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, CHART_SIZE).into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .caption("Grades by Group", ("sans-serif", 28))
            .margin(12)
            .x_label_area_size(40)
            .y_label_area_size(50)
            .build_cartesian_2d(
                (0i32..boxes.len() as i32).into_segmented(),
                (lo - pad)..(hi + pad),
            )?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_desc("Group")
            .y_desc("Grade")
            .x_label_formatter(&label_of)
            .draw()?;

        chart.draw_series(boxes.iter().enumerate().map(|(i, (_, quartiles))| {
            Boxplot::new_vertical(SegmentValue::CenterOf(i as i32), quartiles)
                .width(24)
                .whisker_width(0.5)
                .style(BLUE)
        }))?;

        root.present()?;
    }

    Ok(svg)
}

/// Writes `grade_distribution.svg` and `grades_by_group.svg` into `dir`.
pub fn write_charts(
    dir: &Path,
    grades: &[f64],
    by_group: &[(String, Vec<f64>)],
    bins: usize,
) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create chart directory {}", dir.display()))?;

    let histogram = dir.join("grade_distribution.svg");
    std::fs::write(&histogram, histogram_svg(grades, bins)?)
        .with_context(|| format!("Failed to write {}", histogram.display()))?;
    debug!(path = %histogram.display(), "Histogram written");

    let boxplot = dir.join("grades_by_group.svg");
    std::fs::write(&boxplot, boxplot_svg(by_group)?)
        .with_context(|| format!("Failed to write {}", boxplot.display()))?;
    debug!(path = %boxplot.display(), "Box plot written");

    Ok(())
}
