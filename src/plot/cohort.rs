//! Cohort plot: one metric across cell types, grouped by treatment

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use plotters::coord::Shift;
use plotters::prelude::*;
use tracing::info;

use super::{padded_range, PlotOptions};
use crate::layout::WellRecord;
use crate::{Error, Result};

const SIZE: (u32, u32) = (1000, 640);

/// Share of a cell's x slot taken by its treatment boxes.
const SLOT_WIDTH: f64 = 0.8;

/// Metric values of all wells with the same cell type and treatment.
#[derive(Debug, Clone, PartialEq)]
pub struct CohortGroup {
    /// Cell type
    pub cell: String,
    /// Treatment label
    pub treatment: String,
    /// Finite metric values, in layout order
    pub values: Vec<f64>,
}

/// Five-number summary used for a box.
#[derive(Debug, Clone, Copy, PartialEq)]
struct BoxStats {
    low: f64,
    q1: f64,
    median: f64,
    q3: f64,
    high: f64,
}

impl CohortGroup {
    /// Group records by `(cell, treatment)`.
    ///
    /// Cells keep their first-appearance order. Treatments follow
    /// `options.treatment_order` when set (unlisted treatments go last,
    /// alphabetically), otherwise alphabetical order. Non-finite values are
    /// skipped.
    #[must_use]
    pub fn collect(records: &[WellRecord], options: &PlotOptions) -> Vec<Self> {
        let cells = cell_order(records);
        let treatments = treatment_order(records, options.treatment_order.as_deref());

        let mut groups = Vec::new();
        for cell in &cells {
            for treatment in &treatments {
                let values: Vec<f64> = records
                    .iter()
                    .filter(|r| r.cell() == cell.as_str() && r.treatment() == treatment.as_str())
                    .filter_map(|r| options.metric.value(r))
                    .filter(|v| v.is_finite())
                    .collect();
                if !values.is_empty() {
                    groups.push(Self {
                        cell: cell.clone(),
                        treatment: treatment.clone(),
                        values,
                    });
                }
            }
        }
        groups
    }

    fn stats(&self) -> Option<BoxStats> {
        let mut sorted = self.values.clone();
        sorted.sort_by(f64::total_cmp);
        let q1 = quantile(&sorted, 0.25)?;
        let median = quantile(&sorted, 0.5)?;
        let q3 = quantile(&sorted, 0.75)?;
        let reach = 1.5 * (q3 - q1);
        let low = sorted
            .iter()
            .copied()
            .find(|&v| v >= q1 - reach)
            .unwrap_or(q1);
        let high = sorted
            .iter()
            .rev()
            .copied()
            .find(|&v| v <= q3 + reach)
            .unwrap_or(q3);
        Some(BoxStats {
            low,
            q1,
            median,
            q3,
            high,
        })
    }
}

/// Render `<out_dir>/<stem>.png` and `<out_dir>/<stem>.svg`.
///
/// # Errors
///
/// Returns [`Error::Io`] if `out_dir` cannot be created and [`Error::Plot`]
/// if a chart cannot be drawn or written.
pub fn render_cohort_plot(
    records: &[WellRecord],
    options: &PlotOptions,
    out_dir: &Path,
    stem: &str,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(out_dir)?;
    let groups = CohortGroup::collect(records, options);

    let png = out_dir.join(format!("{stem}.png"));
    let svg = out_dir.join(format!("{stem}.svg"));
    {
        let root = BitMapBackend::new(&png, SIZE).into_drawing_area();
        draw_cohort_chart(&root, &groups, options)
            .map_err(|e| Error::Plot(format!("{}: {e}", png.display())))?;
    }
    {
        let root = SVGBackend::new(&svg, SIZE).into_drawing_area();
        draw_cohort_chart(&root, &groups, options)
            .map_err(|e| Error::Plot(format!("{}: {e}", svg.display())))?;
    }

    info!(
        metric = %options.metric,
        groups = groups.len(),
        png = %png.display(),
        "Wrote cohort plot"
    );
    Ok(vec![png, svg])
}

fn draw_cohort_chart<DB>(
    root: &DrawingArea<DB, Shift>,
    groups: &[CohortGroup],
    options: &PlotOptions,
) -> std::result::Result<(), Box<dyn std::error::Error>>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)?;

    let cells: Vec<&str> = {
        let mut seen: Vec<&str> = Vec::new();
        for g in groups {
            if !seen.contains(&g.cell.as_str()) {
                seen.push(&g.cell);
            }
        }
        seen
    };
    let treatments: Vec<&str> = {
        let mut seen: Vec<&str> = Vec::new();
        for g in groups {
            if !seen.contains(&g.treatment.as_str()) {
                seen.push(&g.treatment);
            }
        }
        seen
    };

    let (auto_min, auto_max) = padded_range(groups.iter().flat_map(|g| g.values.iter().copied()));
    let y_min = options.y_min.unwrap_or(auto_min);
    let y_max = options.y_max.unwrap_or(auto_max);
    let slots = cells.len().max(1);
    #[allow(clippy::cast_precision_loss)]
    let x_max = slots as f64 - 0.5;

    let mut chart = ChartBuilder::on(root)
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(80)
        .build_cartesian_2d(-0.5..x_max, y_min..y_max)?;

    let label_for = |x: &f64| {
        let slot = x.round();
        if (x - slot).abs() > 1e-6 || slot < 0.0 {
            return String::new();
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let index = slot as usize;
        cells.get(index).map_or_else(String::new, |c| (*c).to_string())
    };
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(slots)
        .x_label_formatter(&label_for)
        .x_desc("Cell")
        .y_desc(options.y_label())
        .draw()?;

    #[allow(clippy::cast_precision_loss)]
    let width = SLOT_WIDTH / treatments.len().max(1) as f64;
    for (t_index, treatment) in treatments.iter().enumerate() {
        #[allow(clippy::cast_precision_loss)]
        let hue = t_index as f64 / treatments.len() as f64;
        let color = HSLColor(hue, 0.6, 0.5);
        #[allow(clippy::cast_precision_loss)]
        let offset = (t_index as f64 + 0.5).mul_add(width, -SLOT_WIDTH / 2.0);

        let mut boxes = Vec::new();
        let mut lines = Vec::new();
        let mut points = Vec::new();
        for group in groups.iter().filter(|g| g.treatment == *treatment) {
            let Some(slot) = cells.iter().position(|c| *c == group.cell) else {
                continue;
            };
            #[allow(clippy::cast_precision_loss)]
            let center = slot as f64 + offset;
            let half = width * 0.4;
            if let Some(s) = group.stats() {
                boxes.push(Rectangle::new(
                    [(center - half, s.q1), (center + half, s.q3)],
                    color.mix(0.35).filled(),
                ));
                boxes.push(Rectangle::new(
                    [(center - half, s.q1), (center + half, s.q3)],
                    color.stroke_width(1),
                ));
                lines.push(PathElement::new(
                    vec![(center - half, s.median), (center + half, s.median)],
                    BLACK.stroke_width(2),
                ));
                lines.push(PathElement::new(
                    vec![(center, s.q3), (center, s.high)],
                    color.stroke_width(1),
                ));
                lines.push(PathElement::new(
                    vec![(center, s.q1), (center, s.low)],
                    color.stroke_width(1),
                ));
            }
            points.extend(
                group
                    .values
                    .iter()
                    .map(|&v| Circle::new((center, v), 4, color.filled())),
            );
        }

        chart
            .draw_series(boxes)?
            .label(*treatment)
            .legend(move |(x, y)| {
                Rectangle::new([(x, y - 5), (x + 12, y + 5)], color.filled())
            });
        chart.draw_series(lines)?;
        chart.draw_series(points)?;
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}

/// Linear-interpolated quantile of sorted values.
fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    let last = sorted.len().checked_sub(1)?;
    #[allow(clippy::cast_precision_loss)]
    let pos = q * last as f64;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let lower = pos.floor() as usize;
    let upper = (lower + 1).min(last);
    #[allow(clippy::cast_precision_loss)]
    let frac = pos - lower as f64;
    Some((sorted[upper] - sorted[lower]).mul_add(frac, sorted[lower]))
}

fn cell_order(records: &[WellRecord]) -> Vec<String> {
    let mut cells: Vec<String> = Vec::new();
    for record in records {
        if !cells.iter().any(|c| c == record.cell()) {
            cells.push(record.cell().to_string());
        }
    }
    cells
}

fn treatment_order(records: &[WellRecord], preferred: Option<&[String]>) -> Vec<String> {
    let present: BTreeSet<&str> = records.iter().map(WellRecord::treatment).collect();
    let mut order: Vec<String> = preferred
        .unwrap_or_default()
        .iter()
        .filter(|t| present.contains(t.as_str()))
        .cloned()
        .collect();
    for treatment in present {
        if !order.iter().any(|t| t == treatment) {
            order.push(treatment.to_string());
        }
    }
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plot::Metric;

    fn record(well: &str, cell: &str, treatment: &str, velocity: f64) -> WellRecord {
        let mut r = WellRecord::new(well, cell, treatment);
        r.set_velocity(velocity);
        r
    }

    fn records() -> Vec<WellRecord> {
        vec![
            record("A1", "MCF7", "Drug", 1.0),
            record("A2", "HeLa", "Control", 2.0),
            record("A3", "MCF7", "Control", 3.0),
            record("A4", "MCF7", "Drug", 5.0),
            record("A5", "HeLa", "Drug", f64::NAN),
        ]
    }

    #[test]
    fn test_collect_orders_cells_by_appearance() {
        let groups = CohortGroup::collect(&records(), &PlotOptions::default());
        let keys: Vec<(&str, &str)> = groups
            .iter()
            .map(|g| (g.cell.as_str(), g.treatment.as_str()))
            .collect();
        assert_eq!(
            keys,
            vec![("MCF7", "Control"), ("MCF7", "Drug"), ("HeLa", "Control")]
        );
        assert_eq!(groups[1].values, vec![1.0, 5.0]);
    }

    #[test]
    fn test_collect_honors_treatment_order() {
        let options = PlotOptions {
            treatment_order: Some(vec!["Drug".to_string(), "Missing".to_string()]),
            ..PlotOptions::default()
        };
        let groups = CohortGroup::collect(&records(), &options);
        assert_eq!(groups[0].treatment, "Drug");
        assert_eq!(groups[1].treatment, "Control");
    }

    #[test]
    fn test_collect_uses_metric() {
        let options = PlotOptions {
            metric: Metric::Slope,
            ..PlotOptions::default()
        };
        // no record has a fit
        assert!(CohortGroup::collect(&records(), &options).is_empty());
    }

    #[test]
    fn test_collect_skips_wells_without_results() {
        let mut records = records();
        records.push(WellRecord::new("A6", "HeLa", "Control"));
        let groups = CohortGroup::collect(&records, &PlotOptions::default());
        let hela_control = groups
            .iter()
            .find(|g| g.cell == "HeLa" && g.treatment == "Control")
            .unwrap();
        assert_eq!(hela_control.values, vec![2.0]);
    }

    #[test]
    fn test_quantile() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantile(&sorted, 0.5), Some(2.5));
        assert_eq!(quantile(&sorted, 0.0), Some(1.0));
        assert_eq!(quantile(&sorted, 1.0), Some(4.0));
        assert_eq!(quantile(&[], 0.5), None);
    }

    #[test]
    fn test_box_stats_whiskers_exclude_outliers() {
        let group = CohortGroup {
            cell: "HeLa".to_string(),
            treatment: "Control".to_string(),
            values: vec![1.0, 2.0, 3.0, 4.0, 100.0],
        };
        let stats = group.stats().unwrap();
        assert_eq!(stats.median, 3.0);
        assert_eq!(stats.low, 1.0);
        assert_eq!(stats.high, 4.0);
    }

    #[test]
    fn test_render_cohort_plot_writes_png_and_svg() {
        let dir = std::env::temp_dir().join("scratch_assay_cohort_plot_test");
        let files = render_cohort_plot(&records(), &PlotOptions::default(), &dir, "Velocity_test")
            .unwrap();
        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|f| f.exists()));
        assert!(files[1].extension().is_some_and(|e| e == "svg"));
    }
}
