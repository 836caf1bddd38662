//! Per-well plot: samples, fitted line, estimated closure point

use std::path::Path;

use plotters::coord::Shift;
use plotters::prelude::*;

use super::padded_range;
use crate::fit::{fitted_line, FitRegion};
use crate::imaging::FrameGeometry;
use crate::layout::WellRecord;
use crate::series::TimeSeries;
use crate::{Error, Result};

const SIZE: (u32, u32) = (900, 600);

struct WellChart {
    title: String,
    samples: Vec<(f64, f64)>,
    fit_line: Vec<(f64, f64)>,
    closure_point: Option<(f64, f64)>,
    slope: f64,
}

/// Render `<path>` (PNG) for one analyzed well.
///
/// The closure point is drawn at `(closure_time * 60, frame_area)` when the
/// record has a defined closure time.
///
/// # Errors
///
/// Returns [`Error::Plot`] if the record has no fit or the chart cannot be
/// drawn or written.
pub fn render_well_plot(
    path: &Path,
    record: &WellRecord,
    series: &TimeSeries,
    region: FitRegion,
    frame: &FrameGeometry,
    closure_time: Option<f64>,
) -> Result<()> {
    let (fit_times, _) = series.region(region)?;
    let fit = record.fit().ok_or_else(|| {
        Error::Plot(format!("{}: well {} has no fit", path.display(), record.well()))
    })?;
    let chart = WellChart {
        title: format!("{} {}", record.cell(), record.treatment()),
        samples: series.points().collect(),
        fit_line: fitted_line(&fit, fit_times),
        closure_point: closure_time
            .map(|t| (t * 60.0, frame.total_area()))
            .filter(|(x, y)| x.is_finite() && y.is_finite()),
        slope: fit.slope,
    };

    let root = BitMapBackend::new(path, SIZE).into_drawing_area();
    draw_well_chart(&root, &chart)
        .map_err(|e| Error::Plot(format!("{}: {e}", path.display())))
}

fn draw_well_chart<DB>(
    root: &DrawingArea<DB, Shift>,
    chart: &WellChart,
) -> std::result::Result<(), Box<dyn std::error::Error>>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)?;

    let xs = chart
        .samples
        .iter()
        .chain(&chart.fit_line)
        .chain(&chart.closure_point)
        .map(|p| p.0);
    let ys = chart
        .samples
        .iter()
        .chain(&chart.fit_line)
        .chain(&chart.closure_point)
        .map(|p| p.1);
    let (x_min, x_max) = padded_range(xs);
    let (y_min, y_max) = padded_range(ys);

    let mut ctx = ChartBuilder::on(root)
        .caption(&chart.title, ("sans-serif", 24))
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(80)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)?;

    ctx.configure_mesh()
        .x_desc("Time (min)")
        .y_desc("Cell-covered area")
        .draw()?;

    ctx.draw_series(
        chart
            .samples
            .iter()
            .map(|&p| Circle::new(p, 3, YELLOW.filled())),
    )?
    .label("Sample")
    .legend(|(x, y)| Circle::new((x, y), 3, YELLOW.filled()));

    ctx.draw_series(LineSeries::new(
        chart.fit_line.iter().copied(),
        RED.stroke_width(3),
    ))?
    .label("Fitting")
    .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED.stroke_width(3)));

    if let Some(point) = chart.closure_point {
        ctx.draw_series(std::iter::once(TriangleMarker::new(
            point,
            8,
            GREEN.filled(),
        )))?
        .label("Estimated time")
        .legend(|(x, y)| TriangleMarker::new((x, y), 6, GREEN.filled()));
    }

    let anchor = (
        x_min + (x_max - x_min) * 0.05,
        y_min + (y_max - y_min) * 0.1,
    );
    ctx.draw_series(std::iter::once(Text::new(
        format!("Slope={:.2}", chart.slope),
        anchor,
        ("sans-serif", 18).into_font().color(&BLACK),
    )))?;

    ctx.configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fit::{fit_linear, select_fit_region};

    #[test]
    fn test_render_well_plot_writes_png() {
        let frame = FrameGeometry::new(100, 100).unwrap();
        let times: Vec<f64> = (0..10).map(|i| f64::from(i) * 30.0).collect();
        let raw: Vec<f64> = times.iter().map(|t| 6000.0 - 10.0 * t).collect();
        let series = TimeSeries::from_raw(times, raw, &frame).unwrap();

        let region = select_fit_region(series.covered(), 0.6).unwrap();
        let (t, y) = series.region(region).unwrap();
        let fit = fit_linear(t, y).unwrap();
        let mut record = WellRecord::new("A1", "HeLa", "Control");
        record.set_fit(&fit, region);

        let dir = std::env::temp_dir().join("scratch_assay_well_plot_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("layout_A1.png");
        let _ = std::fs::remove_file(&path);

        render_well_plot(&path, &record, &series, region, &frame, Some(10.0)).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_unfitted_record_is_plot_error() {
        let frame = FrameGeometry::new(10, 10).unwrap();
        let series = TimeSeries::from_raw(vec![0.0, 1.0], vec![90.0, 80.0], &frame).unwrap();
        let region = select_fit_region(series.covered(), 1.0).unwrap();
        let record = WellRecord::new("B2", "HeLa", "Control");
        let path = std::env::temp_dir().join("scratch_assay_unfitted_B2.png");

        let err = render_well_plot(&path, &record, &series, region, &frame, None).unwrap_err();
        assert!(matches!(err, Error::Plot(ref msg) if msg.contains("B2")));
    }
}
