//! Analysis driver: per-well pipeline over a layout table
//!
//! ```text
//! Assay::open(config)
//!   ├─ magnification ─> ScaleFactor          ┐
//!   ├─ reference image ─> FrameGeometry      │ session errors abort here
//!   ├─ layout file ─> LayoutTable            │
//!   └─ default fit end + overrides           ┘
//!
//! Assay::run()
//!   for each well (in layout order):
//!     load series ─> select region ─> fit ─> velocity, closure ─> plot
//!     failure: logged, recorded in the BatchReport, next well
//!   write Results_<date>.csv, cohort plot
//! ```
//!
//! A well that fails to load or fit has its computed results cleared, so a
//! record never mixes values from two passes. When only the closure time is
//! undefined, the fit and velocity are still recorded and the closure time is
//! cleared.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use tracing::{debug, info, info_span, warn};

use crate::config::AssayConfig;
use crate::fit::{fit_linear, select_fit_region, FitRegion, FitResult, DEFAULT_FIT_END};
use crate::imaging::{FrameGeometry, ScaleFactor};
use crate::layout::{load_layout, results_path, write_results, LayoutTable};
use crate::metrics::{closure_time, migration_velocity};
use crate::plot::{render_cohort_plot, render_well_plot};
use crate::series::{series_path, TimeSeries};
use crate::Result;

/// Pipeline step a well failed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Reading the measurement file
    Load,
    /// Region selection or regression
    Fit,
    /// Velocity or closure time
    Metrics,
    /// Per-well plot
    Plot,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Load => "load",
            Self::Fit => "fit",
            Self::Metrics => "metrics",
            Self::Plot => "plot",
        })
    }
}

/// One well that could not be fully analyzed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WellFailure {
    /// Layout row index
    pub index: usize,
    /// Well identifier
    pub well: String,
    /// Step that failed
    pub stage: Stage,
    /// Error message
    pub message: String,
}

/// Summary of an analysis pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchReport {
    /// Session date label
    pub date: String,
    /// Wells analyzed without error
    pub analyzed: usize,
    /// Wells with an error
    pub failures: Vec<WellFailure>,
    /// Results file written at the end of the pass
    pub results_path: Option<PathBuf>,
    /// Plot files written during the pass
    pub plots: Vec<PathBuf>,
}

impl BatchReport {
    /// Check whether every well was analyzed.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Values computed for one well.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WellAnalysis {
    /// Fitted index range
    pub region: FitRegion,
    /// Regression result
    pub fit: FitResult,
    /// Migration velocity
    pub velocity: f64,
    /// Estimated closure time
    pub closure_time: f64,
}

/// An analysis session: configuration, shared image metrics and the layout.
#[derive(Debug)]
pub struct Assay {
    config: AssayConfig,
    date: String,
    frame: FrameGeometry,
    scale: ScaleFactor,
    table: LayoutTable,
}

impl Assay {
    /// Open a session from configuration.
    ///
    /// Reads the magnification, the reference image and the layout file, then
    /// applies the default fit end and every configured override.
    ///
    /// # Errors
    ///
    /// Any failure here is a session error: unknown or missing magnification,
    /// unreadable reference image, malformed layout, or an invalid override.
    pub fn open(config: AssayConfig) -> Result<Self> {
        let scale = config.magnification()?.scale_factor();
        let frame = FrameGeometry::from_image(config.reference_image()?)?;
        let date = config.date_label();
        let layout_path = config.layout_path(&date);
        let table = load_layout(&layout_path, &config.layout)?;
        info!(
            layout = %layout_path.display(),
            wells = table.len(),
            date = %date,
            "Opened assay session"
        );
        Self::with_date(config, date, frame, scale, table)
    }

    /// Create a session from already-loaded parts.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidInput`] if an override names a row
    /// outside the table.
    pub fn new(
        config: AssayConfig,
        frame: FrameGeometry,
        scale: ScaleFactor,
        table: LayoutTable,
    ) -> Result<Self> {
        let date = config.date_label();
        Self::with_date(config, date, frame, scale, table)
    }

    fn with_date(
        config: AssayConfig,
        date: String,
        frame: FrameGeometry,
        scale: ScaleFactor,
        table: LayoutTable,
    ) -> Result<Self> {
        let mut assay = Self {
            config,
            date,
            frame,
            scale,
            table,
        };
        let default_end = assay.config.default_fit_end;
        if (default_end - DEFAULT_FIT_END).abs() > f64::EPSILON {
            let all: Vec<usize> = (0..assay.table.len()).collect();
            assay.table.override_fit_end(&all, default_end)?;
        }
        for o in assay.config.overrides.clone() {
            assay.override_fit_end(&o.indices, o.end)?;
        }
        Ok(assay)
    }

    /// Session configuration.
    #[must_use]
    pub const fn config(&self) -> &AssayConfig {
        &self.config
    }

    /// Session date label.
    #[must_use]
    pub fn date(&self) -> &str {
        &self.date
    }

    /// Frame geometry shared by every well.
    #[must_use]
    pub const fn frame(&self) -> &FrameGeometry {
        &self.frame
    }

    /// Pixel scale of the objective.
    #[must_use]
    pub const fn scale(&self) -> ScaleFactor {
        self.scale
    }

    /// Layout table with the current computed fields.
    #[must_use]
    pub const fn table(&self) -> &LayoutTable {
        &self.table
    }

    /// Output directory for results and plots.
    #[must_use]
    pub fn output_dir(&self) -> PathBuf {
        self.config.output_dir()
    }

    /// Change the fit end of the given rows; the next analysis uses it.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidInput`] if `end` is outside `[0, 1]` or
    /// an index is out of range. Nothing changes in that case.
    pub fn override_fit_end(&mut self, indices: &[usize], end: f64) -> Result<()> {
        self.table.override_fit_end(indices, end)?;
        info!(?indices, end, "Overrode fit end");
        Ok(())
    }

    /// Load the measurement file of row `index`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidInput`] for a bad index, otherwise any
    /// error from [`TimeSeries::load`].
    pub fn load_series(&self, index: usize) -> Result<TimeSeries> {
        let record = self.table.get(index)?;
        let path = series_path(&self.config.data_dir, record.well(), &self.config.suffix);
        TimeSeries::load(path, &self.frame, &self.config.series)
    }

    /// Fit `series` for row `index` and record the results.
    ///
    /// # Errors
    ///
    /// A failed fit clears the record's results. An undefined closure time is
    /// returned after slope, intercept, R² and velocity are written.
    pub fn analyze_series(&mut self, index: usize, series: &TimeSeries) -> Result<WellAnalysis> {
        let (region, fit, velocity) = self.fit_series(index, series)?;
        let closure = self.record_closure(index, &fit)?;
        Ok(WellAnalysis {
            region,
            fit,
            velocity,
            closure_time: closure,
        })
    }

    /// Load, fit and plot row `index`.
    ///
    /// # Errors
    ///
    /// Returns the underlying error wrapped in [`crate::Error::Well`].
    pub fn analyze_well(&mut self, index: usize) -> Result<WellAnalysis> {
        let well = self.table.get(index)?.well().to_string();
        self.process(index)
            .map(|(analysis, _)| analysis)
            .map_err(|(_, e)| e.for_well(well))
    }

    /// Analyze every well, write the results file and the cohort plot.
    ///
    /// Per-well failures are logged and collected in the report.
    ///
    /// # Errors
    ///
    /// Returns an error only if the results file or the cohort plot cannot be
    /// written.
    pub fn run(&mut self) -> Result<BatchReport> {
        info!(wells = self.table.len(), date = %self.date, "Analyzing wells");
        let mut report = BatchReport {
            date: self.date.clone(),
            ..BatchReport::default()
        };

        for index in 0..self.table.len() {
            let well = self.table.get(index)?.well().to_string();
            let span = info_span!("well", well = %well, index);
            let _guard = span.enter();

            match self.process(index) {
                Ok((_, plot)) => {
                    report.analyzed += 1;
                    report.plots.extend(plot);
                }
                Err((stage, error)) => {
                    warn!(%stage, %error, "Well failed");
                    report.failures.push(WellFailure {
                        index,
                        well,
                        stage,
                        message: error.to_string(),
                    });
                }
            }
        }

        report.results_path = Some(self.write_results()?);
        if self.config.plots.enabled && !self.table.is_empty() {
            report.plots.extend(self.cohort_plot()?);
        }

        info!(
            analyzed = report.analyzed,
            failed = report.failures.len(),
            "Analysis finished"
        );
        Ok(report)
    }

    /// Write `Results_<date>.csv` into the output directory.
    ///
    /// # Errors
    ///
    /// Returns an IO or CSV error on write failure.
    pub fn write_results(&self) -> Result<PathBuf> {
        let path = results_path(&self.output_dir(), &self.date);
        write_results(&self.table, &path)?;
        Ok(path)
    }

    /// Render the cohort plot for the configured metric.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Plot`] if rendering fails.
    pub fn cohort_plot(&self) -> Result<Vec<PathBuf>> {
        let options = &self.config.plots;
        render_cohort_plot(
            self.table.records(),
            options,
            &self.output_dir(),
            &options.cohort_stem(&self.date),
        )
    }

    fn fit_series(
        &mut self,
        index: usize,
        series: &TimeSeries,
    ) -> Result<(FitRegion, FitResult, f64)> {
        let fit_end = self.table.get(index)?.computed().fit_end;
        let fitted = select_fit_region(series.covered(), fit_end).and_then(|region| {
            let (times, covered) = series.region(region)?;
            Ok((region, fit_linear(times, covered)?))
        });
        let (region, fit) = match fitted {
            Ok(fitted) => fitted,
            Err(e) => {
                self.table.get_mut(index)?.clear_results();
                return Err(e);
            }
        };
        let velocity = migration_velocity(fit.slope, &self.frame, self.scale);
        debug!(
            begin = region.begin(),
            end = region.end(),
            slope = fit.slope,
            intercept = fit.intercept,
            r_squared = fit.r_squared,
            velocity,
            "Fitted well"
        );

        let record = self.table.get_mut(index)?;
        record.set_fit(&fit, region);
        record.set_velocity(velocity);
        Ok((region, fit, velocity))
    }

    fn record_closure(&mut self, index: usize, fit: &FitResult) -> Result<f64> {
        let closure = closure_time(fit.slope, fit.intercept, &self.frame);
        self.table
            .get_mut(index)?
            .set_closure_time(closure.as_ref().ok().copied());
        closure
    }

    fn process(
        &mut self,
        index: usize,
    ) -> std::result::Result<(WellAnalysis, Option<PathBuf>), (Stage, crate::Error)> {
        let series = match self.load_series(index) {
            Ok(series) => series,
            Err(e) => {
                if let Ok(record) = self.table.get_mut(index) {
                    record.clear_results();
                }
                return Err((Stage::Load, e));
            }
        };
        let (region, fit, velocity) = self
            .fit_series(index, &series)
            .map_err(|e| (Stage::Fit, e))?;
        let closure = self.record_closure(index, &fit);

        let mut plot = None;
        if self.config.plots.enabled {
            let record = self.table.get(index).map_err(|e| (Stage::Plot, e))?;
            let path = self
                .output_dir()
                .join(format!("layout_{}.png", record.well()));
            std::fs::create_dir_all(self.output_dir())
                .map_err(|e| (Stage::Plot, crate::Error::from(e)))?;
            render_well_plot(
                &path,
                record,
                &series,
                region,
                &self.frame,
                closure.as_ref().ok().copied(),
            )
            .map_err(|e| (Stage::Plot, e))?;
            plot = Some(path);
        }

        let closure_time = closure.map_err(|e| (Stage::Metrics, e))?;
        Ok((
            WellAnalysis {
                region,
                fit,
                velocity,
                closure_time,
            },
            plot,
        ))
    }
}
