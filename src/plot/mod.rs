//! Presentation: per-well fit plots and cohort comparison plots
//!
//! Rendering goes through `plotters`; each chart is drawn by one function that
//! is generic over the drawing backend, so the same code produces the PNG and
//! the SVG variant.

mod cohort;
mod well;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use cohort::{render_cohort_plot, CohortGroup};
pub use well::render_well_plot;

use crate::layout::WellRecord;
use crate::Error;

/// Result column shown on the cohort plot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// Migration velocity
    #[default]
    Velocity,
    /// Estimated closure time
    ClosureTime,
    /// Fit slope
    Slope,
    /// Fit R²
    RSquared,
}

impl Metric {
    /// Value of this metric on a record, if it was computed.
    #[must_use]
    pub const fn value(self, record: &WellRecord) -> Option<f64> {
        let computed = record.computed();
        match self {
            Self::Velocity => computed.velocity,
            Self::ClosureTime => computed.closure_time,
            Self::Slope => computed.slope,
            Self::RSquared => computed.r_squared,
        }
    }

    /// Results-file column name, also used for output file names.
    #[must_use]
    pub const fn column(self) -> &'static str {
        match self {
            Self::Velocity => "Velocity",
            Self::ClosureTime => "Time",
            Self::Slope => "Slope",
            Self::RSquared => "R^2 score",
        }
    }

    /// Default axis label.
    #[must_use]
    pub const fn default_label(self) -> &'static str {
        match self {
            Self::Velocity => "Cell migration velocity \u{3bc}m/min",
            Self::ClosureTime => "Estimated closure time",
            Self::Slope => "Slope (pixel\u{b2}/min)",
            Self::RSquared => "R\u{b2} score",
        }
    }

    fn file_stem(self) -> &'static str {
        match self {
            Self::RSquared => "R2score",
            other => other.column(),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// Plot settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotOptions {
    /// Render plots at all
    pub enabled: bool,
    /// Cohort plot metric
    pub metric: Metric,
    /// Lower y bound of the cohort plot (auto when unset)
    pub y_min: Option<f64>,
    /// Upper y bound of the cohort plot (auto when unset)
    pub y_max: Option<f64>,
    /// Cohort y-axis label (metric default when unset)
    pub y_label: Option<String>,
    /// Treatment order for the cohort plot (alphabetical when unset)
    pub treatment_order: Option<Vec<String>>,
}

impl Default for PlotOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            metric: Metric::Velocity,
            y_min: None,
            y_max: None,
            y_label: None,
            treatment_order: None,
        }
    }
}

impl PlotOptions {
    /// Axis label for the cohort plot.
    #[must_use]
    pub fn y_label(&self) -> &str {
        self.y_label
            .as_deref()
            .unwrap_or_else(|| self.metric.default_label())
    }

    /// Cohort plot file stem: `<metric><label>`, e.g. `Velocity20181102`.
    #[must_use]
    pub fn cohort_stem(&self, label: &str) -> String {
        format!("{}{label}", self.metric.file_stem())
    }
}

/// Finite `(min, max)` of `values`, padded when degenerate.
fn padded_range(values: impl IntoIterator<Item = f64>) -> (f64, f64) {
    let (lo, hi) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if !lo.is_finite() {
        return (0.0, 1.0);
    }
    let span = hi - lo;
    let pad = if span > 0.0 { span * 0.05 } else { lo.abs().max(1.0) * 0.5 };
    (lo - pad, hi + pad)
}

impl FromStr for Metric {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        match key.as_str() {
            "velocity" => Ok(Self::Velocity),
            "closure_time" | "time" => Ok(Self::ClosureTime),
            "slope" => Ok(Self::Slope),
            "r_squared" | "r2" | "r^2_score" => Ok(Self::RSquared),
            _ => Err(Error::InvalidInput(format!(
                "unknown metric '{s}' (velocity, closure_time, slope, r_squared)"
            ))),
        }
    }
}
