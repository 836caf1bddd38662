//! Session configuration
//!
//! Everything the analysis needs up front: objective magnification, the
//! session date label, where the layout, reference image and measurement
//! files live, and which wells get a non-default fit cutoff.
//!
//! ```toml
//! magnification = "10x"
//! date = "20181102"
//! reference_image = "Example/reference.tif"
//! data_dir = "Example"
//! default_fit_end = 0.6
//!
//! [[overrides]]
//! indices = [1, 3]
//! end = 0.4
//!
//! [plots]
//! metric = "velocity"
//! treatment_order = ["Control", "Drug"]
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::fit::DEFAULT_FIT_END;
use crate::imaging::Magnification;
use crate::layout::LayoutColumns;
use crate::plot::PlotOptions;
use crate::series::SeriesColumns;
use crate::{Error, Result};

/// Fit-end override for a set of wells, by layout row index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitOverride {
    /// Layout row indices
    pub indices: Vec<usize>,
    /// New fit-end fraction
    pub end: f64,
}

impl FromStr for FitOverride {
    type Err = Error;

    /// Parse `"1,3=0.4"` (indices may also be space separated).
    fn from_str(s: &str) -> Result<Self> {
        let bad = || Error::Config(format!("invalid override '{s}', expected e.g. '1,3=0.4'"));
        let (indices, end) = s.split_once('=').ok_or_else(bad)?;
        let indices = indices
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|part| !part.is_empty())
            .map(|part| part.parse::<usize>().map_err(|_| bad()))
            .collect::<Result<Vec<_>>>()?;
        let end = end.trim().parse::<f64>().map_err(|_| bad())?;
        if indices.is_empty() {
            return Err(bad());
        }
        Ok(Self { indices, end })
    }
}

/// Analysis session configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssayConfig {
    /// Objective label (`4x`, `10x`, `20x`)
    pub magnification: Option<String>,
    /// Session date label (today, `YYYYMMDD`, when unset)
    pub date: Option<String>,
    /// Layout file (`<data_dir>/<date>_metadata.csv` when unset)
    pub layout_path: Option<PathBuf>,
    /// Reference image giving the frame geometry
    pub reference_image: Option<PathBuf>,
    /// Directory holding per-well measurement files
    pub data_dir: PathBuf,
    /// Output directory (`<data_dir>/output` when unset)
    pub output_dir: Option<PathBuf>,
    /// Measurement file name suffix
    pub suffix: String,
    /// Measurement file column labels
    pub series: SeriesColumns,
    /// Layout identifying column names
    pub layout: LayoutColumns,
    /// Fit-end fraction for wells without an override
    pub default_fit_end: f64,
    /// Per-well fit-end overrides, applied in order
    pub overrides: Vec<FitOverride>,
    /// Plot settings
    pub plots: PlotOptions,
}

impl Default for AssayConfig {
    fn default() -> Self {
        Self {
            magnification: None,
            date: None,
            layout_path: None,
            reference_image: None,
            data_dir: PathBuf::from("."),
            output_dir: None,
            suffix: "_data".to_string(),
            series: SeriesColumns::default(),
            layout: LayoutColumns::default(),
            default_fit_end: DEFAULT_FIT_END,
            overrides: Vec::new(),
            plots: PlotOptions::default(),
        }
    }
}

impl AssayConfig {
    /// Create a config builder.
    #[must_use]
    pub fn builder() -> AssayConfigBuilder {
        AssayConfigBuilder::default()
    }

    /// Parse a TOML document. Paths are kept as written.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] on a syntax error, unknown value, or failed
    /// validation.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML file. Relative paths resolve against the file's directory.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read and [`Error::Config`]
    /// if it does not parse or validate.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let mut config = Self::from_toml_str(&text).map_err(|e| match e {
            Error::Config(reason) => Error::Config(format!("{}: {reason}", path.display())),
            other => other,
        })?;
        if let Some(base) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            config.resolve_relative(base);
        }
        debug!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] describing the first invalid field.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.default_fit_end) {
            return Err(Error::Config(format!(
                "default_fit_end must be in [0, 1], got {}",
                self.default_fit_end
            )));
        }
        for o in &self.overrides {
            if !(0.0..=1.0).contains(&o.end) {
                return Err(Error::Config(format!(
                    "override end for wells {:?} must be in [0, 1], got {}",
                    o.indices, o.end
                )));
            }
        }
        if let (Some(lo), Some(hi)) = (self.plots.y_min, self.plots.y_max) {
            if lo >= hi {
                return Err(Error::Config(format!(
                    "plots.y_min ({lo}) must be below plots.y_max ({hi})"
                )));
            }
        }
        if self.suffix.contains(['/', '\\']) {
            return Err(Error::Config(format!(
                "suffix '{}' must not contain a path separator",
                self.suffix
            )));
        }
        Ok(())
    }

    /// Configured objective.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if none is set and
    /// [`Error::InvalidMagnification`] if the label is unknown.
    pub fn magnification(&self) -> Result<Magnification> {
        self.magnification
            .as_deref()
            .ok_or_else(|| Error::Config("no magnification configured (4x, 10x or 20x)".into()))?
            .parse()
    }

    /// Session date label, defaulting to today's local date as `YYYYMMDD`.
    #[must_use]
    pub fn date_label(&self) -> String {
        self.date
            .clone()
            .unwrap_or_else(|| chrono::Local::now().format("%Y%m%d").to_string())
    }

    /// Layout file for a session labelled `date`.
    #[must_use]
    pub fn layout_path(&self, date: &str) -> PathBuf {
        self.layout_path
            .clone()
            .unwrap_or_else(|| self.data_dir.join(format!("{date}_metadata.csv")))
    }

    /// Reference image path.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if none is set.
    pub fn reference_image(&self) -> Result<&Path> {
        self.reference_image
            .as_deref()
            .ok_or_else(|| Error::Config("no reference_image configured".into()))
    }

    /// Output directory.
    #[must_use]
    pub fn output_dir(&self) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(|| self.data_dir.join("output"))
    }

    fn resolve_relative(&mut self, base: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        resolve(&mut self.data_dir);
        for path in [
            self.layout_path.as_mut(),
            self.reference_image.as_mut(),
            self.output_dir.as_mut(),
        ]
        .into_iter()
        .flatten()
        {
            resolve(path);
        }
    }
}

/// Builder for [`AssayConfig`].
#[derive(Debug, Default)]
pub struct AssayConfigBuilder {
    config: AssayConfig,
}

impl AssayConfigBuilder {
    /// Set the objective label.
    #[must_use]
    pub fn magnification(mut self, label: impl Into<String>) -> Self {
        self.config.magnification = Some(label.into());
        self
    }

    /// Set the session date label.
    #[must_use]
    pub fn date(mut self, date: impl Into<String>) -> Self {
        self.config.date = Some(date.into());
        self
    }

    /// Set the layout file.
    #[must_use]
    pub fn layout_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.layout_path = Some(path.into());
        self
    }

    /// Set the reference image.
    #[must_use]
    pub fn reference_image(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.reference_image = Some(path.into());
        self
    }

    /// Set the measurement directory.
    #[must_use]
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Set the output directory.
    #[must_use]
    pub fn output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.output_dir = Some(path.into());
        self
    }

    /// Set the measurement file suffix.
    #[must_use]
    pub fn suffix(mut self, suffix: impl Into<String>) -> Self {
        self.config.suffix = suffix.into();
        self
    }

    /// Set the default fit-end fraction.
    #[must_use]
    pub fn default_fit_end(mut self, fit_end: f64) -> Self {
        self.config.default_fit_end = fit_end;
        self
    }

    /// Add a fit-end override.
    #[must_use]
    pub fn fit_override(mut self, indices: Vec<usize>, end: f64) -> Self {
        self.config.overrides.push(FitOverride { indices, end });
        self
    }

    /// Set plot options.
    #[must_use]
    pub fn plots(mut self, plots: PlotOptions) -> Self {
        self.config.plots = plots;
        self
    }

    /// Validate and build.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if validation fails.
    pub fn build(self) -> Result<AssayConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
