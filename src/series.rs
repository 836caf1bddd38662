//! Per-well time series of scratch area measurements
//!
//! Measurement files come from image-analysis exports and are not consistent
//! about field separators: tab, colon and semicolon are all accepted, even
//! mixed within one file. A file using none of them falls back to commas.
//!
//! ```text
//! Time (min)<TAB>Area (pixel^2)        time   raw    covered = frame_area - raw
//! 0<TAB>412000               ──>    0.0   412000   88000
//! 30<TAB>398500                     30.0   398500  101500
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::fit::FitRegion;
use crate::imaging::FrameGeometry;
use crate::{Error, Result};

/// Separators normalized to tab before parsing.
const ALTERNATE_DELIMITERS: [char; 2] = [':', ';'];

/// Column labels in a measurement file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeriesColumns {
    /// Time column label
    pub time: String,
    /// Open (scratch) area column label, in pixels
    pub area: String,
}

impl Default for SeriesColumns {
    fn default() -> Self {
        Self {
            time: "Time (min)".to_string(),
            area: "Area (pixel^2)".to_string(),
        }
    }
}

/// Measurement file for `well`: `<data_dir>/<well><suffix>.csv`.
#[must_use]
pub fn series_path(data_dir: &Path, well: &str, suffix: &str) -> PathBuf {
    data_dir.join(format!("{well}{suffix}.csv"))
}

/// Time series of one well, in acquisition order.
///
/// Covered area is derived once at construction and the series is not
/// modified afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    times: Vec<f64>,
    raw_area: Vec<f64>,
    covered: Vec<f64>,
}

impl TimeSeries {
    /// Build a series from raw (open) area measurements.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the two columns differ in length.
    pub fn from_raw(times: Vec<f64>, raw_area: Vec<f64>, frame: &FrameGeometry) -> Result<Self> {
        if times.len() != raw_area.len() {
            return Err(Error::InvalidInput(format!(
                "time series has {} time values but {} area values",
                times.len(),
                raw_area.len()
            )));
        }
        let total = frame.total_area();
        let covered = raw_area.iter().map(|area| total - area).collect();
        Ok(Self {
            times,
            raw_area,
            covered,
        })
    }

    /// Load a well's measurement file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read, and
    /// [`Error::MalformedInput`] if a column is missing or a value is not a
    /// finite number.
    pub fn load<P: AsRef<Path>>(
        path: P,
        frame: &FrameGeometry,
        columns: &SeriesColumns,
    ) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        let text = String::from_utf8_lossy(&bytes);
        let (delimiter, normalized) = normalize_delimiters(text.trim_start_matches('\u{feff}'));

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .trim(csv::Trim::All)
            .from_reader(normalized.as_bytes());

        let headers = reader.headers()?.clone();
        let find = |label: &str| {
            headers.iter().position(|h| h == label).ok_or_else(|| {
                Error::malformed(
                    path,
                    format!(
                        "missing column '{label}' (found: {})",
                        headers.iter().collect::<Vec<_>>().join(", ")
                    ),
                )
            })
        };
        let time_idx = find(&columns.time)?;
        let area_idx = find(&columns.area)?;

        let mut times = Vec::new();
        let mut raw_area = Vec::new();
        for (row, result) in reader.records().enumerate() {
            let line = row + 2;
            let record =
                result.map_err(|e| Error::malformed(path, format!("line {line}: {e}")))?;
            times.push(parse_value(path, line, &columns.time, record.get(time_idx))?);
            raw_area.push(parse_value(path, line, &columns.area, record.get(area_idx))?);
        }

        debug!(path = %path.display(), points = times.len(), "Loaded time series");
        Self::from_raw(times, raw_area, frame)
    }

    /// Number of points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.times.len()
    }

    /// Check if the series has no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Acquisition times.
    #[must_use]
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    /// Measured open (scratch) area per point.
    #[must_use]
    pub fn raw_area(&self) -> &[f64] {
        &self.raw_area
    }

    /// Cell-covered area per point (`frame_area - raw_area`).
    #[must_use]
    pub fn covered(&self) -> &[f64] {
        &self.covered
    }

    /// `(time, covered)` slices restricted to `region`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the region extends past the series.
    pub fn region(&self, region: FitRegion) -> Result<(&[f64], &[f64])> {
        if region.end() > self.len() {
            return Err(Error::InvalidInput(format!(
                "fit region {:?} exceeds series length {}",
                region.range(),
                self.len()
            )));
        }
        Ok((&self.times[region.range()], &self.covered[region.range()]))
    }

    /// `(time, covered)` pairs for plotting.
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.times.iter().copied().zip(self.covered.iter().copied())
    }
}

fn normalize_delimiters(text: &str) -> (u8, String) {
    let header = text.lines().next().unwrap_or_default();
    let has_tabular = header
        .chars()
        .any(|c| c == '\t' || ALTERNATE_DELIMITERS.contains(&c));
    if !has_tabular && header.contains(',') {
        return (b',', text.to_string());
    }
    let normalized = text.replace(ALTERNATE_DELIMITERS, "\t");
    (b'\t', normalized)
}

fn parse_value(path: &Path, line: usize, column: &str, raw: Option<&str>) -> Result<f64> {
    let raw = raw.unwrap_or_default();
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(Error::malformed(
            path,
            format!("line {line}: column '{column}' has non-numeric value '{raw}'"),
        )),
    }
}
