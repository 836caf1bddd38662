//! Fit region selection by fraction of the covered-area range

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Default fit-end fraction: the first 60% of the covered-area range.
pub const DEFAULT_FIT_END: f64 = 0.6;

/// Half-open index range `[begin, end)` of a series used for regression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FitRegion {
    begin: usize,
    end: usize,
}

impl FitRegion {
    /// First index of the region (always 0 for fraction-based selection).
    #[must_use]
    pub const fn begin(&self) -> usize {
        self.begin
    }

    /// One past the last index of the region.
    #[must_use]
    pub const fn end(&self) -> usize {
        self.end
    }

    /// Number of points in the region.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.end - self.begin
    }

    /// True when the region selects no points.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.end == self.begin
    }

    /// Region as a slice range.
    #[must_use]
    pub const fn range(&self) -> Range<usize> {
        self.begin..self.end
    }
}

/// Select the prefix of `covered` to fit for fit-end fraction `fraction`.
///
/// The fraction is mapped linearly onto the observed range of the whole
/// series (`0 -> min`, `1 -> max`). `end` is the number of points, counted in
/// acquisition order, whose value is `<= threshold`; the region is `[0, end)`.
///
/// A constant series selects every point for any fraction. An empty series
/// selects nothing.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] if `fraction` is outside `[0, 1]` or NaN.
///
/// # Examples
///
/// ```rust
/// use scratch_assay::fit::select_fit_region;
///
/// let covered = [0.0, 10.0, 20.0, 30.0, 40.0, 50.0];
/// let region = select_fit_region(&covered, 0.6).unwrap();
/// assert_eq!(region.range(), 0..4);
/// ```
pub fn select_fit_region(covered: &[f64], fraction: f64) -> Result<FitRegion> {
    if !(0.0..=1.0).contains(&fraction) {
        return Err(Error::InvalidInput(format!(
            "fit-end fraction must be within [0, 1], got {fraction}"
        )));
    }

    let Some((min, max)) = value_range(covered) else {
        return Ok(FitRegion { begin: 0, end: 0 });
    };

    #[allow(clippy::suboptimal_flops)]
    let threshold = if fraction >= 1.0 {
        max
    } else {
        min + fraction * (max - min)
    };

    let end = covered.iter().filter(|&&value| value <= threshold).count();

    Ok(FitRegion { begin: 0, end })
}

fn value_range(values: &[f64]) -> Option<(f64, f64)> {
    let first = *values.first()?;
    Some(
        values
            .iter()
            .fold((first, first), |(lo, hi), &v| (lo.min(v), hi.max(v))),
    )
}
