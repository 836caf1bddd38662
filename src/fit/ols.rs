//! Closed-form ordinary least squares for a single predictor

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Fitted line `y = slope * x + intercept` with its coefficient of determination.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitResult {
    /// Rate of change of covered area (pixel² per time unit)
    pub slope: f64,
    /// Covered area at time zero
    pub intercept: f64,
    /// Coefficient of determination over the fitted points
    pub r_squared: f64,
}

impl FitResult {
    /// Evaluate the fitted line at `x`.
    #[must_use]
    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Fit `y ≈ slope * x + intercept` by ordinary least squares.
///
/// Two passes: means first, then centered sums. R² is
/// `1 - SS_res / SS_tot`; when `y` is constant R² is 1.0 for an exact fit and
/// 0.0 otherwise.
///
/// # Errors
///
/// Returns [`Error::DegenerateFit`] if
/// - `x` and `y` differ in length
/// - fewer than 2 points are given
/// - all `x` values are identical
///
/// # Examples
///
/// ```rust
/// use scratch_assay::fit::fit_linear;
///
/// let time: Vec<f64> = (0..=10).map(f64::from).collect();
/// let covered: Vec<f64> = time.iter().map(|t| 100.0 - 5.0 * t).collect();
///
/// let fit = fit_linear(&time, &covered)?;
/// assert!((fit.slope + 5.0).abs() < 1e-9);
/// assert!((fit.intercept - 100.0).abs() < 1e-9);
/// assert!((fit.r_squared - 1.0).abs() < 1e-12);
/// # Ok::<(), scratch_assay::Error>(())
/// ```
#[allow(clippy::cast_precision_loss)]
pub fn fit_linear(x: &[f64], y: &[f64]) -> Result<FitResult> {
    if x.len() != y.len() {
        return Err(Error::DegenerateFit(format!(
            "predictor has {} points but response has {}",
            x.len(),
            y.len()
        )));
    }
    if x.len() < 2 {
        return Err(Error::DegenerateFit(format!(
            "need at least 2 points, got {}",
            x.len()
        )));
    }

    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;

    let mut sxx = 0.0;
    let mut sxy = 0.0;
    for (&xi, &yi) in x.iter().zip(y) {
        let dx = xi - mean_x;
        sxx += dx * dx;
        sxy += dx * (yi - mean_y);
    }

    if sxx == 0.0 {
        return Err(Error::DegenerateFit(format!(
            "all {} time values are identical ({mean_x})",
            x.len()
        )));
    }

    let slope = sxy / sxx;
    let intercept = mean_y - slope * mean_x;

    let mut ss_res = 0.0;
    let mut ss_tot = 0.0;
    for (&xi, &yi) in x.iter().zip(y) {
        let residual = yi - (slope * xi + intercept);
        ss_res += residual * residual;
        let centered = yi - mean_y;
        ss_tot += centered * centered;
    }

    let r_squared = if ss_tot == 0.0 {
        if ss_res == 0.0 {
            1.0
        } else {
            0.0
        }
    } else {
        1.0 - ss_res / ss_tot
    };

    Ok(FitResult {
        slope,
        intercept,
        r_squared,
    })
}

/// Points of the fitted line at each of `x`, for overlaying on the samples.
#[must_use]
pub fn fitted_line(fit: &FitResult, x: &[f64]) -> Vec<(f64, f64)> {
    x.iter().map(|&xi| (xi, fit.predict(xi))).collect()
}
