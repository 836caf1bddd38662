//! Physical quantities derived from a closure-curve fit
//!
//! ## Sign convention
//!
//! Velocity keeps the sign of the slope. A fit on a shrinking covered area
//! yields a negative velocity; values are never folded to their magnitude.

use crate::imaging::{FrameGeometry, ScaleFactor};
use crate::{Error, Result};

/// Seconds-to-minutes style divisor applied to the closure estimate.
pub const CLOSURE_TIME_DIVISOR: f64 = 60.0;

/// Cell migration velocity in µm per time unit of the series.
///
/// `(slope / frame_height / 2) * scale`: the area rate is spread over the
/// frame height to get a closing rate, halved because the scratch closes from
/// both edges, then converted from pixels to micrometers.
///
/// # Examples
///
/// ```rust
/// use scratch_assay::imaging::{FrameGeometry, Magnification};
/// use scratch_assay::metrics::migration_velocity;
///
/// let frame = FrameGeometry::new(1000, 500).unwrap();
/// let v = migration_velocity(-5.0, &frame, Magnification::X10.scale_factor());
/// assert!((v - -0.001_611_52).abs() < 1e-9);
/// ```
#[must_use]
pub fn migration_velocity(slope: f64, frame: &FrameGeometry, scale: ScaleFactor) -> f64 {
    ((slope / frame.height()) / 2.0) * scale.micrometers_per_pixel()
}

/// Time at which the fitted line reaches the full frame area, divided by 60.
///
/// # Errors
///
/// Returns [`Error::UndefinedClosureTime`] when `slope` is zero, and
/// [`Error::InvalidInput`] when the inputs are not finite.
pub fn closure_time(slope: f64, intercept: f64, frame: &FrameGeometry) -> Result<f64> {
    if !slope.is_finite() || !intercept.is_finite() {
        return Err(Error::InvalidInput(format!(
            "closure time needs finite fit parameters, got slope = {slope}, intercept = {intercept}"
        )));
    }
    if slope == 0.0 {
        return Err(Error::UndefinedClosureTime { intercept });
    }
    Ok(((frame.total_area() - intercept) / slope) / CLOSURE_TIME_DIVISOR)
}
