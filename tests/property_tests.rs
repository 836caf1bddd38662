//! Property-based tests for scratch-assay
//!
//! - Fit region bounds and monotonicity over arbitrary series
//! - OLS recovers exact lines
//! - Run with ProptestConfig::with_cases(100)

use proptest::prelude::*;
use scratch_assay::fit::{fit_linear, select_fit_region};
use scratch_assay::imaging::{FrameGeometry, Magnification};
use scratch_assay::metrics::{closure_time, migration_velocity};

// ============================================================================
// Property Test Generators (Strategies)
// ============================================================================

/// Covered-area series in acquisition order (not necessarily monotone)
fn arb_series(max_len: usize) -> impl Strategy<Value = Vec<f64>> {
    proptest::collection::vec(0.0f64..1.0e6, 0..=max_len)
}

/// Fit-end fraction
fn arb_fraction() -> impl Strategy<Value = f64> {
    0.0f64..=1.0
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property: end lies within [0, len] and begin is 0
    #[test]
    fn prop_region_within_bounds(series in arb_series(60), f in arb_fraction()) {
        let region = select_fit_region(&series, f).unwrap();
        prop_assert_eq!(region.begin(), 0);
        prop_assert!(region.end() <= series.len());
    }

    /// Property: a larger fraction never selects fewer points
    #[test]
    fn prop_region_monotone_in_fraction(
        series in arb_series(60),
        a in arb_fraction(),
        b in arb_fraction()
    ) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let small = select_fit_region(&series, lo).unwrap();
        let large = select_fit_region(&series, hi).unwrap();
        prop_assert!(small.end() <= large.end());
    }

    /// Property: fraction 1 selects the whole non-empty series
    #[test]
    fn prop_full_fraction_selects_all(series in arb_series(60)) {
        let region = select_fit_region(&series, 1.0).unwrap();
        prop_assert_eq!(region.end(), series.len());
    }

    /// Property: a constant series selects every point, even at fraction 0
    #[test]
    fn prop_constant_series_selects_all(
        value in 0.0f64..1.0e6,
        len in 1usize..50,
        f in arb_fraction()
    ) {
        let series = vec![value; len];
        prop_assert_eq!(select_fit_region(&series, f).unwrap().end(), len);
    }

    /// Property: fractions outside [0, 1] are rejected
    #[test]
    fn prop_out_of_range_fraction_rejected(series in arb_series(10), f in 1.0001f64..10.0) {
        prop_assert!(select_fit_region(&series, f).is_err());
        prop_assert!(select_fit_region(&series, -f).is_err());
    }

    /// Property: OLS recovers slope and intercept of an exact line
    #[test]
    fn prop_ols_recovers_exact_line(
        slope in -100.0f64..100.0,
        intercept in -1.0e4f64..1.0e4,
        n in 2usize..40
    ) {
        let x: Vec<f64> = (0..n).map(|i| i as f64 * 15.0).collect();
        let y: Vec<f64> = x.iter().map(|t| slope * t + intercept).collect();
        let fit = fit_linear(&x, &y).unwrap();

        let tol = 1e-6 * (1.0 + slope.abs() + intercept.abs());
        prop_assert!((fit.slope - slope).abs() < tol, "slope {} vs {}", fit.slope, slope);
        prop_assert!((fit.intercept - intercept).abs() < tol * 100.0);
        prop_assert!(fit.r_squared > 1.0 - 1e-9 && fit.r_squared <= 1.0 + 1e-12);
    }

    /// Property: R² never exceeds 1 on noisy data
    #[test]
    fn prop_r_squared_at_most_one(y in proptest::collection::vec(-1.0e3f64..1.0e3, 3..40)) {
        let x: Vec<f64> = (0..y.len()).map(|i| i as f64).collect();
        let fit = fit_linear(&x, &y).unwrap();
        prop_assert!(fit.r_squared <= 1.0 + 1e-12);
    }

    /// Property: velocity keeps the sign of the slope
    #[test]
    fn prop_velocity_sign_follows_slope(slope in -1.0e4f64..1.0e4, height in 1u32..5000) {
        let frame = FrameGeometry::new(height, 100).unwrap();
        let v = migration_velocity(slope, &frame, Magnification::X20.scale_factor());
        prop_assert_eq!(v < 0.0, slope < 0.0);
    }

    /// Property: the closure-time line reaches the frame area
    #[test]
    fn prop_closure_time_reaches_frame_area(
        slope in prop_oneof![-1.0e3f64..-1.0e-3, 1.0e-3f64..1.0e3],
        intercept in 0.0f64..1.0e5
    ) {
        let frame = FrameGeometry::new(500, 500).unwrap();
        let t = closure_time(slope, intercept, &frame).unwrap();
        let reached = slope * t * 60.0 + intercept;
        prop_assert!((reached - frame.total_area()).abs() < 1e-6 * frame.total_area());
    }
}

#[test]
fn test_empty_series_selects_nothing() {
    let region = select_fit_region(&[], 0.6).unwrap();
    assert!(region.is_empty());
}
