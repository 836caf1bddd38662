//! Curve fitting for closure curves
//!
//! A full closure curve flattens near saturation, so only an early part of
//! the covered-area range is regressed:
//!
//! ```text
//! covered area ─┐
//!               │            ....*****   <- saturation, excluded
//!   threshold ──┼ ─ ─ ─ ─ ─**
//!               │      ***               <- [begin, end) fitted
//!               │ ***
//!               └───────────────────── time
//! ```
//!
//! [`select_fit_region`] decides the prefix, [`fit_linear`] fits it by
//! ordinary least squares.

mod ols;
mod region;

pub use ols::{fit_linear, fitted_line, FitResult};
pub use region::{select_fit_region, FitRegion, DEFAULT_FIT_END};
