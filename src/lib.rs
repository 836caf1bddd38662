//! # Scratch-Assay: Wound-Healing Migration Analysis
//!
//! **Version**: 0.1.0
//!
//! Scratch-Assay estimates cell migration velocity from scratch (wound-healing)
//! microscopy time series. For every well in a plate layout it reads the
//! measured open area over time, fits a line to the early part of the
//! covered-area curve, and derives a migration velocity and a closure-time
//! estimate.
//!
//! ## Pipeline
//!
//! - **Image metrics**: frame geometry from a reference image, µm/pixel from the
//!   objective magnification
//! - **Fit region**: prefix of the series below a fraction of the covered-area
//!   range
//! - **Linear fit**: closed-form ordinary least squares with R²
//! - **Derived metrics**: velocity and closure time, written back to the layout
//!
//! ## Example Usage
//!
//! ```rust
//! use scratch_assay::fit::{fit_linear, select_fit_region};
//! use scratch_assay::imaging::{FrameGeometry, Magnification};
//! use scratch_assay::metrics::migration_velocity;
//! use scratch_assay::series::TimeSeries;
//!
//! let frame = FrameGeometry::new(1000, 500)?;
//! let times = vec![0.0, 30.0, 60.0, 90.0, 120.0];
//! let open_area = vec![420_000.0, 400_000.0, 380_000.0, 370_000.0, 368_000.0];
//! let series = TimeSeries::from_raw(times, open_area, &frame)?;
//!
//! let region = select_fit_region(series.covered(), 0.6)?;
//! let (t, covered) = series.region(region)?;
//! let fit = fit_linear(t, covered)?;
//! let velocity = migration_velocity(fit.slope, &frame, Magnification::X10.scale_factor());
//! assert!(velocity > 0.0);
//! # Ok::<(), scratch_assay::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod analysis;
pub mod config;
pub mod error;
pub mod fit;
pub mod imaging;
pub mod layout;
pub mod metrics;
pub mod plot;
pub mod series;

pub use analysis::{Assay, BatchReport, Stage, WellAnalysis, WellFailure};
pub use config::{AssayConfig, FitOverride};
pub use error::{Error, Result};
