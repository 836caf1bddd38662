//! Image metrics shared by every well of an assay
//!
//! ## Overview
//!
//! ```text
//! reference image ──> FrameGeometry { height, total_area }
//! objective label ──> Magnification ──> ScaleFactor (µm / pixel)
//! ```
//!
//! Both values are computed once per session and only read afterwards.
//!
//! ## Usage
//!
//! ```rust
//! use scratch_assay::imaging::{FrameGeometry, Magnification};
//!
//! let frame = FrameGeometry::new(1000, 500).unwrap();
//! assert_eq!(frame.total_area(), 500_000.0);
//!
//! let scale = "10x".parse::<Magnification>().unwrap().scale_factor();
//! assert!((scale.micrometers_per_pixel() - 0.644_608).abs() < 1e-12);
//! ```

mod geometry;
mod magnification;

pub use geometry::FrameGeometry;
pub use magnification::{Magnification, ScaleFactor};
