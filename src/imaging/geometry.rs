//! Frame geometry - pixel height and area of the imaging frame

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{Error, Result};

/// Pixel dimensions of the imaging frame.
///
/// Height is the number of pixel rows; total area is rows × columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameGeometry {
    height: u32,
    width: u32,
}

impl FrameGeometry {
    /// Create a frame geometry from explicit dimensions.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if either dimension is zero.
    pub fn new(height: u32, width: u32) -> Result<Self> {
        if height == 0 || width == 0 {
            return Err(Error::InvalidInput(format!(
                "frame dimensions must be non-zero, got {height}x{width} (height x width)"
            )));
        }
        Ok(Self { height, width })
    }

    /// Derive the geometry from a reference image.
    ///
    /// Only the image header is decoded.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Image`] if the file cannot be read as an image.
    pub fn from_image<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let (width, height) = image::image_dimensions(path)?;
        let geometry = Self::new(height, width)?;
        info!(
            path = %path.display(),
            height = geometry.height,
            total_area = geometry.total_area(),
            "Loaded frame geometry"
        );
        Ok(geometry)
    }

    /// Frame height in pixels.
    #[must_use]
    pub fn height(&self) -> f64 {
        f64::from(self.height)
    }

    /// Frame width in pixels.
    #[must_use]
    pub fn width(&self) -> f64 {
        f64::from(self.width)
    }

    /// Total frame area in pixels (height × width).
    #[must_use]
    pub fn total_area(&self) -> f64 {
        f64::from(self.height) * f64::from(self.width)
    }
}
