//! Objective magnification lookup (Cytation 5 objectives)

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

/// Supported acquisition objectives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Magnification {
    /// 4x objective
    #[serde(rename = "4x")]
    X4,
    /// 10x objective
    #[serde(rename = "10x")]
    X10,
    /// 20x objective
    #[serde(rename = "20x")]
    X20,
}

impl Magnification {
    /// All supported objectives, lowest magnification first.
    pub const ALL: [Self; 3] = [Self::X4, Self::X10, Self::X20];

    /// Label used in configuration and on the command line.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::X4 => "4x",
            Self::X10 => "10x",
            Self::X20 => "20x",
        }
    }

    /// Micrometers per pixel for this objective.
    #[must_use]
    pub const fn scale_factor(self) -> ScaleFactor {
        let um_per_pixel = match self {
            Self::X4 => 1.611_928,
            Self::X10 => 0.644_608,
            Self::X20 => 0.321_895,
        };
        ScaleFactor(um_per_pixel)
    }
}

impl fmt::Display for Magnification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Magnification {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = s.trim();
        Self::ALL
            .into_iter()
            .find(|m| m.label().eq_ignore_ascii_case(label))
            .ok_or_else(|| Error::InvalidMagnification(label.to_string()))
    }
}

/// Physical length (µm) covered by one pixel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScaleFactor(f64);

impl ScaleFactor {
    /// Micrometers per pixel.
    #[must_use]
    pub const fn micrometers_per_pixel(self) -> f64 {
        self.0
    }
}
