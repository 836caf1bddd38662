//! Error types for scratch-assay
//!
//! Every message names the offending value so the input can be corrected.

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Scratch assay error types
#[derive(Error, Debug)]
pub enum Error {
    /// Objective label not in the magnification lookup
    #[error("Invalid magnification '{0}'\nSupported objectives are 4x, 10x and 20x")]
    InvalidMagnification(String),

    /// Fit region cannot support a least-squares line
    #[error("Degenerate fit: {0}")]
    DegenerateFit(String),

    /// Zero slope: the fitted line never reaches full closure
    #[error("Undefined closure time: slope is zero (intercept = {intercept})")]
    UndefinedClosureTime {
        /// Intercept of the flat fitted line
        intercept: f64,
    },

    /// Missing columns or unparsable rows in a layout/measurement file
    #[error("Malformed input in {path}: {reason}")]
    MalformedInput {
        /// File the problem was found in
        path: String,
        /// What was wrong
        reason: String,
    },

    /// Invalid argument (index out of range, fraction outside [0, 1], ...)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration file could not be parsed
    #[error("Config error: {0}")]
    Config(String),

    /// Plot rendering failed
    #[error("Plot error: {0}")]
    Plot(String),

    /// Failure while analyzing one well
    #[error("Well {well}: {source}")]
    Well {
        /// Well identifier from the layout
        well: String,
        /// Underlying failure
        #[source]
        source: Box<Error>,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV reader/writer error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Reference image could not be read
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

impl Error {
    /// Attach a well identifier to a per-well failure.
    #[must_use]
    pub fn for_well(self, well: impl Into<String>) -> Self {
        Self::Well {
            well: well.into(),
            source: Box::new(self),
        }
    }

    /// Build a [`Error::MalformedInput`] for `path`.
    pub fn malformed(path: impl AsRef<std::path::Path>, reason: impl Into<String>) -> Self {
        Self::MalformedInput {
            path: path.as_ref().display().to_string(),
            reason: reason.into(),
        }
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}
