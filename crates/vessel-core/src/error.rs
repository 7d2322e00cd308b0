//! Error types for the vessel patch pipeline.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for the patch pipeline.
#[derive(Error, Debug)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// An image file is missing, unreadable or not decodable
    #[error("Failed to decode image at '{0}': {1}")]
    Decode(PathBuf, String),

    /// Mask plane has no foreground pixels
    #[error("Mask '{0}' has no foreground pixels")]
    EmptyMask(String),

    /// Region of interest collapsed to a non-positive radius
    #[error("Region of interest radius {radius} is not positive")]
    InvalidRoi { radius: i64 },

    /// Patch window centred at (row, col) leaves the image
    #[error("Patch window at row {row}, col {col} exceeds image bounds")]
    BoundaryPatch { row: u32, col: u32 },

    /// A sample produced no candidates for one of the classes
    #[error("'{file}' yielded {positives} positive and {negatives} negative candidates")]
    EmptyCandidateSet {
        file: String,
        positives: usize,
        negatives: usize,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid argument error
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Not found error
    #[error("Not found: {0}")]
    NotFound(String),

    /// Array shape error while stacking batches
    #[error("Shape error: {0}")]
    Shape(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether the error describes a sample whose mask cannot yield a usable
    /// region of interest.
    pub fn is_roi_error(&self) -> bool {
        matches!(self, Error::EmptyMask(_) | Error::InvalidRoi { .. })
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Error::Decode(PathBuf::new(), err.to_string())
    }
}

impl From<ndarray::ShapeError> for Error {
    fn from(err: ndarray::ShapeError) -> Self {
        Error::Shape(err.to_string())
    }
}

/// Specialized Result type for patch pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;
