//! Balanced patch batches for retinal vessel segmentation.
//!
//! Reads image / label / mask triples from a dataset directory, derives a
//! circular region of interest from each mask, optionally augments the sample,
//! and cuts class-balanced, normalised patches around labelled pixels.

pub mod augmentation;
pub mod balance;
pub mod cursor;
pub mod extract;
pub mod normalize;
pub mod pixels;
pub mod provider;
pub mod roi;
pub mod sample;
pub mod store;

pub use augmentation::{AugmentParams, Augmenter};
pub use balance::{ClassBalancer, Labeled};
pub use cursor::FileCursor;
pub use extract::{Candidates, PatchExtractor};
pub use normalize::PatchNormalizer;
pub use provider::{BatchSummary, DataProvider, PatchBatch};
pub use roi::RegionOfInterest;
pub use sample::Sample;
pub use store::ImageStore;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::augmentation::*;
    pub use crate::balance::*;
    pub use crate::extract::*;
    pub use crate::normalize::*;
    pub use crate::provider::*;
    pub use crate::roi::*;
    pub use crate::sample::*;
    pub use crate::store::*;
}
