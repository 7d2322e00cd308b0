//! Dense patch extraction from label / mask planes.
//!
//! Every pixel that is foreground in both the label and the mask is a positive
//! centre; every pixel that is background in the label but foreground in the
//! mask is a negative centre. Centres are collected in row-major order and
//! those whose window would leave the image are dropped.

use image::{imageops, GrayImage, RgbImage};
use tracing::debug;
use vessel_core::{Error, PatchCenter, PatchGeometry, Result};

use crate::sample::Sample;

/// In-bounds patch centres of one sample, split by class
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Candidates {
    pub positives: Vec<PatchCenter>,
    pub negatives: Vec<PatchCenter>,
    /// Centres dropped because their window exceeded the image
    pub out_of_bounds: usize,
}

impl Candidates {
    /// True when either class has no candidate at all
    pub fn is_one_sided(&self) -> bool {
        self.positives.is_empty() || self.negatives.is_empty()
    }
}

/// Extracts fixed-size windows around labelled centres
#[derive(Debug, Clone, Copy)]
pub struct PatchExtractor {
    geometry: PatchGeometry,
}

impl PatchExtractor {
    pub fn new(geometry: PatchGeometry) -> Self {
        Self { geometry }
    }

    pub fn geometry(&self) -> PatchGeometry {
        self.geometry
    }

    /// Scans `label` and `mask` for positive and negative centres.
    pub fn candidates(&self, label: &GrayImage, mask: &GrayImage) -> Candidates {
        let (width, height) = label.dimensions();
        let mut candidates = Candidates::default();

        for (x, y, m) in mask.enumerate_pixels() {
            if m[0] == 0 {
                continue;
            }
            let center = PatchCenter::new(y, x);
            if self.geometry.origin(center, width, height).is_none() {
                candidates.out_of_bounds += 1;
                continue;
            }
            if label.get_pixel(x, y)[0] != 0 {
                candidates.positives.push(center);
            } else {
                candidates.negatives.push(center);
            }
        }

        debug!(
            "Found {} positive / {} negative centres ({} out of bounds)",
            candidates.positives.len(),
            candidates.negatives.len(),
            candidates.out_of_bounds
        );
        candidates
    }

    /// Crops the window centred at `center`.
    ///
    /// Fails with [`Error::BoundaryPatch`] if the window leaves the image.
    pub fn crop(&self, image: &RgbImage, center: PatchCenter) -> Result<RgbImage> {
        let (width, height) = image.dimensions();
        let (x, y) = self
            .geometry
            .origin(center, width, height)
            .ok_or(Error::BoundaryPatch {
                row: center.row,
                col: center.col,
            })?;
        let side = self.geometry.window();
        Ok(imageops::crop_imm(image, x, y, side, side).to_image())
    }

    /// Crops every candidate of `sample`, returning (positives, negatives).
    pub fn extract_patches(&self, sample: &Sample) -> Result<(Vec<RgbImage>, Vec<RgbImage>)> {
        let candidates = self.candidates(&sample.label, &sample.mask);
        let crop_all = |centers: &[PatchCenter]| -> Result<Vec<RgbImage>> {
            centers.iter().map(|&c| self.crop(&sample.image, c)).collect()
        };
        Ok((crop_all(&candidates.positives)?, crop_all(&candidates.negatives)?))
    }
}
