//! Randomised augmentation of label / mask / image triples.
//!
//! Parameters are drawn once per sample into [`AugmentParams`] and then applied
//! to all three planes, so the geometric transforms stay co-registered.
//! Order: rescale, rotate, flip, gamma (image only), then the label is
//! re-binarised to undo interpolation blur.

use image::{imageops, GrayImage, Luma, RgbImage};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;
use vessel_core::{AugmentationConfig, Result};

use crate::pixels::{self, Plane};
use crate::sample::Sample;

/// One draw of augmentation parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AugmentParams {
    /// Rescale factor applied to both axes
    pub scale: f32,
    /// Counter-clockwise rotation in whole degrees
    pub angle: i32,
    pub flip_horizontal: bool,
    pub flip_vertical: bool,
    /// Power-law exponent for the image intensities
    pub gamma: f32,
}

impl AugmentParams {
    /// Parameters that leave a sample unchanged
    pub fn identity() -> Self {
        Self {
            scale: 1.0,
            angle: 0,
            flip_horizontal: false,
            flip_vertical: false,
            gamma: 1.0,
        }
    }
}

/// Augmenter for co-registered sample triples
#[derive(Debug, Clone)]
pub struct Augmenter {
    config: AugmentationConfig,
}

impl Augmenter {
    /// Creates a new augmenter with the given configuration
    pub fn new(config: AugmentationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AugmentationConfig {
        &self.config
    }

    /// Draws a parameter set from `rng`.
    ///
    /// Draw order is fixed: scale, angle, horizontal flip, vertical flip,
    /// gamma.
    pub fn sample_params<R: Rng + ?Sized>(&self, rng: &mut R) -> AugmentParams {
        let (scale_lo, scale_hi) = self.config.scale_range;
        let (gamma_lo, gamma_hi) = self.config.gamma_range;
        let max_angle = self.config.max_rotation_degrees;

        let scale = rng.gen_range(scale_lo..=scale_hi);
        let angle = rng.gen_range(-max_angle..=max_angle);
        let flip_horizontal = rng.gen_bool(0.5) && self.config.horizontal_flip;
        let flip_vertical = rng.gen_bool(0.5) && self.config.vertical_flip;
        let gamma = rng.gen_range(gamma_lo..=gamma_hi);

        AugmentParams {
            scale,
            angle,
            flip_horizontal,
            flip_vertical,
            gamma,
        }
    }

    /// Draws parameters and applies them to `sample`
    pub fn augment<R: Rng + ?Sized>(&self, sample: Sample, rng: &mut R) -> Result<Sample> {
        let params = self.sample_params(rng);
        debug!("Augmenting '{}' with {:?}", sample.name, params);
        self.apply(sample, &params)
    }

    /// Applies a fixed parameter set: geometry on all planes, gamma on the
    /// image, then label re-binarisation.
    pub fn apply(&self, sample: Sample, params: &AugmentParams) -> Result<Sample> {
        let Sample {
            name,
            label,
            mask,
            image,
        } = apply_geometry(sample, params)?;

        let image = adjust_gamma(&image, params.gamma);
        let label = binarize(&label, self.config.label_threshold);

        Sample::new(name, label, mask, image)
    }
}

impl Default for Augmenter {
    fn default() -> Self {
        Self::new(AugmentationConfig::default())
    }
}

/// Applies the spatial part of `params` (rescale, rotate, flips) to all three
/// planes.
pub fn apply_geometry(sample: Sample, params: &AugmentParams) -> Result<Sample> {
    let Sample {
        name,
        label,
        mask,
        image,
    } = sample;
    Sample::new(
        name,
        transform_plane(&label, params),
        transform_plane(&mask, params),
        transform_plane(&image, params),
    )
}

fn transform_plane<P>(plane: &Plane<P>, params: &AugmentParams) -> Plane<P>
where
    P: image::Pixel<Subpixel = u8>,
{
    let mut out = if params.scale != 1.0 {
        pixels::rescale(plane, params.scale)
    } else {
        plane.clone()
    };
    if params.angle != 0 {
        out = pixels::rotate(&out, params.angle as f32);
    }
    if params.flip_horizontal {
        imageops::flip_horizontal_in_place(&mut out);
    }
    if params.flip_vertical {
        imageops::flip_vertical_in_place(&mut out);
    }
    out
}

/// Power-law correction `255 * (v / 255)^gamma` on every channel
pub fn adjust_gamma(image: &RgbImage, gamma: f32) -> RgbImage {
    let lut: [u8; 256] = std::array::from_fn(|v| {
        ((v as f32 / 255.0).powf(gamma) * 255.0)
            .round()
            .clamp(0.0, 255.0) as u8
    });
    let mut out = image.clone();
    for value in out.iter_mut() {
        *value = lut[*value as usize];
    }
    out
}

/// Pixels above `threshold` of full scale become 255, everything else 0
pub fn binarize(label: &GrayImage, threshold: f32) -> GrayImage {
    GrayImage::from_fn(label.width(), label.height(), |x, y| {
        let v = f32::from(label.get_pixel(x, y)[0]) / 255.0;
        Luma([if v > threshold { 255 } else { 0 }])
    })
}
