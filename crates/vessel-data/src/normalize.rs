//! Per-patch normalisation.
//!
//! Each patch goes through global contrast normalisation of its HSV value
//! channel, a 3x3 Gaussian blur, and a min-max rescale to `[0, 1]` floats.
//! Degenerate inputs (constant value channel, flat patch) are reported as
//! tagged outcomes and fall back to a pass-through instead of dividing by zero.

use image::{Rgb, RgbImage};
use imageproc::filter::filter3x3;
use palette::{FromColor, Hsv, Srgb};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// `[1 2 1]^T [1 2 1] / 16`
const GAUSSIAN_3X3: [f32; 9] = [
    0.0625, 0.125, 0.0625, //
    0.125, 0.25, 0.125, //
    0.0625, 0.125, 0.0625,
];

/// Result of global contrast normalisation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContrastOutcome {
    /// Value channel was standardised and stretched
    Normalized,
    /// Value channel had zero variance; patch returned unchanged
    Degenerate,
}

/// Result of the float rescale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RangeOutcome {
    Scaled,
    /// min == max; every value maps to 0
    Flat,
}

/// Normalises patches into `[0, 1]` float tensors in HWC order
#[derive(Debug, Clone, Copy)]
pub struct PatchNormalizer {
    /// Apply the 3x3 blur after contrast normalisation
    pub blur: bool,
}

impl PatchNormalizer {
    pub fn new() -> Self {
        Self { blur: true }
    }

    /// Full pipeline for one patch, returning `h * w * 3` floats
    pub fn normalize(&self, patch: &RgbImage) -> Vec<f32> {
        let (contrasted, outcome) = global_contrast(patch);
        if outcome == ContrastOutcome::Degenerate {
            debug!("Constant value channel, skipping contrast normalisation");
        }
        let smoothed = if self.blur {
            blur3x3(&contrasted)
        } else {
            contrasted
        };
        let values: Vec<f32> = smoothed.as_raw().iter().map(|&v| f32::from(v)).collect();
        let (scaled, outcome) = to_unit_range(&values);
        if outcome == RangeOutcome::Flat {
            debug!("Flat patch, mapping every value to 0");
        }
        scaled
    }
}

impl Default for PatchNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Standardises the HSV value channel, stretches it back to full range and
/// converts to RGB. Hue and saturation are kept.
pub fn global_contrast(patch: &RgbImage) -> (RgbImage, ContrastOutcome) {
    let hsv: Vec<Hsv> = patch
        .pixels()
        .map(|p| Hsv::from_color(Srgb::new(p[0], p[1], p[2]).into_format::<f32>()))
        .collect();
    if hsv.is_empty() {
        return (patch.clone(), ContrastOutcome::Degenerate);
    }

    let n = hsv.len() as f64;
    let mean = hsv.iter().map(|c| f64::from(c.value)).sum::<f64>() / n;
    let variance = hsv
        .iter()
        .map(|c| (f64::from(c.value) - mean).powi(2))
        .sum::<f64>()
        / n;
    let std = variance.sqrt();
    if std < 1e-9 {
        return (patch.clone(), ContrastOutcome::Degenerate);
    }

    let z: Vec<f64> = hsv.iter().map(|c| (f64::from(c.value) - mean) / std).collect();
    let (z_min, z_max) = z
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    let span = z_max - z_min;

    let mut out = RgbImage::new(patch.width(), patch.height());
    for ((pixel, mut color), zv) in out.pixels_mut().zip(hsv).zip(z) {
        color.value = ((zv - z_min) / span) as f32;
        let rgb: Srgb<u8> = Srgb::<f32>::from_color(color).into_format();
        *pixel = Rgb([rgb.red, rgb.green, rgb.blue]);
    }
    (out, ContrastOutcome::Normalized)
}

/// 3x3 Gaussian blur, edges clamped
pub fn blur3x3(image: &RgbImage) -> RgbImage {
    filter3x3::<_, f32, u8>(image, &GAUSSIAN_3X3)
}

/// Linearly maps the observed `[min, max]` of `values` onto `[0, 1]`
pub fn to_unit_range(values: &[f32]) -> (Vec<f32>, RangeOutcome) {
    let (min, max) = values
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    if values.is_empty() || max <= min {
        return (vec![0.0; values.len()], RangeOutcome::Flat);
    }
    let span = max - min;
    (
        values.iter().map(|&v| (v - min) / span).collect(),
        RangeOutcome::Scaled,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn textured_patch() -> RgbImage {
        RgbImage::from_fn(9, 9, |x, y| {
            let v = (60 + x * 7 + y * 3) as u8;
            Rgb([v / 2, v, v / 3])
        })
    }

    #[test]
    fn test_contrast_stretches_value_channel() {
        let (out, outcome) = global_contrast(&textured_patch());
        assert_eq!(outcome, ContrastOutcome::Normalized);

        let values: Vec<u8> = out.pixels().map(|p| p[0].max(p[1]).max(p[2])).collect();
        assert_eq!(values.iter().copied().min(), Some(0));
        assert_eq!(values.iter().copied().max(), Some(255));
    }

    #[test]
    fn test_contrast_is_idempotent() {
        let (once, _) = global_contrast(&textured_patch());
        let (twice, _) = global_contrast(&once);
        for (a, b) in once.pixels().zip(twice.pixels()) {
            for c in 0..3 {
                assert!((a[c] as i32 - b[c] as i32).abs() <= 1, "{:?} vs {:?}", a, b);
            }
        }
    }

    #[test]
    fn test_contrast_constant_patch() {
        let patch = RgbImage::from_pixel(5, 5, Rgb([90, 40, 10]));
        let (out, outcome) = global_contrast(&patch);
        assert_eq!(outcome, ContrastOutcome::Degenerate);
        assert_eq!(out, patch);
    }

    #[test]
    fn test_unit_range() {
        let (values, outcome) = to_unit_range(&[10.0, 20.0, 30.0]);
        assert_eq!(outcome, RangeOutcome::Scaled);
        assert_eq!(values, vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn test_unit_range_flat() {
        let (values, outcome) = to_unit_range(&[7.0; 4]);
        assert_eq!(outcome, RangeOutcome::Flat);
        assert_eq!(values, vec![0.0; 4]);
    }

    #[test]
    fn test_unit_range_idempotent() {
        let (once, _) = to_unit_range(&[3.0, -1.0, 0.5, 2.0, 1.25]);
        let (twice, _) = to_unit_range(&once);
        for (a, b) in once.iter().zip(&twice) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn test_blur_preserves_constant() {
        let patch = RgbImage::from_pixel(6, 6, Rgb([40, 80, 120]));
        assert_eq!(blur3x3(&patch), patch);
    }

    #[test]
    fn test_blur_spreads_impulse() {
        let mut patch = RgbImage::new(5, 5);
        patch.put_pixel(2, 2, Rgb([160, 0, 0]));
        let blurred = blur3x3(&patch);
        assert_eq!(blurred.get_pixel(2, 2)[0], 40);
        assert_eq!(blurred.get_pixel(1, 2)[0], 20);
        assert_eq!(blurred.get_pixel(1, 1)[0], 10);
        assert_eq!(blurred.get_pixel(0, 0)[0], 0);
        assert_eq!(blurred.get_pixel(2, 2)[1], 0);
    }

    #[test]
    fn test_contrast_keeps_hue() {
        // pure red stays red after stretching
        let patch = RgbImage::from_fn(4, 4, |x, y| Rgb([(40 + x * 30 + y * 10) as u8, 0, 0]));
        let (out, _) = global_contrast(&patch);
        assert!(out.pixels().all(|p| p[1] == 0 && p[2] == 0));
        assert_eq!(out.pixels().map(|p| p[0]).max(), Some(255));
    }

    #[test]
    fn test_normalize_output_shape_and_range() {
        let normalized = PatchNormalizer::new().normalize(&textured_patch());
        assert_eq!(normalized.len(), 9 * 9 * 3);
        assert!(normalized.iter().all(|v| (0.0..=1.0).contains(v)));
        assert!(normalized.iter().any(|&v| v == 0.0));
        assert!(normalized.iter().any(|&v| v == 1.0));
    }

    #[test]
    fn test_normalize_constant_patch() {
        let patch = RgbImage::from_pixel(5, 5, Rgb([128, 128, 128]));
        let normalized = PatchNormalizer::new().normalize(&patch);
        assert!(normalized.iter().all(|&v| v == 0.0));
    }
}
