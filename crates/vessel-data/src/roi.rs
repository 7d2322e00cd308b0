//! Circular region of interest derived from a fundus mask.
//!
//! The disk is centred on the middle of the mask plane, not on the mask's own
//! bounding box. Its radius is half the smaller bounding-box extent, shrunk by
//! the patch size so that sampled windows stay inside the field of view.

use image::{GrayImage, Luma};
use imageproc::drawing::draw_filled_circle_mut;
use serde::{Deserialize, Serialize};
use vessel_core::{Error, Result};

/// Disk inside which patch centres may be sampled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionOfInterest {
    /// Centre as (x, y)
    pub center: (u32, u32),
    pub radius: u32,
}

/// Axis-aligned bounds of the nonzero pixels of a plane
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForegroundBounds {
    pub row_min: u32,
    pub row_max: u32,
    pub col_min: u32,
    pub col_max: u32,
}

impl ForegroundBounds {
    /// Bounds of all nonzero pixels, or `None` for an empty plane
    pub fn of(plane: &GrayImage) -> Option<Self> {
        plane
            .enumerate_pixels()
            .filter(|(_, _, p)| p[0] != 0)
            .fold(None, |acc: Option<Self>, (x, y, _)| {
                Some(match acc {
                    None => Self {
                        row_min: y,
                        row_max: y,
                        col_min: x,
                        col_max: x,
                    },
                    Some(b) => Self {
                        row_min: b.row_min.min(y),
                        row_max: b.row_max.max(y),
                        col_min: b.col_min.min(x),
                        col_max: b.col_max.max(x),
                    },
                })
            })
    }
}

impl RegionOfInterest {
    /// Computes the region from a stretched mask plane.
    ///
    /// Fails with [`Error::EmptyMask`] when the mask has no foreground and with
    /// [`Error::InvalidRoi`] when the shrunk radius is not positive.
    pub fn from_mask(mask: &GrayImage, name: &str, patch_size: u32) -> Result<Self> {
        let bounds = ForegroundBounds::of(mask).ok_or_else(|| Error::EmptyMask(name.to_string()))?;

        let half_rows = i64::from((bounds.row_max - bounds.row_min) / 2);
        let half_cols = i64::from((bounds.col_max - bounds.col_min) / 2);
        let radius = half_rows.min(half_cols) - i64::from(patch_size);
        if radius <= 0 {
            return Err(Error::InvalidRoi { radius });
        }

        Ok(Self {
            center: (mask.width() / 2, mask.height() / 2),
            radius: radius as u32,
        })
    }

    /// Draws the filled disk (255 inside, 0 outside) on a fresh plane
    pub fn rasterize(&self, width: u32, height: u32) -> GrayImage {
        let mut plane = GrayImage::new(width, height);
        draw_filled_circle_mut(
            &mut plane,
            (self.center.0 as i32, self.center.1 as i32),
            self.radius as i32,
            Luma([255u8]),
        );
        plane
    }
}
