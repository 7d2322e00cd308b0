//! Core type definitions for the vessel patch pipeline.

use serde::{Deserialize, Serialize};

/// Binary class of a patch centre
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum PatchClass {
    /// Background (label pixel is zero)
    Negative,
    /// Vessel (label pixel is foreground)
    Positive,
}

impl PatchClass {
    /// One-hot encoding: `[1, 0]` for negatives, `[0, 1]` for positives
    pub fn one_hot(self) -> [f32; 2] {
        match self {
            PatchClass::Negative => [1.0, 0.0],
            PatchClass::Positive => [0.0, 1.0],
        }
    }

    /// Decodes a one-hot vector, returning `None` for anything else
    pub fn from_one_hot(v: [f32; 2]) -> Option<Self> {
        match v {
            [a, b] if a == 1.0 && b == 0.0 => Some(PatchClass::Negative),
            [a, b] if a == 0.0 && b == 1.0 => Some(PatchClass::Positive),
            _ => None,
        }
    }
}

impl std::fmt::Display for PatchClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PatchClass::Negative => write!(f, "negative"),
            PatchClass::Positive => write!(f, "positive"),
        }
    }
}

/// Pixel coordinate of a patch centre, in (row, column) order
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct PatchCenter {
    pub row: u32,
    pub col: u32,
}

impl PatchCenter {
    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }
}

/// Window geometry derived from the nominal patch size.
///
/// The window spans `[c - pad, c + pad - 1)` on each axis with
/// `pad = ceil(patch_size / 2)`, so its side is `2 * pad - 1`: odd sizes keep
/// their side, even sizes lose one pixel.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PatchGeometry {
    pub patch_size: u32,
}

impl PatchGeometry {
    pub fn new(patch_size: u32) -> Self {
        Self { patch_size }
    }

    /// Half-width used to offset the window start from its centre
    pub fn pad(&self) -> u32 {
        self.patch_size.div_ceil(2)
    }

    /// Side length of the extracted window
    pub fn window(&self) -> u32 {
        (2 * self.pad()).saturating_sub(1)
    }

    /// Top-left corner of the window centred at `center`, if it lies inside a
    /// `width x height` image.
    pub fn origin(&self, center: PatchCenter, width: u32, height: u32) -> Option<(u32, u32)> {
        let pad = self.pad();
        let fits = |c: u32, extent: u32| c >= pad && c + pad - 1 <= extent;
        if fits(center.row, height) && fits(center.col, width) {
            Some((center.col - pad, center.row - pad))
        } else {
            None
        }
    }
}

impl Default for PatchGeometry {
    fn default() -> Self {
        Self::new(27)
    }
}
