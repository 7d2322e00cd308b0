//! Co-registered label / mask / image triple.

use image::{GrayImage, RgbImage};
use vessel_core::{Error, Result};

/// One training sample: three planes of identical size.
///
/// `label` and `mask` are single-channel 8-bit planes where any nonzero pixel
/// is foreground; `image` is the RGB fundus image.
#[derive(Debug, Clone)]
pub struct Sample {
    /// File name shared by the three planes
    pub name: String,
    pub label: GrayImage,
    pub mask: GrayImage,
    pub image: RgbImage,
}

impl Sample {
    /// Builds a sample, rejecting planes whose dimensions disagree
    pub fn new(
        name: impl Into<String>,
        label: GrayImage,
        mask: GrayImage,
        image: RgbImage,
    ) -> Result<Self> {
        let name = name.into();
        let dims = image.dimensions();
        if label.dimensions() != dims || mask.dimensions() != dims {
            return Err(Error::InvalidArgument(format!(
                "planes of '{}' are not co-registered: label {:?}, mask {:?}, image {:?}",
                name,
                label.dimensions(),
                mask.dimensions(),
                dims
            )));
        }
        Ok(Self {
            name,
            label,
            mask,
            image,
        })
    }

    /// (width, height) shared by all three planes
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matching_planes() {
        let sample = Sample::new(
            "01.png",
            GrayImage::new(8, 6),
            GrayImage::new(8, 6),
            RgbImage::new(8, 6),
        )
        .unwrap();
        assert_eq!(sample.dimensions(), (8, 6));
        assert_eq!(sample.name, "01.png");
    }

    #[test]
    fn test_mismatched_planes() {
        let result = Sample::new(
            "01.png",
            GrayImage::new(8, 6),
            GrayImage::new(6, 8),
            RgbImage::new(8, 6),
        );
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }
}
