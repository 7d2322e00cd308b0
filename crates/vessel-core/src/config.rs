//! Configuration structures for the vessel patch pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::types::PatchGeometry;

/// Configuration of a data provider
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Root directory holding `image/`, `label/` and `mask/`
    pub data_dir: PathBuf,
    /// Whether to augment samples before extraction
    pub is_training: bool,
    /// Nominal patch side
    pub patch_size: u32,
    /// Fraction of negative candidates kept per sample
    pub undersample_ratio: f64,
    /// Random seed for reproducibility (entropy when unset)
    pub seed: Option<u64>,
    /// Skip samples whose mask yields no usable region of interest
    pub skip_invalid_roi: bool,
    /// Augmentation parameters, used only when `is_training` is set
    pub augmentation: AugmentationConfig,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data/train"),
            is_training: false,
            patch_size: 27,
            undersample_ratio: 0.3,
            seed: None,
            skip_invalid_roi: false,
            augmentation: AugmentationConfig::default(),
        }
    }
}

impl ProviderConfig {
    /// Creates a configuration rooted at `data_dir` with default parameters
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    pub fn with_training(mut self, is_training: bool) -> Self {
        self.is_training = is_training;
        self
    }

    pub fn with_patch_size(mut self, patch_size: u32) -> Self {
        self.patch_size = patch_size;
        self
    }

    pub fn with_undersample_ratio(mut self, ratio: f64) -> Self {
        self.undersample_ratio = ratio;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Window geometry for the configured patch size
    pub fn geometry(&self) -> PatchGeometry {
        PatchGeometry::new(self.patch_size)
    }

    /// Validates parameter ranges
    pub fn validate(&self) -> Result<()> {
        if self.patch_size == 0 {
            return Err(Error::Config("patch_size must be at least 1".to_string()));
        }
        if !(0.0..=1.0).contains(&self.undersample_ratio) {
            return Err(Error::Config(format!(
                "undersample_ratio must lie in [0, 1], got {}",
                self.undersample_ratio
            )));
        }
        self.augmentation.validate()
    }
}

/// Randomised augmentation ranges
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AugmentationConfig {
    /// Uniform range of the rescale factor
    pub scale_range: (f32, f32),
    /// Rotation angle is drawn from `[-max, max]` whole degrees
    pub max_rotation_degrees: i32,
    /// Coin-flip horizontal mirroring
    pub horizontal_flip: bool,
    /// Coin-flip vertical mirroring
    pub vertical_flip: bool,
    /// Uniform range of the gamma exponent
    pub gamma_range: (f32, f32),
    /// Label pixels above this fraction of full scale become foreground
    pub label_threshold: f32,
}

impl Default for AugmentationConfig {
    fn default() -> Self {
        Self {
            scale_range: (0.7, 1.2),
            max_rotation_degrees: 90,
            horizontal_flip: true,
            vertical_flip: true,
            gamma_range: (0.25, 4.0),
            label_threshold: 0.01,
        }
    }
}

impl AugmentationConfig {
    /// Validates that ranges are ordered and positive
    pub fn validate(&self) -> Result<()> {
        check_range("scale_range", self.scale_range)?;
        check_range("gamma_range", self.gamma_range)?;
        if self.max_rotation_degrees < 0 {
            return Err(Error::Config(format!(
                "max_rotation_degrees must be non-negative, got {}",
                self.max_rotation_degrees
            )));
        }
        if !(0.0..1.0).contains(&self.label_threshold) {
            return Err(Error::Config(format!(
                "label_threshold must lie in [0, 1), got {}",
                self.label_threshold
            )));
        }
        Ok(())
    }
}

fn check_range(name: &str, (lo, hi): (f32, f32)) -> Result<()> {
    if !(lo > 0.0 && lo <= hi && hi.is_finite()) {
        return Err(Error::Config(format!(
            "{} must satisfy 0 < min <= max, got ({}, {})",
            name, lo, hi
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_provider_config() {
        let config = ProviderConfig::default();
        assert_eq!(config.patch_size, 27);
        assert_eq!(config.undersample_ratio, 0.3);
        assert!(!config.is_training);
        assert!(config.seed.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_augmentation_config() {
        let config = AugmentationConfig::default();
        assert_eq!(config.scale_range, (0.7, 1.2));
        assert_eq!(config.max_rotation_degrees, 90);
        assert_eq!(config.gamma_range, (0.25, 4.0));
    }

    #[test]
    fn test_ratio_validation() {
        let config = ProviderConfig::default().with_undersample_ratio(1.5);
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let config = ProviderConfig::default().with_undersample_ratio(0.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_range_validation() {
        let mut config = AugmentationConfig::default();
        config.gamma_range = (4.0, 0.25);
        assert!(config.validate().is_err());

        let mut config = AugmentationConfig::default();
        config.scale_range = (0.0, 1.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: ProviderConfig =
            toml::from_str("data_dir = \"/data/drive\"\nis_training = true\n").unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/data/drive"));
        assert!(config.is_training);
        assert_eq!(config.patch_size, 27);
        assert_eq!(config.augmentation.max_rotation_degrees, 90);
    }
}
