//! Image loading for the `image/`, `label/` and `mask/` directories.
//!
//! The three directories hold PNG files with identical names. Labels and masks
//! are decoded as single-channel intensity and stretched to fill `[0, 255]`;
//! images are decoded as RGB.

use std::path::{Path, PathBuf};

use image::{GrayImage, Luma, RgbImage};
use tracing::{debug, info};
use vessel_core::{Error, Result};
use walkdir::WalkDir;

pub const IMAGE_DIR: &str = "image";
pub const LABEL_DIR: &str = "label";
pub const MASK_DIR: &str = "mask";

/// Read-only view of a dataset directory
#[derive(Debug, Clone)]
pub struct ImageStore {
    /// Root directory containing the three plane directories
    root_dir: PathBuf,
    /// PNG file names found in `image/`, sorted
    file_names: Vec<String>,
}

impl ImageStore {
    /// Opens a dataset root and checks that every image has a label and a mask.
    pub fn open(root_dir: impl Into<PathBuf>) -> Result<Self> {
        let root_dir = root_dir.into();
        info!("Opening vessel dataset at {}", root_dir.display());

        for dir in [IMAGE_DIR, LABEL_DIR, MASK_DIR] {
            let full_dir = root_dir.join(dir);
            if !full_dir.is_dir() {
                return Err(Error::NotFound(format!(
                    "Directory not found: {}",
                    full_dir.display()
                )));
            }
        }

        let mut file_names = Vec::new();
        for entry in WalkDir::new(root_dir.join(IMAGE_DIR))
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !path.is_file() || !is_png(path) {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                file_names.push(name.to_string());
            }
        }
        file_names.sort();

        for name in &file_names {
            for dir in [LABEL_DIR, MASK_DIR] {
                if !root_dir.join(dir).join(name).is_file() {
                    return Err(Error::Config(format!(
                        "'{}' has no counterpart in {}/",
                        name, dir
                    )));
                }
            }
        }

        info!("Found {} samples", file_names.len());

        Ok(Self {
            root_dir,
            file_names,
        })
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// Sample file names in sorted order
    pub fn file_names(&self) -> &[String] {
        &self.file_names
    }

    pub fn len(&self) -> usize {
        self.file_names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.file_names.is_empty()
    }

    /// Path of `name` inside the plane directory `dir`
    pub fn plane_path(&self, dir: &str, name: &str) -> PathBuf {
        self.root_dir.join(dir).join(name)
    }

    /// Loads a label plane, stretched to `[0, 255]`
    pub fn read_label(&self, name: &str) -> Result<GrayImage> {
        let raw = decode(&self.plane_path(LABEL_DIR, name))?.to_luma8();
        Ok(stretch_to_full_range(&raw))
    }

    /// Loads a raw mask plane, stretched to `[0, 255]`
    pub fn read_mask(&self, name: &str) -> Result<GrayImage> {
        let raw = decode(&self.plane_path(MASK_DIR, name))?.to_luma8();
        Ok(stretch_to_full_range(&raw))
    }

    /// Loads the colour image in RGB channel order
    pub fn read_image(&self, name: &str) -> Result<RgbImage> {
        Ok(decode(&self.plane_path(IMAGE_DIR, name))?.to_rgb8())
    }
}

fn is_png(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case("png"))
        .unwrap_or(false)
}

fn decode(path: &Path) -> Result<image::DynamicImage> {
    debug!("Decoding {}", path.display());
    image::open(path).map_err(|e| Error::Decode(path.to_path_buf(), e.to_string()))
}

/// Linearly maps the observed `[min, max]` of a plane onto `[0, 255]`.
///
/// A constant plane maps to all zeros.
pub fn stretch_to_full_range(plane: &GrayImage) -> GrayImage {
    let (min, max) = plane
        .pixels()
        .fold((u8::MAX, u8::MIN), |(lo, hi), p| (lo.min(p[0]), hi.max(p[0])));
    if max <= min {
        return GrayImage::new(plane.width(), plane.height());
    }
    let scale = 255.0 / f32::from(max - min);
    GrayImage::from_fn(plane.width(), plane.height(), |x, y| {
        let v = f32::from(plane.get_pixel(x, y)[0] - min) * scale;
        Luma([v.round().clamp(0.0, 255.0) as u8])
    })
}
