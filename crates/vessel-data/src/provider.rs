//! Batch assembly across the files of an epoch.
//!
//! A call draws `files_per_call` samples from the file cursor, optionally
//! augments each one, extracts candidate centres, balances them into a per-file
//! quota, crops the chosen windows, normalises every patch and stacks the
//! result into `[N, S, S, 3]` patches and `[N, 2]` one-hot labels.

use image::RgbImage;
use ndarray::{Array2, Array4};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use vessel_core::{Error, PatchClass, ProviderConfig, Result};

use crate::augmentation::Augmenter;
use crate::balance::{ClassBalancer, Labeled};
use crate::cursor::FileCursor;
use crate::extract::PatchExtractor;
use crate::normalize::PatchNormalizer;
use crate::roi::RegionOfInterest;
use crate::sample::Sample;
use crate::store::ImageStore;

/// Stacked patches and their one-hot labels
#[derive(Debug, Clone)]
pub struct PatchBatch {
    /// `[N, S, S, 3]`, values in `[0, 1]`
    pub patches: Array4<f32>,
    /// `[N, 2]`, rows are `[1, 0]` (negative) or `[0, 1]` (positive)
    pub labels: Array2<f32>,
}

impl PatchBatch {
    pub fn len(&self) -> usize {
        self.labels.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Shape of a single patch as (height, width, channels)
    pub fn patch_shape(&self) -> [usize; 3] {
        let shape = self.patches.shape();
        [shape[1], shape[2], shape[3]]
    }

    /// Class of row `i`
    pub fn class(&self, i: usize) -> Option<PatchClass> {
        let row = self.labels.row(i);
        PatchClass::from_one_hot([row[0], row[1]])
    }

    pub fn summary(&self) -> BatchSummary {
        let positives = (0..self.len())
            .filter(|&i| self.class(i) == Some(PatchClass::Positive))
            .count();
        BatchSummary {
            num_patches: self.len(),
            positives,
            negatives: self.len() - positives,
            patch_shape: self.patch_shape(),
        }
    }
}

/// Class counts and shape of a batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub num_patches: usize,
    pub positives: usize,
    pub negatives: usize,
    pub patch_shape: [usize; 3],
}

/// Produces balanced, normalised patch batches from a dataset directory.
///
/// Not meant to be shared across threads: each provider owns its file cursor
/// and random generator.
pub struct DataProvider {
    config: ProviderConfig,
    store: ImageStore,
    cursor: FileCursor,
    augmenter: Augmenter,
    extractor: PatchExtractor,
    balancer: ClassBalancer,
    normalizer: PatchNormalizer,
    rng: ChaCha8Rng,
}

impl DataProvider {
    /// Validates `config`, opens the dataset and seeds the generator
    pub fn new(config: ProviderConfig) -> Result<Self> {
        config.validate()?;
        let store = ImageStore::open(&config.data_dir)?;
        if store.is_empty() {
            return Err(Error::NotFound(format!(
                "No PNG samples in {}",
                store.root_dir().display()
            )));
        }
        info!("The number of input samples: {}", store.len());

        let mut rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        let cursor = FileCursor::new(store.file_names().to_vec(), &mut rng);

        Ok(Self {
            augmenter: Augmenter::new(config.augmentation.clone()),
            extractor: PatchExtractor::new(config.geometry()),
            balancer: ClassBalancer::new(config.undersample_ratio),
            normalizer: PatchNormalizer::new(),
            config,
            store,
            cursor,
            rng,
        })
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    pub fn store(&self) -> &ImageStore {
        &self.store
    }

    pub fn cursor(&self) -> &FileCursor {
        &self.cursor
    }

    /// Files visited per call: one fewer than the dataset holds, at least one
    pub fn files_per_call(&self) -> usize {
        self.store.len().saturating_sub(1).max(1)
    }

    /// Loads the planes of `name`, replacing the mask by its region-of-interest
    /// disk.
    pub fn load_sample(&self, name: &str) -> Result<Sample> {
        let label = self.store.read_label(name)?;
        let mask = self.store.read_mask(name)?;
        let roi = RegionOfInterest::from_mask(&mask, name, self.config.patch_size)?;
        let image = self.store.read_image(name)?;
        debug!("'{}': ROI centre {:?}, radius {}", name, roi.center, roi.radius);
        Sample::new(name, label, roi.rasterize(mask.width(), mask.height()), image)
    }

    /// Assembles a batch of roughly `n` patches.
    ///
    /// Each visited file contributes at most `n / files_per_call` patches.
    pub fn sample(&mut self, n: usize) -> Result<PatchBatch> {
        let files = self.files_per_call();
        let batch_size = n / files;

        let mut patches: Vec<RgbImage> = Vec::new();
        let mut classes: Vec<PatchClass> = Vec::new();

        for _ in 0..files {
            let name = self
                .cursor
                .next(&mut self.rng)
                .ok_or_else(|| Error::NotFound("file cursor is empty".to_string()))?;

            for Labeled { item, class } in self.draw_from_file(&name, batch_size)? {
                patches.push(item);
                classes.push(class);
            }
        }

        let batch = self.stack(&patches, &classes)?;
        let summary = batch.summary();
        info!(
            "Assembled {} patches ({} positive, {} negative) from {} files",
            summary.num_patches, summary.positives, summary.negatives, files
        );
        Ok(batch)
    }

    /// Balanced, cropped patches of one file
    fn draw_from_file(&mut self, name: &str, batch_size: usize) -> Result<Vec<Labeled<RgbImage>>> {
        let sample = match self.load_sample(name) {
            Ok(sample) => sample,
            Err(e) if e.is_roi_error() && self.config.skip_invalid_roi => {
                warn!("Skipping '{}': {}", name, e);
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        };

        let sample = if self.config.is_training {
            self.augmenter.augment(sample, &mut self.rng)?
        } else {
            sample
        };

        let candidates = self.extractor.candidates(&sample.label, &sample.mask);
        if candidates.is_one_sided() {
            let err = Error::EmptyCandidateSet {
                file: name.to_string(),
                positives: candidates.positives.len(),
                negatives: candidates.negatives.len(),
            };
            warn!("{}, contributing no patches", err);
            return Ok(Vec::new());
        }

        let selected = self.balancer.balance(
            &candidates.positives,
            &candidates.negatives,
            batch_size,
            &mut self.rng,
        );

        let mut drawn = Vec::with_capacity(selected.len());
        for Labeled { item: center, class } in selected {
            match self.extractor.crop(&sample.image, center) {
                Ok(item) => drawn.push(Labeled { item, class }),
                Err(e @ Error::BoundaryPatch { .. }) => debug!("Discarding patch: {}", e),
                Err(e) => return Err(e),
            }
        }
        debug!("'{}' contributed {} patches", name, drawn.len());
        Ok(drawn)
    }

    /// Normalises and stacks patches into batch arrays
    fn stack(&self, patches: &[RgbImage], classes: &[PatchClass]) -> Result<PatchBatch> {
        let side = self.extractor.geometry().window() as usize;

        let mut data = Vec::with_capacity(patches.len() * side * side * 3);
        for patch in patches {
            data.extend(self.normalizer.normalize(patch));
        }
        let labels: Vec<f32> = classes.iter().flat_map(|c| c.one_hot()).collect();

        Ok(PatchBatch {
            patches: Array4::from_shape_vec((patches.len(), side, side, 3), data)?,
            labels: Array2::from_shape_vec((classes.len(), 2), labels)?,
        })
    }
}
