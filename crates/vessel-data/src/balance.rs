//! Negative-class undersampling and per-file batch truncation.

use rand::seq::SliceRandom;
use rand::Rng;
use vessel_core::PatchClass;

/// An item paired with its class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Labeled<T> {
    pub item: T,
    pub class: PatchClass,
}

/// Undersamples negatives, labels, shuffles and truncates
#[derive(Debug, Clone, Copy)]
pub struct ClassBalancer {
    undersample_ratio: f64,
}

impl ClassBalancer {
    pub fn new(undersample_ratio: f64) -> Self {
        Self { undersample_ratio }
    }

    pub fn undersample_ratio(&self) -> f64 {
        self.undersample_ratio
    }

    /// Number of negatives kept out of `available`
    pub fn negative_quota(&self, available: usize) -> usize {
        (available as f64 * self.undersample_ratio).round() as usize
    }

    /// Draws `round(len * ratio)` negatives uniformly *with* replacement.
    pub fn undersample<T: Clone, R: Rng + ?Sized>(&self, negatives: &[T], rng: &mut R) -> Vec<T> {
        if negatives.is_empty() {
            return Vec::new();
        }
        (0..self.negative_quota(negatives.len()))
            .map(|_| negatives[rng.gen_range(0..negatives.len())].clone())
            .collect()
    }

    /// Balances one file's candidates into at most `batch_size` labelled items.
    ///
    /// Negatives are undersampled, every item gets its class, the combined list
    /// is shuffled and the first `batch_size` items are kept.
    pub fn balance<T: Clone, R: Rng + ?Sized>(
        &self,
        positives: &[T],
        negatives: &[T],
        batch_size: usize,
        rng: &mut R,
    ) -> Vec<Labeled<T>> {
        let negatives = self.undersample(negatives, rng);

        let mut combined: Vec<Labeled<T>> = positives
            .iter()
            .cloned()
            .map(|item| Labeled {
                item,
                class: PatchClass::Positive,
            })
            .chain(negatives.into_iter().map(|item| Labeled {
                item,
                class: PatchClass::Negative,
            }))
            .collect();

        combined.shuffle(rng);
        combined.truncate(batch_size);
        combined
    }
}

impl Default for ClassBalancer {
    fn default() -> Self {
        Self::new(0.3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn count(items: &[Labeled<u32>], class: PatchClass) -> usize {
        items.iter().filter(|l| l.class == class).count()
    }

    #[test]
    fn test_quota_rounds() {
        assert_eq!(ClassBalancer::new(0.25).negative_quota(400), 100);
        assert_eq!(ClassBalancer::new(0.3).negative_quota(10), 3);
        assert_eq!(ClassBalancer::new(0.3).negative_quota(0), 0);
    }

    #[test]
    fn test_full_ratio_keeps_count() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let negatives: Vec<u32> = (0..50).collect();
        let kept = ClassBalancer::new(1.0).undersample(&negatives, &mut rng);
        assert_eq!(kept.len(), 50);
        assert!(kept.iter().all(|n| negatives.contains(n)));
    }

    #[test]
    fn test_zero_ratio_drops_negatives() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let positives: Vec<u32> = (0..10).collect();
        let negatives: Vec<u32> = (100..200).collect();
        let balanced = ClassBalancer::new(0.0).balance(&positives, &negatives, 1000, &mut rng);
        assert_eq!(count(&balanced, PatchClass::Negative), 0);
        assert_eq!(count(&balanced, PatchClass::Positive), 10);
    }

    #[test]
    fn test_sampling_with_replacement() {
        // 200 draws out of 200 items almost surely repeat something
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let negatives: Vec<u32> = (0..200).collect();
        let mut kept = ClassBalancer::new(1.0).undersample(&negatives, &mut rng);
        kept.sort_unstable();
        kept.dedup();
        assert!(kept.len() < 200);
    }

    #[test]
    fn test_balance_truncates_and_labels() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let positives: Vec<u32> = (0..100).collect();
        let negatives: Vec<u32> = (1000..1400).collect();
        let balanced = ClassBalancer::new(0.25).balance(&positives, &negatives, 10, &mut rng);

        assert_eq!(balanced.len(), 10);
        for item in &balanced {
            match item.class {
                PatchClass::Positive => assert!(item.item < 100),
                PatchClass::Negative => assert!(item.item >= 1000),
            }
        }
    }

    #[test]
    fn test_balance_short_supply() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let balanced = ClassBalancer::new(0.5).balance(&[1u32, 2], &[10, 11], 10, &mut rng);
        assert_eq!(balanced.len(), 3);
    }

    #[test]
    fn test_balance_is_shuffled() {
        let mut rng = ChaCha8Rng::seed_from_u64(21);
        let positives: Vec<u32> = (0..50).collect();
        let negatives: Vec<u32> = (1000..1050).collect();
        let balanced = ClassBalancer::new(1.0).balance(&positives, &negatives, 100, &mut rng);
        let leading_positives = balanced
            .iter()
            .take_while(|l| l.class == PatchClass::Positive)
            .count();
        assert!(leading_positives < 50);
    }
}
