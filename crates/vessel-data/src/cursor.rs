//! Epoch-wise file cycling.
//!
//! The cursor walks a shuffled list of file names without replacement. When
//! it hands out the last name it reshuffles and starts over, so every epoch
//! visits each file once in a fresh order.

use rand::seq::SliceRandom;
use rand::Rng;

#[derive(Debug, Clone)]
pub struct FileCursor {
    files: Vec<String>,
    index: usize,
    epoch: usize,
}

impl FileCursor {
    /// Creates a cursor over `files`, shuffled once up front
    pub fn new<R: Rng + ?Sized>(mut files: Vec<String>, rng: &mut R) -> Self {
        files.shuffle(rng);
        Self {
            files,
            index: 0,
            epoch: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Position of the next name within the current epoch
    pub fn position(&self) -> usize {
        self.index
    }

    /// Number of completed passes over the list
    pub fn epoch(&self) -> usize {
        self.epoch
    }

    /// Current file order
    pub fn files(&self) -> &[String] {
        &self.files
    }

    /// Returns the next file name, reshuffling after the last one.
    pub fn next<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<String> {
        let name = self.files.get(self.index).cloned()?;
        if self.index + 1 < self.files.len() {
            self.index += 1;
        } else {
            self.reset(rng);
        }
        Some(name)
    }

    /// Reshuffles the list and rewinds to its start
    pub fn reset<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.files.shuffle(rng);
        self.index = 0;
        self.epoch += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::collections::HashSet;

    fn names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("{:02}.png", i)).collect()
    }

    #[test]
    fn test_epoch_without_replacement() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let mut cursor = FileCursor::new(names(6), &mut rng);

        let first: HashSet<String> = (0..6).filter_map(|_| cursor.next(&mut rng)).collect();
        assert_eq!(first.len(), 6);
        assert_eq!(cursor.epoch(), 1);
        assert_eq!(cursor.position(), 0);

        let second: HashSet<String> = (0..6).filter_map(|_| cursor.next(&mut rng)).collect();
        assert_eq!(second, first);
        assert_eq!(cursor.epoch(), 2);
    }

    #[test]
    fn test_position_advances() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let mut cursor = FileCursor::new(names(3), &mut rng);
        cursor.next(&mut rng);
        assert_eq!(cursor.position(), 1);
        cursor.next(&mut rng);
        assert_eq!(cursor.position(), 2);
    }

    #[test]
    fn test_single_file() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut cursor = FileCursor::new(names(1), &mut rng);
        assert_eq!(cursor.next(&mut rng).as_deref(), Some("00.png"));
        assert_eq!(cursor.next(&mut rng).as_deref(), Some("00.png"));
    }

    #[test]
    fn test_empty_cursor() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut cursor = FileCursor::new(Vec::new(), &mut rng);
        assert!(cursor.is_empty());
        assert_eq!(cursor.next(&mut rng), None);
    }

    #[test]
    fn test_seeded_order_is_reproducible() {
        let a = FileCursor::new(names(10), &mut ChaCha8Rng::seed_from_u64(8));
        let b = FileCursor::new(names(10), &mut ChaCha8Rng::seed_from_u64(8));
        assert_eq!(a.files(), b.files());
    }
}
