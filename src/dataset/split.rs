//! Deterministic train/validation splitting.
//!
//! The full sample list is shuffled once with a seeded ChaCha8 generator,
//! then the tail `round(n * validation_fraction)` samples become the
//! validation set and the rest the training set. Identical inputs, seed,
//! and fraction always produce identical partitions. Classes with very few
//! images may land entirely on one side; this is inherited behavior, not
//! handled specially.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use super::loader::ImageSample;

/// Configuration for the train/validation split
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitConfig {
    /// Fraction of samples held out for validation (0.0 to 1.0)
    pub validation_fraction: f64,
    /// Shuffle seed
    pub seed: u64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            validation_fraction: 0.2,
            seed: 123,
        }
    }
}

/// The two partitions of a dataset
#[derive(Debug, Clone)]
pub struct TrainValSplit {
    pub train: Vec<ImageSample>,
    pub validation: Vec<ImageSample>,
}

impl TrainValSplit {
    /// Split samples according to the configuration
    pub fn new(samples: Vec<ImageSample>, config: &SplitConfig) -> Self {
        let mut shuffled = samples;
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        shuffled.shuffle(&mut rng);

        let val_count = (shuffled.len() as f64 * config.validation_fraction).round() as usize;
        let split_at = shuffled.len() - val_count.min(shuffled.len());

        let validation = shuffled.split_off(split_at);

        Self {
            train: shuffled,
            validation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn samples(n: usize) -> Vec<ImageSample> {
        (0..n)
            .map(|i| ImageSample {
                path: PathBuf::from(format!("img{:03}.jpg", i)),
                label: i % 2,
                class_name: if i % 2 == 0 { "acne" } else { "melanoma" }.to_string(),
            })
            .collect()
    }

    #[test]
    fn test_split_fraction_honored() {
        let config = SplitConfig {
            validation_fraction: 0.2,
            seed: 123,
        };
        let split = TrainValSplit::new(samples(100), &config);

        assert_eq!(split.validation.len(), 20);
        assert_eq!(split.train.len(), 80);
    }

    #[test]
    fn test_split_is_deterministic() {
        let config = SplitConfig {
            validation_fraction: 0.2,
            seed: 123,
        };
        let a = TrainValSplit::new(samples(50), &config);
        let b = TrainValSplit::new(samples(50), &config);

        let paths = |s: &[ImageSample]| s.iter().map(|x| x.path.clone()).collect::<Vec<_>>();
        assert_eq!(paths(&a.train), paths(&b.train));
        assert_eq!(paths(&a.validation), paths(&b.validation));
    }

    #[test]
    fn test_different_seed_changes_partition() {
        let a = TrainValSplit::new(
            samples(50),
            &SplitConfig {
                validation_fraction: 0.2,
                seed: 123,
            },
        );
        let b = TrainValSplit::new(
            samples(50),
            &SplitConfig {
                validation_fraction: 0.2,
                seed: 124,
            },
        );

        let paths = |s: &[ImageSample]| s.iter().map(|x| x.path.clone()).collect::<Vec<_>>();
        assert_ne!(paths(&a.validation), paths(&b.validation));
    }

    #[test]
    fn test_partitions_are_disjoint_and_complete() {
        let config = SplitConfig::default();
        let split = TrainValSplit::new(samples(25), &config);

        assert_eq!(split.train.len() + split.validation.len(), 25);

        let train_paths: std::collections::HashSet<_> =
            split.train.iter().map(|s| s.path.clone()).collect();
        assert!(split
            .validation
            .iter()
            .all(|s| !train_paths.contains(&s.path)));
    }

    #[test]
    fn test_rounding_of_validation_count() {
        // 10 samples at 0.25 -> round(2.5) = 3 validation samples
        let config = SplitConfig {
            validation_fraction: 0.25,
            seed: 7,
        };
        let split = TrainValSplit::new(samples(10), &config);
        assert_eq!(split.validation.len(), 3);
    }
}
