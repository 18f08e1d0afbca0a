//! Training configuration.
//!
//! All knobs of the pipeline live in one explicit [`TrainConfig`] that is
//! passed into each stage. The defaults reproduce the reference training
//! recipe: 224x224 inputs, batches of 128, up to 50 epochs, an 80/20 split
//! at seed 123, Adam at 1e-4, a 256-wide head with 0.3 dropout, and early
//! stopping after 5 stagnant epochs.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::utils::error::{DermaError, Result};

/// Configuration for a full training run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    /// Root directory of the dataset (one subdirectory per class)
    pub data_dir: PathBuf,

    /// Target image size (width and height, assumed square)
    pub image_size: usize,

    /// Number of images per batch
    pub batch_size: usize,

    /// Maximum number of training epochs
    pub epochs: usize,

    /// Fraction of the dataset held out for validation (0.0 to 1.0)
    pub validation_fraction: f64,

    /// Random seed for the train/validation split and epoch shuffling
    pub seed: u64,

    /// Fixed learning rate for the Adam optimizer
    pub learning_rate: f64,

    /// Dropout rate in the classification head
    pub dropout: f64,

    /// Width of the hidden dense layer in the head
    pub head_width: usize,

    /// Early stopping patience (consecutive epochs without improvement)
    pub patience: usize,

    /// Directory for model artifacts
    pub output_dir: PathBuf,

    /// File stem of the best-checkpoint artifact
    pub best_name: String,

    /// File stem of the final artifact
    pub final_name: String,

    /// Optional Burn record file with pretrained backbone weights
    pub backbone_weights: Option<PathBuf>,

    /// Number of batches the prefetcher keeps in flight
    pub prefetch_depth: usize,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("dataset_skin"),
            image_size: 224,
            batch_size: 128,
            epochs: 50,
            validation_fraction: 0.2,
            seed: 123,
            learning_rate: 1e-4,
            dropout: 0.3,
            head_width: 256,
            patience: 5,
            output_dir: PathBuf::from("output/models"),
            best_name: "skin_classifier_best".to_string(),
            final_name: "skin_classifier_final".to_string(),
            backbone_weights: None,
            prefetch_depth: 2,
        }
    }
}

impl TrainConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.image_size == 0 {
            return Err(DermaError::Config("image_size must be positive".into()));
        }

        if self.batch_size == 0 {
            return Err(DermaError::Config("batch_size must be positive".into()));
        }

        if self.epochs == 0 {
            return Err(DermaError::Config("epochs must be positive".into()));
        }

        if !(0.0..1.0).contains(&self.validation_fraction) {
            return Err(DermaError::Config(
                "validation_fraction must be in range [0.0, 1.0)".into(),
            ));
        }

        if self.learning_rate <= 0.0 {
            return Err(DermaError::Config("learning_rate must be positive".into()));
        }

        if !(0.0..1.0).contains(&self.dropout) {
            return Err(DermaError::Config(
                "dropout must be in range [0.0, 1.0)".into(),
            ));
        }

        if self.head_width == 0 {
            return Err(DermaError::Config("head_width must be positive".into()));
        }

        if self.prefetch_depth == 0 {
            return Err(DermaError::Config("prefetch_depth must be positive".into()));
        }

        Ok(())
    }

    /// Path of the best-checkpoint artifact (without recorder extension)
    pub fn best_artifact(&self) -> PathBuf {
        self.output_dir.join(&self.best_name)
    }

    /// Path of the final artifact (without recorder extension)
    pub fn final_artifact(&self) -> PathBuf {
        self.output_dir.join(&self.final_name)
    }

    /// Save configuration to a JSON file
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| DermaError::Serialization(e.to_string()))?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(|e| DermaError::Serialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_recipe() {
        let config = TrainConfig::default();
        assert_eq!(config.image_size, 224);
        assert_eq!(config.batch_size, 128);
        assert_eq!(config.epochs, 50);
        assert_eq!(config.validation_fraction, 0.2);
        assert_eq!(config.seed, 123);
        assert_eq!(config.learning_rate, 1e-4);
        assert_eq!(config.dropout, 0.3);
        assert_eq!(config.head_width, 256);
        assert_eq!(config.patience, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = TrainConfig::default();
        config.batch_size = 0;
        assert!(config.validate().is_err());

        config = TrainConfig::default();
        config.validation_fraction = 1.0;
        assert!(config.validate().is_err());

        config = TrainConfig::default();
        config.dropout = -0.1;
        assert!(config.validate().is_err());

        config = TrainConfig::default();
        config.learning_rate = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_json_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let config = TrainConfig {
            epochs: 3,
            batch_size: 4,
            ..Default::default()
        };
        config.save(&path).unwrap();

        let loaded = TrainConfig::load(&path).unwrap();
        assert_eq!(loaded.epochs, 3);
        assert_eq!(loaded.batch_size, 4);
        assert_eq!(loaded.seed, config.seed);
    }

    #[test]
    fn test_artifact_paths() {
        let config = TrainConfig::default();
        assert!(config
            .best_artifact()
            .ends_with("output/models/skin_classifier_best"));
        assert!(config
            .final_artifact()
            .ends_with("output/models/skin_classifier_final"));
    }
}
