//! # Dermaclass
//!
//! A Rust library for training a dermatological disease classifier with
//! transfer learning using the Burn framework.
//!
//! ## Features
//!
//! - **Transfer learning** over a MobileNetV2 feature extractor with a small
//!   trainable classification head
//! - **Burn framework** for portable neural network training on CPU or GPU
//! - **Directory datasets**: one subdirectory per disease class, deterministic
//!   train/validation splitting
//! - **Monitored training** with early stopping and best-checkpoint saving
//!
//! ## Modules
//!
//! - `dataset`: Directory scanning, splitting, batching, and prefetching
//! - `model`: Frozen backbone + trainable head classifier
//! - `training`: Training loop driver and the early-stop/checkpoint monitor
//! - `utils`: Logging, metrics, and error types
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use dermaclass::backend::{select_device, TrainingBackend};
//! use dermaclass::config::TrainConfig;
//! use dermaclass::training::fit;
//!
//! let config = TrainConfig::default();
//! let selection = select_device();
//! let report = fit::<TrainingBackend>(&config, selection.device)?;
//! println!("best accuracy: {:.2}%", report.best_val_accuracy * 100.0);
//! ```

pub mod backend;
pub mod config;
pub mod dataset;
pub mod model;
pub mod training;
pub mod utils;

// Re-export commonly used items for convenience
pub use config::TrainConfig;
pub use dataset::batch::{SkinBatch, SkinBatchDataset, SkinBatcher, SkinItem};
pub use dataset::loader::{DatasetStats, SkinDataset};
pub use dataset::split::{SplitConfig, TrainValSplit};
pub use model::classifier::{ModelSpec, SkinClassifier, Trainability};
pub use training::driver::{fit, FitReport};
pub use training::monitor::{EpochOutcome, MonitorMode, TrainingMonitor};
pub use utils::error::{DermaError, Result};

/// Default input image size expected by the MobileNetV2 backbone
pub const IMAGE_SIZE: usize = 224;

/// Number of feature channels produced by the backbone
pub const FEATURE_CHANNELS: usize = 1280;

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
