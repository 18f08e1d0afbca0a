//! Dataset module for labeled skin-image directories.
//!
//! This module provides functionality for:
//! - Scanning a directory tree where subdirectory name = class label
//! - Deterministic train/validation splitting with a fixed seed
//! - Normalized batching and background prefetching for the training loop
//!
//! Expected directory layout:
//!
//! ```text
//! dataset_skin/
//! ├── acne/
//! │   ├── img001.jpg
//! │   └── img002.jpg
//! ├── eczema/
//! │   └── ...
//! └── melanoma/
//!     └── ...
//! ```

pub mod batch;
pub mod loader;
pub mod split;

// Re-export main types for convenience
pub use batch::{BatchPrefetcher, SkinBatch, SkinBatchDataset, SkinBatcher, SkinItem};
pub use loader::{DatasetStats, ImageSample, SkinDataset};
pub use split::{SplitConfig, TrainValSplit};

/// File extensions recognized as images by the directory scan
pub const IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "bmp"];

/// Check whether a path has a recognized image extension
pub fn is_image_path(path: &std::path::Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}
