//! Directory scanner for labeled skin-image datasets.
//!
//! The scan discovers one class per subdirectory, in sorted order, and
//! assigns label indices in that order. The label set is derived once at
//! load time and fixed for the whole run.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info};
use walkdir::WalkDir;

use super::is_image_path;

/// A single image sample with its label
#[derive(Debug, Clone)]
pub struct ImageSample {
    /// Path to the image file
    pub path: PathBuf,
    /// Class label index
    pub label: usize,
    /// Class name (the subdirectory name)
    pub class_name: String,
}

/// A labeled skin-image dataset discovered from a directory tree
#[derive(Debug)]
pub struct SkinDataset {
    /// Root directory of the dataset
    pub root_dir: PathBuf,
    /// All samples in the dataset, grouped by class in scan order
    pub samples: Vec<ImageSample>,
    /// Class names in label order
    class_names: Vec<String>,
    /// Mapping from class name to label index
    class_to_idx: HashMap<String, usize>,
}

impl SkinDataset {
    /// Scan a dataset directory.
    ///
    /// Fails when the root directory does not exist. An empty class
    /// directory yields no samples for that class; callers decide whether
    /// an empty dataset is acceptable.
    pub fn new<P: AsRef<Path>>(root_dir: P) -> Result<Self> {
        let root_dir = root_dir.as_ref().to_path_buf();
        info!("Loading skin dataset from: {:?}", root_dir);

        if !root_dir.exists() {
            anyhow::bail!("Dataset directory does not exist: {:?}", root_dir);
        }

        let mut class_names: Vec<String> = Vec::new();
        for entry in std::fs::read_dir(&root_dir)
            .with_context(|| format!("Failed to read dataset directory {:?}", root_dir))?
        {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                if let Some(name) = entry.file_name().to_str() {
                    class_names.push(name.to_string());
                }
            }
        }
        class_names.sort();

        info!("Found {} classes", class_names.len());

        let class_to_idx: HashMap<String, usize> = class_names
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.clone(), idx))
            .collect();

        let mut samples = Vec::new();
        for class_name in &class_names {
            let class_dir = root_dir.join(class_name);
            let label = class_to_idx[class_name];
            let before = samples.len();

            let mut files: Vec<PathBuf> = WalkDir::new(&class_dir)
                .min_depth(1)
                .max_depth(1)
                .into_iter()
                .filter_map(|e| e.ok())
                .map(|e| e.path().to_path_buf())
                .filter(|p| is_image_path(p))
                .collect();
            files.sort();

            for path in files {
                samples.push(ImageSample {
                    path,
                    label,
                    class_name: class_name.clone(),
                });
            }

            debug!(
                "Class '{}' (label {}): {} samples",
                class_name,
                label,
                samples.len() - before
            );
        }

        info!("Loaded {} total samples", samples.len());

        Ok(Self {
            root_dir,
            samples,
            class_names,
            class_to_idx,
        })
    }

    /// Number of samples in the dataset
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the dataset holds no samples
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Number of classes
    pub fn num_classes(&self) -> usize {
        self.class_names.len()
    }

    /// Class names in label order
    pub fn class_names(&self) -> &[String] {
        &self.class_names
    }

    /// Label index of a class name
    pub fn class_index(&self, name: &str) -> Option<usize> {
        self.class_to_idx.get(name).copied()
    }

    /// Compute statistics about the dataset
    pub fn stats(&self) -> DatasetStats {
        let mut class_counts = vec![0usize; self.num_classes()];
        for sample in &self.samples {
            class_counts[sample.label] += 1;
        }

        DatasetStats {
            total_samples: self.samples.len(),
            num_classes: self.num_classes(),
            class_counts,
            class_names: self.class_names.clone(),
        }
    }
}

/// Statistics about a scanned dataset
#[derive(Debug, Clone)]
pub struct DatasetStats {
    pub total_samples: usize,
    pub num_classes: usize,
    pub class_counts: Vec<usize>,
    pub class_names: Vec<String>,
}

impl DatasetStats {
    /// Print statistics to the console
    pub fn print(&self) {
        println!("\nDataset statistics:");
        println!("  Total samples: {}", self.total_samples);
        println!("  Number of classes: {}", self.num_classes);
        println!("\n  Samples per class:");

        for (idx, name) in self.class_names.iter().enumerate() {
            let count = self.class_counts[idx];
            let bar_len = if self.total_samples > 0 {
                (count as f32 / self.total_samples as f32 * 40.0) as usize
            } else {
                0
            };
            let bar: String = "#".repeat(bar_len);
            println!("    {:3}. {:30} {:5} {}", idx, name, count, bar);
        }
    }
}
