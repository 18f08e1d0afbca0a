//! Burn dataset integration: normalized items, in-memory caching, batching,
//! and background batch prefetching.
//!
//! Pixel intensities are mapped into [0, 1] by dividing by 255 when an item
//! is decoded. Decoded items are cached in memory so each image is read and
//! resized exactly once per run; the prefetcher then assembles upcoming
//! batches on a background thread so item assembly overlaps model compute.
//! Batch order is always preserved.

use std::path::PathBuf;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;

use burn::data::dataloader::batcher::Batcher;
use burn::data::dataset::Dataset;
use burn::prelude::*;
use image::imageops::FilterType;
use image::ImageReader;
use indicatif::{ProgressBar, ProgressStyle};
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

use crate::utils::error::{DermaError, Result};

/// A single decoded and normalized image ready for batching
#[derive(Clone, Debug)]
pub struct SkinItem {
    /// Image data as flattened CHW float array [3 * size * size], in [0, 1]
    pub image: Vec<f32>,
    /// Integer class label
    pub label: usize,
    /// Side length of the square image
    pub image_size: usize,
}

impl SkinItem {
    /// Decode an image file, resize it, and normalize pixels to [0, 1]
    pub fn from_path(path: &PathBuf, label: usize, image_size: usize) -> Result<Self> {
        let img = ImageReader::open(path)
            .map_err(|e| DermaError::ImageLoad(path.clone(), e.to_string()))?
            .decode()
            .map_err(|e| DermaError::ImageLoad(path.clone(), e.to_string()))?
            .resize_exact(image_size as u32, image_size as u32, FilterType::Triangle)
            .to_rgb8();

        let (width, height) = (image_size, image_size);
        let mut image = vec![0.0f32; 3 * height * width];

        // CHW layout, every channel value divided by 255
        for y in 0..height {
            for x in 0..width {
                let pixel = img.get_pixel(x as u32, y as u32);
                image[y * width + x] = pixel[0] as f32 / 255.0;
                image[height * width + y * width + x] = pixel[1] as f32 / 255.0;
                image[2 * height * width + y * width + x] = pixel[2] as f32 / 255.0;
            }
        }

        Ok(Self {
            image,
            label,
            image_size,
        })
    }

    /// Create from pre-decoded data (used by tests and synthetic pipelines)
    pub fn from_data(image: Vec<f32>, label: usize, image_size: usize) -> Self {
        Self {
            image,
            label,
            image_size,
        }
    }
}

/// An in-memory dataset of decoded items implementing Burn's `Dataset` trait
#[derive(Debug, Clone)]
pub struct SkinBatchDataset {
    items: Vec<SkinItem>,
}

impl SkinBatchDataset {
    /// Decode every sample into memory, in parallel, with a progress bar.
    ///
    /// A failed decode aborts the load; the directory scan has already
    /// filtered non-image files, so a failure here means a corrupt file.
    pub fn load(samples: &[(PathBuf, usize)], image_size: usize) -> Result<Self> {
        let bar = ProgressBar::new(samples.len() as u64);
        bar.set_style(
            ProgressStyle::with_template(
                "  {elapsed_precise} [{bar:40.cyan/blue}] {pos}/{len} images",
            )
            .expect("static template")
            .progress_chars("=> "),
        );

        let items: Result<Vec<SkinItem>> = samples
            .par_iter()
            .map(|(path, label)| {
                let item = SkinItem::from_path(path, *label, image_size);
                bar.inc(1);
                item
            })
            .collect();
        bar.finish_and_clear();

        Ok(Self { items: items? })
    }

    /// Wrap already-decoded items
    pub fn from_items(items: Vec<SkinItem>) -> Self {
        Self { items }
    }
}

impl Dataset<SkinItem> for SkinBatchDataset {
    fn get(&self, index: usize) -> Option<SkinItem> {
        self.items.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.items.len()
    }
}

/// A batch of images and integer targets for training
#[derive(Clone, Debug)]
pub struct SkinBatch<B: Backend> {
    /// Images with shape [batch_size, 3, height, width], values in [0, 1]
    pub images: Tensor<B, 4>,
    /// Integer labels with shape [batch_size]
    pub targets: Tensor<B, 1, Int>,
}

/// Batcher turning decoded items into device tensors
#[derive(Clone, Debug, Default)]
pub struct SkinBatcher;

impl SkinBatcher {
    pub fn new() -> Self {
        Self
    }
}

impl<B: Backend> Batcher<B, SkinItem, SkinBatch<B>> for SkinBatcher {
    fn batch(&self, items: Vec<SkinItem>, device: &B::Device) -> SkinBatch<B> {
        let batch_size = items.len();
        let size = items.first().map(|i| i.image_size).unwrap_or(0);

        let images_data: Vec<f32> = items.iter().flat_map(|item| item.image.clone()).collect();
        let images = Tensor::<B, 4>::from_floats(
            TensorData::new(images_data, [batch_size, 3, size, size]),
            device,
        );

        let targets_data: Vec<i64> = items.iter().map(|item| item.label as i64).collect();
        let targets =
            Tensor::<B, 1, Int>::from_data(TensorData::new(targets_data, [batch_size]), device);

        SkinBatch { images, targets }
    }
}

/// Build the shuffled batch index plan for one epoch
pub fn shuffled_batches(len: usize, batch_size: usize, rng: &mut ChaCha8Rng) -> Vec<Vec<usize>> {
    let mut indices: Vec<usize> = (0..len).collect();
    indices.shuffle(rng);
    indices.chunks(batch_size).map(|c| c.to_vec()).collect()
}

/// Build the sequential batch index plan (validation passes)
pub fn sequential_batches(len: usize, batch_size: usize) -> Vec<Vec<usize>> {
    (0..len)
        .collect::<Vec<usize>>()
        .chunks(batch_size)
        .map(|c| c.to_vec())
        .collect()
}

/// Background batch prefetcher.
///
/// Assembles the items of upcoming batches on a worker thread and hands
/// them over through a bounded channel, preserving batch order. Purely a
/// throughput optimization: consuming the prefetcher yields exactly the
/// batches of the plan it was built from.
pub struct BatchPrefetcher {
    rx: mpsc::Receiver<Vec<SkinItem>>,
}

impl BatchPrefetcher {
    /// Start prefetching the given batch plan over the dataset.
    ///
    /// `depth` bounds how many assembled batches may wait in the channel.
    pub fn new(dataset: Arc<SkinBatchDataset>, plan: Vec<Vec<usize>>, depth: usize) -> Self {
        let (tx, rx) = mpsc::sync_channel(depth.max(1));

        // The worker exits when the receiver is dropped (send fails) or the
        // plan is exhausted; no join needed.
        thread::spawn(move || {
            for batch in plan {
                let items: Vec<SkinItem> =
                    batch.iter().filter_map(|&i| dataset.get(i)).collect();
                if items.is_empty() {
                    continue;
                }
                if tx.send(items).is_err() {
                    break;
                }
            }
        });

        Self { rx }
    }
}

impl Iterator for BatchPrefetcher {
    type Item = Vec<SkinItem>;

    fn next(&mut self) -> Option<Self::Item> {
        self.rx.recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use image::{Rgb, RgbImage};
    use rand::SeedableRng;

    type TestBackend = NdArray;

    fn synthetic_items(n: usize, image_size: usize) -> Vec<SkinItem> {
        (0..n)
            .map(|i| {
                SkinItem::from_data(
                    vec![i as f32 / n as f32; 3 * image_size * image_size],
                    i % 2,
                    image_size,
                )
            })
            .collect()
    }

    #[test]
    fn test_item_normalization_divides_by_255() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lesion.png");

        let mut img = RgbImage::new(4, 4);
        for pixel in img.pixels_mut() {
            *pixel = Rgb([0, 128, 255]);
        }
        img.save(&path).unwrap();

        let item = SkinItem::from_path(&path, 0, 4).unwrap();

        assert_eq!(item.image.len(), 3 * 4 * 4);
        // Channel planes: R then G then B
        assert!((item.image[0] - 0.0).abs() < 1e-6);
        assert!((item.image[16] - 128.0 / 255.0).abs() < 1e-6);
        assert!((item.image[32] - 1.0).abs() < 1e-6);
        assert!(item.image.iter().all(|&v| (0.0..=1.0).contains(&v)));
    }

    #[test]
    fn test_item_decode_failure_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"not an image").unwrap();

        let result = SkinItem::from_path(&path, 0, 4);
        assert!(matches!(result, Err(DermaError::ImageLoad(_, _))));
    }

    #[test]
    fn test_batcher_shapes_and_targets() {
        let device = Default::default();
        let items = synthetic_items(3, 8);
        let batcher = SkinBatcher::new();

        let batch: SkinBatch<TestBackend> = batcher.batch(items, &device);

        assert_eq!(batch.images.dims(), [3, 3, 8, 8]);
        assert_eq!(batch.targets.dims(), [3]);

        let targets: Vec<i64> = batch.targets.into_data().to_vec().unwrap();
        assert_eq!(targets, vec![0, 1, 0]);
    }

    #[test]
    fn test_shuffled_batches_cover_all_indices() {
        let mut rng = ChaCha8Rng::seed_from_u64(123);
        let plan = shuffled_batches(10, 4, &mut rng);

        assert_eq!(plan.len(), 3);
        assert_eq!(plan[0].len(), 4);
        assert_eq!(plan[2].len(), 2);

        let mut all: Vec<usize> = plan.into_iter().flatten().collect();
        all.sort_unstable();
        assert_eq!(all, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_shuffled_batches_deterministic_for_seed() {
        let mut rng_a = ChaCha8Rng::seed_from_u64(123);
        let mut rng_b = ChaCha8Rng::seed_from_u64(123);
        assert_eq!(
            shuffled_batches(20, 4, &mut rng_a),
            shuffled_batches(20, 4, &mut rng_b)
        );
    }

    #[test]
    fn test_prefetcher_preserves_order() {
        let dataset = Arc::new(SkinBatchDataset::from_items(synthetic_items(10, 2)));
        let plan = sequential_batches(10, 3);

        let prefetcher = BatchPrefetcher::new(dataset.clone(), plan.clone(), 2);
        let fetched: Vec<Vec<SkinItem>> = prefetcher.collect();

        assert_eq!(fetched.len(), plan.len());
        for (batch, indices) in fetched.iter().zip(plan.iter()) {
            let labels: Vec<usize> = batch.iter().map(|i| i.label).collect();
            let expected: Vec<usize> = indices.iter().map(|&i| i % 2).collect();
            assert_eq!(labels, expected);
        }
    }

    #[test]
    fn test_prefetcher_early_drop_does_not_hang() {
        let dataset = Arc::new(SkinBatchDataset::from_items(synthetic_items(50, 2)));
        let plan = sequential_batches(50, 2);

        let mut prefetcher = BatchPrefetcher::new(dataset, plan, 1);
        let _ = prefetcher.next();
        // Dropping with batches still queued must not deadlock
        drop(prefetcher);
    }
}
