//! Training loop driver.
//!
//! Runs the full pipeline: dataset scan, deterministic split, cached
//! pre-loading, model assembly, the bounded epoch loop with monitored
//! early stopping and best-checkpoint saving, and final persistence with
//! best weights restored.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use burn::{
    data::dataloader::batcher::Batcher,
    data::dataset::Dataset,
    module::{AutodiffModule, Module},
    nn::loss::CrossEntropyLossConfig,
    optim::{AdamConfig, GradientsParams, Optimizer},
    record::CompactRecorder,
    tensor::{backend::AutodiffBackend, ElementConversion},
};
use colored::Colorize;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::TrainConfig;
use crate::dataset::batch::{
    sequential_batches, shuffled_batches, BatchPrefetcher, SkinBatch, SkinBatchDataset, SkinBatcher,
};
use crate::dataset::loader::SkinDataset;
use crate::dataset::split::{SplitConfig, TrainValSplit};
use crate::model::classifier::{ModelSpec, SkinClassifier};
use crate::training::monitor::{EpochOutcome, MonitorMode, TrainingMonitor};
use crate::utils::metrics::{count_correct, RunningMetrics};

/// Summary of a completed training run
#[derive(Debug, Clone)]
pub struct FitReport {
    /// Number of epochs actually run
    pub epochs_run: usize,
    /// Best validation accuracy observed (0.0 to 1.0)
    pub best_val_accuracy: f64,
    /// Epoch (0-indexed) that produced the best validation accuracy
    pub best_epoch: usize,
    /// Whether early stopping halted the run before the epoch cap
    pub stopped_early: bool,
    /// Path of the best-checkpoint artifact (without recorder extension)
    pub best_artifact: PathBuf,
    /// Path of the final artifact (without recorder extension)
    pub final_artifact: PathBuf,
    /// Number of classes the model was trained on
    pub num_classes: usize,
}

#[derive(Serialize)]
struct LabelManifest<'a> {
    classes: &'a [String],
}

/// Train a classifier according to the configuration and persist it.
///
/// The best checkpoint is overwritten whenever validation accuracy strictly
/// improves; after the loop the best weights are restored into the model
/// before the final artifact is written.
pub fn fit<B: AutodiffBackend>(config: &TrainConfig, device: B::Device) -> Result<FitReport> {
    config
        .validate()
        .context("invalid training configuration")?;

    println!("{}", "Initializing training...".green().bold());
    println!("  Device: {:?}", device);

    std::fs::create_dir_all(&config.output_dir)
        .with_context(|| format!("failed to create output directory {:?}", config.output_dir))?;

    // Dataset scan. The label set is derived once here and fixed for the run.
    println!("{}", "Loading dataset...".cyan());
    let dataset = SkinDataset::new(&config.data_dir)?;
    if dataset.is_empty() {
        anyhow::bail!(
            "no images found under {:?}; expected one subdirectory per class",
            config.data_dir
        );
    }

    let class_names: Vec<String> = dataset.class_names().to_vec();
    let num_classes = class_names.len();
    dataset.stats().print();
    println!("  Detected classes: {:?}", class_names);

    // Deterministic split
    let split = TrainValSplit::new(
        dataset.samples.clone(),
        &SplitConfig {
            validation_fraction: config.validation_fraction,
            seed: config.seed,
        },
    );
    println!();
    println!("{}", "Dataset splits:".cyan().bold());
    println!("  Training samples:   {}", split.train.len());
    println!("  Validation samples: {}", split.validation.len());

    if split.train.is_empty() {
        anyhow::bail!("training split is empty; dataset too small for the configured fraction");
    }

    // Decode everything into memory once
    let to_pairs = |samples: &[crate::dataset::loader::ImageSample]| {
        samples
            .iter()
            .map(|s| (s.path.clone(), s.label))
            .collect::<Vec<_>>()
    };

    println!();
    println!("{}", "Pre-loading training data...".cyan().bold());
    let train_dataset = Arc::new(
        SkinBatchDataset::load(&to_pairs(&split.train), config.image_size)
            .context("failed to pre-load training images")?,
    );

    println!("{}", "Pre-loading validation data...".cyan().bold());
    let val_dataset = SkinBatchDataset::load(&to_pairs(&split.validation), config.image_size)
        .context("failed to pre-load validation images")?;

    let batcher = SkinBatcher::new();

    // Model assembly: frozen backbone, trainable head
    println!();
    println!("{}", "Assembling model...".cyan());
    let spec = ModelSpec {
        num_classes,
        head_width: config.head_width,
        dropout: config.dropout,
        trainability: Default::default(),
        backbone_weights: config.backbone_weights.clone(),
    };
    let mut model = SkinClassifier::<B>::new(&spec, &device)?;
    model.print_summary(&spec.trainability);

    let mut optimizer = AdamConfig::new().init();
    let loss_fn = CrossEntropyLossConfig::new().init(&device);
    let recorder = CompactRecorder::new();

    let mut monitor = TrainingMonitor::new(MonitorMode::Max, config.patience);
    let mut epoch_rng = ChaCha8Rng::seed_from_u64(config.seed);
    let best_artifact = config.best_artifact();

    println!();
    println!("{}", "Starting training...".green().bold());
    println!(
        "  Epochs: {} | Batch size: {} | Learning rate: {} | Patience: {}",
        config.epochs, config.batch_size, config.learning_rate, config.patience
    );
    println!();

    let mut epochs_run = 0usize;
    let mut stopped_early = false;

    for epoch in 0..config.epochs {
        println!(
            "{}",
            format!("Epoch {}/{}", epoch + 1, config.epochs).yellow().bold()
        );

        // Training pass: updates flow into the head only, the backbone is
        // detached from gradient tracking.
        let plan = shuffled_batches(train_dataset.len(), config.batch_size, &mut epoch_rng);
        let num_batches = plan.len();
        let prefetcher =
            BatchPrefetcher::new(train_dataset.clone(), plan, config.prefetch_depth);

        let mut train_metrics = RunningMetrics::new();

        for (batch_idx, items) in prefetcher.enumerate() {
            let batch: SkinBatch<B> = batcher.batch(items, &device);
            let batch_size = batch.targets.dims()[0];

            let output = model.forward(batch.images);
            let loss = loss_fn.forward(output.clone(), batch.targets.clone());
            let loss_value: f64 = loss.clone().into_scalar().elem();

            let correct = count_correct(output, batch.targets);
            train_metrics.record(loss_value, correct, batch_size);

            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optimizer.step(config.learning_rate, model, grads);

            if (batch_idx + 1) % 10 == 0 || batch_idx + 1 == num_batches {
                debug!(
                    "  Batch {:>4}/{}: loss = {:.4}, acc = {:.2}%",
                    batch_idx + 1,
                    num_batches,
                    loss_value,
                    100.0 * train_metrics.accuracy()
                );
            }
        }

        // Validation pass: forward only
        let (val_loss, val_acc) = evaluate(&model, &val_dataset, &batcher, config.batch_size);

        epochs_run = epoch + 1;

        let outcome = monitor.observe(val_acc);
        let marker = match outcome {
            EpochOutcome::Improved { .. } => {
                model
                    .clone()
                    .save_file(&best_artifact, &recorder)
                    .map_err(|e| anyhow::anyhow!("failed to save checkpoint: {:?}", e))?;
                info!(
                    "Validation accuracy improved to {:.2}%, checkpoint saved",
                    val_acc * 100.0
                );
                " (best)".green().to_string()
            }
            EpochOutcome::NotImproved { stagnant } => {
                debug!(
                    "No improvement for {} epoch(s) (best: {:.2}%)",
                    stagnant,
                    monitor.best().unwrap_or(0.0) * 100.0
                );
                String::new()
            }
            EpochOutcome::Stopped { best, best_epoch } => {
                warn!(
                    "Early stopping: no improvement for {} epochs (best {:.2}% at epoch {})",
                    config.patience,
                    best * 100.0,
                    best_epoch + 1
                );
                stopped_early = true;
                String::new()
            }
        };

        println!(
            "  {} Loss: {:.4} | Train acc: {:.2}% | Val loss: {:.4} | Val acc: {:.2}%{}",
            "->".cyan(),
            train_metrics.avg_loss(),
            100.0 * train_metrics.accuracy(),
            val_loss,
            100.0 * val_acc,
            marker
        );
        println!();

        if stopped_early {
            break;
        }
    }

    // Restore the best weights before writing the final artifact
    let best_epoch = monitor.best_epoch().unwrap_or(0);
    let best_val_accuracy = monitor.best().unwrap_or(0.0);

    println!("{}", "Saving model...".cyan());
    model = model
        .load_file(&best_artifact, &recorder, &device)
        .map_err(|e| anyhow::anyhow!("failed to restore best checkpoint: {:?}", e))?;

    let final_artifact = config.final_artifact();
    model
        .clone()
        .save_file(&final_artifact, &recorder)
        .map_err(|e| anyhow::anyhow!("failed to save final model: {:?}", e))?;

    let manifest = LabelManifest {
        classes: &class_names,
    };
    let manifest_path = config.output_dir.join("labels.json");
    std::fs::write(&manifest_path, serde_json::to_string_pretty(&manifest)?)
        .with_context(|| format!("failed to write {:?}", manifest_path))?;

    println!();
    println!("{}", "Training complete!".green().bold());
    println!(
        "  Best validation accuracy: {:.2}% (epoch {})",
        best_val_accuracy * 100.0,
        best_epoch + 1
    );
    println!("  Best checkpoint: {:?}", best_artifact);
    println!("  Final model:     {:?}", final_artifact);
    println!("  Label manifest:  {:?}", manifest_path);

    Ok(FitReport {
        epochs_run,
        best_val_accuracy,
        best_epoch,
        stopped_early,
        best_artifact,
        final_artifact,
        num_classes,
    })
}

/// Forward-only pass over a dataset, returning (average loss, accuracy)
fn evaluate<B: AutodiffBackend>(
    model: &SkinClassifier<B>,
    dataset: &SkinBatchDataset,
    batcher: &SkinBatcher,
    batch_size: usize,
) -> (f64, f64) {
    let device = <B::InnerBackend as burn::tensor::backend::Backend>::Device::default();
    let model = model.valid();
    let loss_fn = CrossEntropyLossConfig::new().init(&device);

    let mut metrics = RunningMetrics::new();

    for indices in sequential_batches(dataset.len(), batch_size) {
        let items: Vec<_> = indices.iter().filter_map(|&i| dataset.get(i)).collect();
        if items.is_empty() {
            continue;
        }

        let batch: SkinBatch<B::InnerBackend> = batcher.batch(items, &device);
        let n = batch.targets.dims()[0];

        let output = model.forward(batch.images);
        let loss = loss_fn.forward(output.clone(), batch.targets.clone());
        let loss_value: f64 = loss.into_scalar().elem();

        let correct = count_correct(output, batch.targets);
        metrics.record(loss_value, correct, n);
    }

    (metrics.avg_loss(), metrics.accuracy())
}
