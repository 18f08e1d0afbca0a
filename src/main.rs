//! Dermaclass CLI
//!
//! Entry point for training a dermatological disease classifier with
//! transfer learning over a frozen MobileNetV2 backbone. Flag defaults
//! reproduce the reference training recipe, so a bare `dermaclass train`
//! runs the full pipeline against `dataset_skin/`.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::info;

use dermaclass::backend::{backend_name, select_device, TrainingBackend};
use dermaclass::config::TrainConfig;
use dermaclass::dataset::loader::SkinDataset;
use dermaclass::training::fit;
use dermaclass::utils::logging::{init_logging, LogConfig};

/// Dermatological disease classification with transfer learning
///
/// Trains a classifier over a frozen MobileNetV2 feature extractor using
/// the Burn framework, with early stopping and best-checkpoint saving.
#[derive(Parser, Debug)]
#[command(name = "dermaclass")]
#[command(version = dermaclass::VERSION)]
#[command(about = "Skin disease classifier training with Burn", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Train the classifier
    Train {
        /// Path to the dataset directory (one subdirectory per class)
        #[arg(short, long, default_value = "dataset_skin")]
        data_dir: String,

        /// Target image size (square)
        #[arg(long, default_value = "224")]
        image_size: usize,

        /// Batch size for training
        #[arg(short, long, default_value = "128")]
        batch_size: usize,

        /// Maximum number of training epochs
        #[arg(short, long, default_value = "50")]
        epochs: usize,

        /// Fraction of the dataset held out for validation
        #[arg(long, default_value = "0.2")]
        validation_fraction: f64,

        /// Random seed for splitting and shuffling
        #[arg(long, default_value = "123")]
        seed: u64,

        /// Learning rate for the Adam optimizer
        #[arg(short, long, default_value = "0.0001")]
        learning_rate: f64,

        /// Dropout rate in the classification head
        #[arg(long, default_value = "0.3")]
        dropout: f64,

        /// Width of the hidden dense layer in the head
        #[arg(long, default_value = "256")]
        head_width: usize,

        /// Early stopping patience (epochs without improvement)
        #[arg(long, default_value = "5")]
        patience: usize,

        /// Output directory for model artifacts
        #[arg(short, long, default_value = "output/models")]
        output_dir: String,

        /// Burn record file with pretrained backbone weights
        #[arg(long)]
        backbone_weights: Option<PathBuf>,
    },

    /// Show dataset statistics
    Stats {
        /// Path to the dataset directory
        #[arg(short, long, default_value = "dataset_skin")]
        data_dir: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_config = if cli.verbose {
        LogConfig::verbose()
    } else {
        LogConfig::default()
    };
    let _ = init_logging(&log_config);

    print_banner();

    match cli.command {
        Commands::Train {
            data_dir,
            image_size,
            batch_size,
            epochs,
            validation_fraction,
            seed,
            learning_rate,
            dropout,
            head_width,
            patience,
            output_dir,
            backbone_weights,
        } => {
            let config = TrainConfig {
                data_dir: PathBuf::from(data_dir),
                image_size,
                batch_size,
                epochs,
                validation_fraction,
                seed,
                learning_rate,
                dropout,
                head_width,
                patience,
                output_dir: PathBuf::from(output_dir),
                backbone_weights,
                ..Default::default()
            };

            println!("{}", "Checking available devices...".cyan());
            let selection = select_device();
            println!("  Backend: {}", backend_name());
            println!("  Selected: {}", selection.label);
            if !selection.accelerated {
                println!(
                    "  {}",
                    "No accelerator available, continuing on CPU".yellow()
                );
            }
            println!();

            let report = fit::<TrainingBackend>(&config, selection.device)?;
            info!(
                "Run finished: {} epochs, best accuracy {:.2}%",
                report.epochs_run,
                report.best_val_accuracy * 100.0
            );
        }

        Commands::Stats { data_dir } => {
            cmd_stats(&data_dir)?;
        }
    }

    Ok(())
}

fn print_banner() {
    println!(
        "{}",
        r#"
 ----------------------------------------------------------
  dermaclass - skin disease classification
  Transfer learning with Burn + Rust
 ----------------------------------------------------------
"#
        .green()
    );
}

fn cmd_stats(data_dir: &str) -> Result<()> {
    info!("Computing dataset statistics for: {}", data_dir);

    match SkinDataset::new(data_dir) {
        Ok(dataset) => {
            dataset.stats().print();
            println!();
            println!("  Classes: {:?}", dataset.class_names());
        }
        Err(e) => {
            println!("{} Failed to load dataset: {}", "Error:".red(), e);
            println!();
            println!("Expected directory structure:");
            println!("  {}/", data_dir);
            println!("  |-- <class_name>/");
            println!("  |   |-- image1.jpg");
            println!("  |   `-- image2.jpg");
            println!("  `-- ...");
        }
    }

    Ok(())
}
