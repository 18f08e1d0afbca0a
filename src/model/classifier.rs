//! The full classifier: frozen backbone + trainable head.

use std::path::PathBuf;

use burn::{
    module::Module,
    tensor::{activation::softmax, backend::Backend, Tensor},
};
use colored::Colorize;
use tracing::{info, warn};

use super::backbone::Backbone;
use super::head::Head;
use crate::utils::error::Result;

/// Trainability flag per parameter group.
///
/// A group with its flag cleared is detached from gradient tracking, so the
/// optimizer never sees its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trainability {
    pub backbone: bool,
    pub head: bool,
}

impl Default for Trainability {
    fn default() -> Self {
        // Transfer learning: frozen feature extractor, trainable head
        Self {
            backbone: false,
            head: true,
        }
    }
}

/// Everything needed to assemble a classifier
#[derive(Debug, Clone)]
pub struct ModelSpec {
    /// Number of output classes
    pub num_classes: usize,
    /// Width of the hidden dense layer in the head
    pub head_width: usize,
    /// Dropout rate in the head
    pub dropout: f64,
    /// Per-group trainability flags
    pub trainability: Trainability,
    /// Optional Burn record file with pretrained backbone weights
    pub backbone_weights: Option<PathBuf>,
}

/// Skin disease classifier
#[derive(Module, Debug)]
pub struct SkinClassifier<B: Backend> {
    backbone: Backbone<B>,
    head: Head<B>,
    num_classes: usize,
}

impl<B: Backend> SkinClassifier<B> {
    /// Assemble the classifier from a spec.
    ///
    /// Loads pretrained backbone weights when configured; a configured but
    /// unreadable weights file is fatal, while an unconfigured one falls
    /// back to random initialization with a warning.
    pub fn new(spec: &ModelSpec, device: &B::Device) -> Result<Self> {
        let mut backbone = Backbone::new(device);

        match &spec.backbone_weights {
            Some(path) => {
                backbone = backbone.load_record_file(path, device)?;
                info!("Loaded pretrained backbone weights from {:?}", path);
            }
            None => {
                warn!("No pretrained backbone weights configured, using random initialization");
            }
        }

        if !spec.trainability.backbone {
            backbone = backbone.no_grad();
        }

        let mut head = Head::new(
            backbone.out_channels(),
            spec.head_width,
            spec.num_classes,
            spec.dropout,
            device,
        );
        if !spec.trainability.head {
            head = head.no_grad();
        }

        Ok(Self {
            backbone,
            head,
            num_classes: spec.num_classes,
        })
    }

    /// Forward pass producing logits of shape [batch_size, num_classes]
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 2> {
        let features = self.backbone.forward(x);
        self.head.forward(features)
    }

    /// Forward pass with softmax for inference-style probabilities
    pub fn forward_softmax(&self, x: Tensor<B, 4>) -> Tensor<B, 2> {
        softmax(self.forward(x), 1)
    }

    /// Number of output classes
    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    /// Parameter count of the backbone group
    pub fn backbone_params(&self) -> usize {
        self.backbone.num_params()
    }

    /// Parameter count of the head group
    pub fn head_params(&self) -> usize {
        self.head.num_params()
    }

    /// Print an architecture summary to the console
    pub fn print_summary(&self, trainability: &Trainability) {
        let flag = |trainable: bool| {
            if trainable {
                "trainable".green()
            } else {
                "frozen".yellow()
            }
        };

        println!("{}", "Model architecture:".cyan().bold());
        println!("  MobileNetV2 backbone -> pooling -> dense -> dropout -> dense");
        println!(
            "  backbone: {:>10} params ({})",
            self.backbone_params(),
            flag(trainability.backbone)
        );
        println!(
            "  head:     {:>10} params ({})",
            self.head_params(),
            flag(trainability.head)
        );
        println!("  output classes: {}", self.num_classes);
    }
}
