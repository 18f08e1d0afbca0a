//! Trainable classification head.
//!
//! Global average pooling collapses the backbone's feature map, followed by
//! a hidden dense layer with ReLU, dropout for regularization, and the
//! output projection to one logit per class.

use burn::{
    module::Module,
    nn::{
        pool::{AdaptiveAvgPool2d, AdaptiveAvgPool2dConfig},
        Dropout, DropoutConfig, Linear, LinearConfig,
    },
    tensor::{activation::relu, backend::Backend, Tensor},
};

/// Classification head: pooling -> dense -> dropout -> dense
#[derive(Module, Debug)]
pub struct Head<B: Backend> {
    pool: AdaptiveAvgPool2d,
    fc1: Linear<B>,
    dropout: Dropout,
    fc2: Linear<B>,
}

impl<B: Backend> Head<B> {
    /// Build a head mapping `in_channels` features to `num_classes` logits
    pub fn new(
        in_channels: usize,
        hidden_width: usize,
        num_classes: usize,
        dropout_rate: f64,
        device: &B::Device,
    ) -> Self {
        Self {
            pool: AdaptiveAvgPool2dConfig::new([1, 1]).init(),
            fc1: LinearConfig::new(in_channels, hidden_width).init(device),
            dropout: DropoutConfig::new(dropout_rate).init(),
            fc2: LinearConfig::new(hidden_width, num_classes).init(device),
        }
    }

    /// Forward pass: [B, C, H, W] features -> [B, num_classes] logits
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 2> {
        let x = self.pool.forward(x);

        let [batch_size, channels, _, _] = x.dims();
        let x = x.reshape([batch_size, channels]);

        let x = self.fc1.forward(x);
        let x = relu(x);
        let x = self.dropout.forward(x);
        self.fc2.forward(x)
    }
}
