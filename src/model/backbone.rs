//! MobileNetV2 feature extractor built with Burn modules.
//!
//! Standard MobileNetV2 topology: a strided conv stem, seven groups of
//! inverted-residual bottleneck blocks, and a final 1x1 convolution up to
//! 1280 feature channels. ReLU6 activations throughout. The extractor is
//! fully convolutional, so any input size divisible by 32 works; weights
//! are loaded from a Burn record converted from ImageNet-pretrained
//! checkpoints.

use std::path::Path;

use burn::{
    module::Module,
    nn::{
        conv::{Conv2d, Conv2dConfig},
        BatchNorm, BatchNormConfig, PaddingConfig2d,
    },
    record::CompactRecorder,
    tensor::{backend::Backend, Tensor},
};

use crate::utils::error::{DermaError, Result};
use crate::FEATURE_CHANNELS;

/// Inverted-residual block table: (expansion, out_channels, repeats, stride)
const BLOCK_TABLE: [(usize, usize, usize, usize); 7] = [
    (1, 16, 1, 1),
    (6, 24, 2, 2),
    (6, 32, 3, 2),
    (6, 64, 4, 2),
    (6, 96, 3, 1),
    (6, 160, 3, 2),
    (6, 320, 1, 1),
];

const STEM_CHANNELS: usize = 32;
const BOTTLENECK_OUT: usize = 320;

/// Convolution followed by batch norm and ReLU6
#[derive(Module, Debug)]
pub struct ConvBnRelu6<B: Backend> {
    conv: Conv2d<B>,
    bn: BatchNorm<B, 2>,
}

impl<B: Backend> ConvBnRelu6<B> {
    fn new(
        in_channels: usize,
        out_channels: usize,
        kernel_size: usize,
        stride: usize,
        groups: usize,
        device: &B::Device,
    ) -> Self {
        let padding = kernel_size / 2;
        let conv = Conv2dConfig::new([in_channels, out_channels], [kernel_size, kernel_size])
            .with_stride([stride, stride])
            .with_padding(PaddingConfig2d::Explicit(padding, padding))
            .with_groups(groups)
            .with_bias(false)
            .init(device);
        let bn = BatchNormConfig::new(out_channels).init(device);

        Self { conv, bn }
    }

    fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = self.conv.forward(x);
        let x = self.bn.forward(x);
        x.clamp(0.0, 6.0)
    }
}

/// MobileNetV2 inverted-residual bottleneck block
#[derive(Module, Debug)]
pub struct InvertedResidual<B: Backend> {
    expand: Option<ConvBnRelu6<B>>,
    depthwise: ConvBnRelu6<B>,
    project: Conv2d<B>,
    project_bn: BatchNorm<B, 2>,
    residual: bool,
}

impl<B: Backend> InvertedResidual<B> {
    fn new(
        in_channels: usize,
        out_channels: usize,
        stride: usize,
        expansion: usize,
        device: &B::Device,
    ) -> Self {
        let hidden = in_channels * expansion;

        let expand = if expansion != 1 {
            Some(ConvBnRelu6::new(in_channels, hidden, 1, 1, 1, device))
        } else {
            None
        };

        let depthwise = ConvBnRelu6::new(hidden, hidden, 3, stride, hidden, device);

        let project = Conv2dConfig::new([hidden, out_channels], [1, 1])
            .with_bias(false)
            .init(device);
        let project_bn = BatchNormConfig::new(out_channels).init(device);

        Self {
            expand,
            depthwise,
            project,
            project_bn,
            residual: stride == 1 && in_channels == out_channels,
        }
    }

    fn forward(&self, input: Tensor<B, 4>) -> Tensor<B, 4> {
        let mut x = input.clone();

        if let Some(expand) = &self.expand {
            x = expand.forward(x);
        }
        x = self.depthwise.forward(x);

        // Linear bottleneck: no activation after projection
        x = self.project.forward(x);
        x = self.project_bn.forward(x);

        if self.residual {
            input + x
        } else {
            x
        }
    }
}

/// MobileNetV2 feature extractor
#[derive(Module, Debug)]
pub struct Backbone<B: Backend> {
    stem: ConvBnRelu6<B>,
    blocks: Vec<InvertedResidual<B>>,
    last: ConvBnRelu6<B>,
}

impl<B: Backend> Backbone<B> {
    /// Build a randomly initialized feature extractor
    pub fn new(device: &B::Device) -> Self {
        let stem = ConvBnRelu6::new(3, STEM_CHANNELS, 3, 2, 1, device);

        let mut blocks = Vec::new();
        let mut in_channels = STEM_CHANNELS;
        for &(expansion, out_channels, repeats, stride) in BLOCK_TABLE.iter() {
            for i in 0..repeats {
                let stride = if i == 0 { stride } else { 1 };
                blocks.push(InvertedResidual::new(
                    in_channels,
                    out_channels,
                    stride,
                    expansion,
                    device,
                ));
                in_channels = out_channels;
            }
        }

        let last = ConvBnRelu6::new(BOTTLENECK_OUT, FEATURE_CHANNELS, 1, 1, 1, device);

        Self { stem, blocks, last }
    }

    /// Load pretrained weights from a Burn record file.
    ///
    /// The record must have been produced from this module tree (converted
    /// offline from an ImageNet checkpoint). An unreadable or mismatched
    /// file is a fatal error.
    pub fn load_record_file<P: AsRef<Path>>(self, path: P, device: &B::Device) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(DermaError::PathNotFound(path.to_path_buf()));
        }

        let recorder = CompactRecorder::new();
        self.load_file(path, &recorder, device)
            .map_err(|e| DermaError::Record(format!("failed to load backbone weights: {:?}", e)))
    }

    /// Number of feature channels in the output
    pub fn out_channels(&self) -> usize {
        FEATURE_CHANNELS
    }

    /// Extract features: [B, 3, H, W] -> [B, 1280, H/32, W/32]
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let mut x = self.stem.forward(x);
        for block in &self.blocks {
            x = block.forward(x);
        }
        self.last.forward(x)
    }
}
