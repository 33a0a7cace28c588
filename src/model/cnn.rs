//! Classification backbones.
//!
//! Two fine-tuning backbones are provided behind the unified
//! `ScanClassifier` interface:
//! - ResNet-18 with standard basic residual blocks
//! - A compact EfficientNet-B0-style network for smaller deployments
//!
//! Pretrained parameters are loaded from a Burn record file when available;
//! otherwise the backbone starts from random initialization.

use burn::{
    module::Module,
    nn::{
        conv::{Conv2d, Conv2dConfig},
        pool::{AdaptiveAvgPool2d, AdaptiveAvgPool2dConfig, MaxPool2d, MaxPool2dConfig},
        BatchNorm, BatchNormConfig, Dropout, DropoutConfig, Linear, LinearConfig, PaddingConfig2d,
        Relu,
    },
    tensor::{backend::Backend, Tensor},
};

use super::Backbone;

/// Convolution + batch norm + ReLU unit.
#[derive(Module, Debug)]
pub struct ConvBnAct<B: Backend> {
    conv: Conv2d<B>,
    bn: BatchNorm<B, 2>,
    act: Relu,
}

impl<B: Backend> ConvBnAct<B> {
    fn new(channels: [usize; 2], kernel: usize, stride: usize, device: &B::Device) -> Self {
        let padding = kernel / 2;
        let conv = Conv2dConfig::new(channels, [kernel, kernel])
            .with_stride([stride, stride])
            .with_padding(PaddingConfig2d::Explicit(padding, padding))
            .init(device);
        let bn = BatchNormConfig::new(channels[1]).init(device);

        Self {
            conv,
            bn,
            act: Relu::new(),
        }
    }

    fn forward(&self, input: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = self.conv.forward(input);
        let x = self.bn.forward(x);
        self.act.forward(x)
    }
}

/// 1x1 projection shortcut for residual blocks that change shape.
#[derive(Module, Debug)]
pub struct Projection<B: Backend> {
    conv: Conv2d<B>,
    bn: BatchNorm<B, 2>,
}

impl<B: Backend> Projection<B> {
    fn new(channels: [usize; 2], stride: usize, device: &B::Device) -> Self {
        let conv = Conv2dConfig::new(channels, [1, 1])
            .with_stride([stride, stride])
            .init(device);
        let bn = BatchNormConfig::new(channels[1]).init(device);

        Self { conv, bn }
    }

    fn forward(&self, input: Tensor<B, 4>) -> Tensor<B, 4> {
        self.bn.forward(self.conv.forward(input))
    }
}

/// Basic residual block: two 3x3 convolutions and an identity or
/// projection shortcut.
#[derive(Module, Debug)]
pub struct BasicBlock<B: Backend> {
    conv1: Conv2d<B>,
    bn1: BatchNorm<B, 2>,
    conv2: Conv2d<B>,
    bn2: BatchNorm<B, 2>,
    shortcut: Option<Projection<B>>,
    act: Relu,
}

impl<B: Backend> BasicBlock<B> {
    fn new(in_channels: usize, out_channels: usize, stride: usize, device: &B::Device) -> Self {
        let conv1 = Conv2dConfig::new([in_channels, out_channels], [3, 3])
            .with_stride([stride, stride])
            .with_padding(PaddingConfig2d::Explicit(1, 1))
            .init(device);
        let bn1 = BatchNormConfig::new(out_channels).init(device);

        let conv2 = Conv2dConfig::new([out_channels, out_channels], [3, 3])
            .with_padding(PaddingConfig2d::Explicit(1, 1))
            .init(device);
        let bn2 = BatchNormConfig::new(out_channels).init(device);

        let shortcut = (stride != 1 || in_channels != out_channels)
            .then(|| Projection::new([in_channels, out_channels], stride, device));

        Self {
            conv1,
            bn1,
            conv2,
            bn2,
            shortcut,
            act: Relu::new(),
        }
    }

    fn forward(&self, input: Tensor<B, 4>) -> Tensor<B, 4> {
        let identity = match &self.shortcut {
            Some(projection) => projection.forward(input.clone()),
            None => input.clone(),
        };

        let x = self.conv1.forward(input);
        let x = self.bn1.forward(x);
        let x = self.act.forward(x);
        let x = self.conv2.forward(x);
        let x = self.bn2.forward(x);

        self.act.forward(x.add(identity))
    }
}

/// ResNet-18 backbone.
#[derive(Module, Debug)]
pub struct ResNet18<B: Backend> {
    stem: ConvBnAct<B>,
    maxpool: MaxPool2d,
    stages: Vec<BasicBlock<B>>,
    avgpool: AdaptiveAvgPool2d,
    fc: Linear<B>,
}

impl<B: Backend> ResNet18<B> {
    pub fn new(num_classes: usize, device: &B::Device) -> Self {
        let stem = ConvBnAct::new([3, 64], 7, 2, device);
        let maxpool = MaxPool2dConfig::new([3, 3])
            .with_strides([2, 2])
            .with_padding(PaddingConfig2d::Explicit(1, 1))
            .init();

        // Four stages of two basic blocks each; the first block of each
        // stage past the first downsamples.
        let mut stages = Vec::with_capacity(8);
        let widths = [64usize, 128, 256, 512];
        let mut in_channels = 64;
        for (stage_idx, &width) in widths.iter().enumerate() {
            let stride = if stage_idx == 0 { 1 } else { 2 };
            stages.push(BasicBlock::new(in_channels, width, stride, device));
            stages.push(BasicBlock::new(width, width, 1, device));
            in_channels = width;
        }

        let avgpool = AdaptiveAvgPool2dConfig::new([1, 1]).init();
        let fc = LinearConfig::new(512, num_classes).init(device);

        Self {
            stem,
            maxpool,
            stages,
            avgpool,
            fc,
        }
    }

    pub fn forward(&self, input: Tensor<B, 4>) -> Tensor<B, 2> {
        let mut x = self.stem.forward(input);
        x = self.maxpool.forward(x);

        for block in &self.stages {
            x = block.forward(x);
        }

        let x = self.avgpool.forward(x);
        let [batch, channels, _, _] = x.dims();
        let x: Tensor<B, 2> = x.reshape([batch, channels]);

        self.fc.forward(x)
    }
}

/// Compact EfficientNet-B0-style backbone.
#[derive(Module, Debug)]
pub struct EfficientNetB0<B: Backend> {
    stem: ConvBnAct<B>,
    blocks: Vec<ConvBnAct<B>>,
    head: ConvBnAct<B>,
    pool: AdaptiveAvgPool2d,
    dropout: Dropout,
    fc: Linear<B>,
}

impl<B: Backend> EfficientNetB0<B> {
    pub fn new(num_classes: usize, device: &B::Device) -> Self {
        let stem = ConvBnAct::new([3, 32], 3, 2, device);

        // (in, out, kernel, stride) per block, tracing the early B0 stages
        // with expansion convolutions flattened out.
        let specs: [(usize, usize, usize, usize); 5] = [
            (32, 16, 3, 1),
            (16, 96, 1, 1),
            (96, 24, 3, 2),
            (24, 144, 1, 1),
            (144, 40, 5, 2),
        ];
        let blocks = specs
            .iter()
            .map(|&(cin, cout, kernel, stride)| {
                ConvBnAct::new([cin, cout], kernel, stride, device)
            })
            .collect();

        let head = ConvBnAct::new([40, 1280], 1, 1, device);
        let pool = AdaptiveAvgPool2dConfig::new([1, 1]).init();
        let dropout = DropoutConfig::new(0.2).init();
        let fc = LinearConfig::new(1280, num_classes).init(device);

        Self {
            stem,
            blocks,
            head,
            pool,
            dropout,
            fc,
        }
    }

    pub fn forward(&self, input: Tensor<B, 4>) -> Tensor<B, 2> {
        let mut x = self.stem.forward(input);
        for block in &self.blocks {
            x = block.forward(x);
        }
        x = self.head.forward(x);

        let x = self.pool.forward(x);
        let [batch, channels, _, _] = x.dims();
        let x: Tensor<B, 2> = x.reshape([batch, channels]);

        let x = self.dropout.forward(x);
        self.fc.forward(x)
    }
}

/// Backbone dispatch.
#[derive(Module, Debug)]
pub enum BackboneNet<B: Backend> {
    ResNet18(ResNet18<B>),
    EfficientNetB0(EfficientNetB0<B>),
}

/// Unified classifier over the supported backbones.
#[derive(Module, Debug)]
pub struct ScanClassifier<B: Backend> {
    backbone: BackboneNet<B>,
    num_classes: usize,
}

impl<B: Backend> ScanClassifier<B> {
    /// Create a classifier with the given backbone and output size.
    pub fn new(backbone: Backbone, num_classes: usize, device: &B::Device) -> Self {
        let backbone = match backbone {
            Backbone::ResNet18 => BackboneNet::ResNet18(ResNet18::new(num_classes, device)),
            Backbone::EfficientNetB0 => {
                BackboneNet::EfficientNetB0(EfficientNetB0::new(num_classes, device))
            }
        };

        Self {
            backbone,
            num_classes,
        }
    }

    /// Forward pass producing class logits `[batch, num_classes]`.
    pub fn forward(&self, input: Tensor<B, 4>) -> Tensor<B, 2> {
        match &self.backbone {
            BackboneNet::ResNet18(net) => net.forward(input),
            BackboneNet::EfficientNetB0(net) => net.forward(input),
        }
    }

    pub fn num_classes(&self) -> usize {
        self.num_classes
    }
}
