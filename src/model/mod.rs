//! Model provider: backbone selection and pretrained weight loading.

pub mod cnn;

use std::path::Path;
use std::str::FromStr;

use burn::module::Module;
use burn::record::CompactRecorder;
use burn::tensor::backend::Backend;

use crate::utils::error::{Error, Result};

pub use cnn::{BackboneNet, EfficientNetB0, ResNet18, ScanClassifier};

/// Supported backbone identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backbone {
    ResNet18,
    EfficientNetB0,
}

impl FromStr for Backbone {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "resnet18" => Ok(Backbone::ResNet18),
            "efficientnet_b0" | "efficientnet-b0" => Ok(Backbone::EfficientNetB0),
            other => Err(Error::Model(format!(
                "unknown backbone identifier '{other}' (expected resnet18 or efficientnet_b0)"
            ))),
        }
    }
}

impl std::fmt::Display for Backbone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Backbone::ResNet18 => write!(f, "resnet18"),
            Backbone::EfficientNetB0 => write!(f, "efficientnet_b0"),
        }
    }
}

/// Build a classifier for the given `weights` identifier, loading a
/// pretrained record file when one is configured.
pub fn build<B: Backend>(
    weights: &str,
    num_classes: usize,
    pretrained: Option<&Path>,
    device: &B::Device,
) -> Result<ScanClassifier<B>> {
    let backbone: Backbone = weights.parse()?;
    let model = ScanClassifier::new(backbone, num_classes, device);

    match pretrained {
        Some(path) => {
            let recorder = CompactRecorder::new();
            model.load_file(path, &recorder, device).map_err(|e| {
                Error::Model(format!(
                    "failed to load pretrained weights {}: {e:?}",
                    path.display()
                ))
            })
        }
        None => Ok(model),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    #[test]
    fn test_backbone_parsing() {
        assert_eq!("resnet18".parse::<Backbone>().unwrap(), Backbone::ResNet18);
        assert_eq!(
            "efficientnet_b0".parse::<Backbone>().unwrap(),
            Backbone::EfficientNetB0
        );
        assert!("vgg16".parse::<Backbone>().is_err());
    }

    #[test]
    fn test_backbone_display_round_trip() {
        for backbone in [Backbone::ResNet18, Backbone::EfficientNetB0] {
            let parsed: Backbone = backbone.to_string().parse().unwrap();
            assert_eq!(parsed, backbone);
        }
    }

    #[test]
    fn test_build_without_pretrained() {
        let device = Default::default();
        let model = build::<NdArray>("resnet18", 2, None, &device).unwrap();
        assert_eq!(model.num_classes(), 2);
    }

    #[test]
    fn test_build_unknown_identifier() {
        let device = Default::default();
        let result = build::<NdArray>("resnet50", 2, None, &device);
        assert!(matches!(result, Err(Error::Model(_))));
    }

    #[test]
    fn test_build_missing_pretrained_file() {
        let device = Default::default();
        let result = build::<NdArray>(
            "resnet18",
            2,
            Some(Path::new("/nonexistent/weights")),
            &device,
        );
        assert!(matches!(result, Err(Error::Model(_))));
    }
}
