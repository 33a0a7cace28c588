//! Backend selection for the Burn framework.
//!
//! The CPU `NdArray` backend is the default; enabling the `wgpu` feature
//! switches the whole pipeline to the WebGPU backend. The device handle is
//! resolved once here and injected into the training loop.

use burn::backend::Autodiff;

#[cfg(feature = "wgpu")]
pub type DefaultBackend = burn::backend::Wgpu;

#[cfg(not(feature = "wgpu"))]
pub type DefaultBackend = burn::backend::NdArray;

/// The autodiff backend used for training.
pub type TrainingBackend = Autodiff<DefaultBackend>;

/// Resolve the device for the selected backend.
pub fn default_device() -> <DefaultBackend as burn::tensor::backend::Backend>::Device {
    #[cfg(feature = "wgpu")]
    {
        burn::backend::wgpu::WgpuDevice::default()
    }

    #[cfg(not(feature = "wgpu"))]
    {
        burn::backend::ndarray::NdArrayDevice::default()
    }
}

/// Human-readable name for the selected backend.
pub fn backend_name() -> &'static str {
    #[cfg(feature = "wgpu")]
    {
        "wgpu"
    }

    #[cfg(not(feature = "wgpu"))]
    {
        "ndarray (CPU)"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_device_resolves() {
        let _device = default_device();
    }

    #[test]
    fn test_backend_name_nonempty() {
        assert!(!backend_name().is_empty());
    }
}
