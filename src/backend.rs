//! Backend and device selection.
//!
//! The compute backend is fixed at compile time by cargo feature, accelerator
//! first: `cuda` > `wgpu` > `ndarray` (CPU, the default). At runtime the run
//! is pinned to the first device the compiled backend exposes; when no
//! accelerator feature is enabled the run proceeds on the CPU. Missing
//! hardware is logged, never fatal.

use burn::backend::Autodiff;
use tracing::{info, warn};

#[cfg(feature = "cuda")]
pub type DefaultBackend = burn::backend::Cuda;

#[cfg(all(feature = "wgpu", not(feature = "cuda")))]
pub type DefaultBackend = burn::backend::Wgpu;

#[cfg(all(feature = "ndarray", not(any(feature = "cuda", feature = "wgpu"))))]
pub type DefaultBackend = burn::backend::NdArray;

/// The autodiff backend used for training
pub type TrainingBackend = Autodiff<DefaultBackend>;

/// Device type of the selected backend
pub type Device = <DefaultBackend as burn::tensor::backend::Backend>::Device;

/// Outcome of device selection
#[derive(Debug, Clone)]
pub struct DeviceSelection {
    /// The device every stage of the pipeline runs on
    pub device: Device,
    /// Human-readable device description
    pub label: String,
    /// Whether the device is an accelerator (GPU)
    pub accelerated: bool,
}

/// Human-readable descriptions of the accelerator devices the compiled
/// backend can bind. Empty on the CPU backend.
pub fn accelerator_devices() -> Vec<String> {
    #[cfg(feature = "cuda")]
    {
        vec!["cuda:0".to_string()]
    }
    #[cfg(all(feature = "wgpu", not(feature = "cuda")))]
    {
        vec!["wgpu (default adapter)".to_string()]
    }
    #[cfg(all(feature = "ndarray", not(any(feature = "cuda", feature = "wgpu"))))]
    {
        Vec::new()
    }
}

/// Pin execution to the first accelerator device, falling back to the CPU
/// when none is available.
pub fn select_device() -> DeviceSelection {
    let accelerators = accelerator_devices();

    if accelerators.is_empty() {
        warn!("No accelerator detected, training on CPU");
        return DeviceSelection {
            device: Device::default(),
            label: format!("{} (cpu)", backend_name()),
            accelerated: false,
        };
    }

    info!("Detected accelerator devices: {:?}", accelerators);
    info!("Pinning execution to: {}", accelerators[0]);

    DeviceSelection {
        device: first_accelerator(),
        label: format!("{} ({})", backend_name(), accelerators[0]),
        accelerated: true,
    }
}

#[cfg(feature = "cuda")]
fn first_accelerator() -> Device {
    burn::backend::cuda::CudaDevice::new(0)
}

#[cfg(all(feature = "wgpu", not(feature = "cuda")))]
fn first_accelerator() -> Device {
    burn::backend::wgpu::WgpuDevice::default()
}

#[cfg(all(feature = "ndarray", not(any(feature = "cuda", feature = "wgpu"))))]
fn first_accelerator() -> Device {
    Device::default()
}

/// Name of the compiled backend
pub fn backend_name() -> &'static str {
    #[cfg(feature = "cuda")]
    {
        "CUDA"
    }
    #[cfg(all(feature = "wgpu", not(feature = "cuda")))]
    {
        "WGPU"
    }
    #[cfg(all(feature = "ndarray", not(any(feature = "cuda", feature = "wgpu"))))]
    {
        "NdArray"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_device_always_succeeds() {
        let selection = select_device();
        assert!(!selection.label.is_empty());
    }

    #[cfg(all(feature = "ndarray", not(any(feature = "cuda", feature = "wgpu"))))]
    #[test]
    fn test_cpu_backend_reports_no_accelerators() {
        assert!(accelerator_devices().is_empty());
        assert!(!select_device().accelerated);
    }
}
