//! Compute device selection.
//!
//! Both models run on the same device. Accelerators are tried first and the
//! CPU is the fallback, so a missing GPU never prevents the models from
//! loading.

use candle_core::{DType, Device};
use std::fmt;
use tracing::info;

/// Kind of compute device the models were placed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceType {
    Cpu,
    Cuda,
    Metal,
}

impl DeviceType {
    /// Whether the device is a GPU.
    pub fn is_accelerated(&self) -> bool {
        !matches!(self, DeviceType::Cpu)
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceType::Cpu => write!(f, "cpu"),
            DeviceType::Cuda => write!(f, "cuda"),
            DeviceType::Metal => write!(f, "metal"),
        }
    }
}

/// Selects the best available compute device.
///
/// Tries CUDA, then Metal, then falls back to CPU.
pub fn select_device() -> (Device, DeviceType) {
    if let Ok(cuda_device) = Device::new_cuda(0) {
        info!("Using CUDA GPU");
        return (cuda_device, DeviceType::Cuda);
    }

    if let Ok(metal_device) = Device::new_metal(0) {
        info!("Using Metal GPU");
        return (metal_device, DeviceType::Metal);
    }

    #[cfg(any(target_os = "macos", target_os = "ios"))]
    info!("Using CPU (with Accelerate)");

    #[cfg(not(any(target_os = "macos", target_os = "ios")))]
    info!("Using CPU");

    (Device::Cpu, DeviceType::Cpu)
}

/// Selects the weight precision for the generation model.
///
/// Half precision on accelerators, full precision on CPU where F16 matmuls
/// are slow or unsupported. The embedding model always runs in F32.
pub fn select_dtype(device_type: DeviceType) -> DType {
    if device_type.is_accelerated() {
        DType::F16
    } else {
        DType::F32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cpu_uses_full_precision() {
        assert_eq!(select_dtype(DeviceType::Cpu), DType::F32);
        assert_eq!(select_dtype(DeviceType::Metal), DType::F16);
        assert_eq!(select_dtype(DeviceType::Cuda), DType::F16);
    }

    #[test]
    fn test_select_device_always_returns_a_device() {
        let (device, kind) = select_device();
        if kind == DeviceType::Cpu {
            assert!(matches!(device, Device::Cpu));
        }
    }
}
