use crate::classifier::Device;
use candle_core::utils::{cuda_is_available, metal_is_available};
use tracing::{info, warn};

/// Picks the accelerator the binary was built for when one can be opened,
/// otherwise the CPU. `force_cpu` skips the probe.
pub fn select_device(force_cpu: bool) -> Device {
    let device = if force_cpu {
        Device::Cpu
    } else if cuda_is_available() {
        Device::new_cuda(0).unwrap_or_else(|err| {
            warn!(%err, "cuda device unavailable, falling back to cpu");
            Device::Cpu
        })
    } else if metal_is_available() {
        Device::new_metal(0).unwrap_or_else(|err| {
            warn!(%err, "metal device unavailable, falling back to cpu");
            Device::Cpu
        })
    } else {
        Device::Cpu
    };
    info!(?device, "selected compute device");
    device
}
