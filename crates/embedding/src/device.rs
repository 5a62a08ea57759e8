use candle_core::Device;

/// Environment variable that pins inference to the CPU.
pub const FORCE_CPU_ENV: &str = "CANDLE_FORCE_CPU";

/// Picks the best available backend: Metal (when compiled in), then CUDA,
/// then CPU.
pub fn select_device(force_cpu: bool) -> Device {
    if force_cpu || std::env::var(FORCE_CPU_ENV).is_ok() {
        log::info!("CPU backend forced");
        return Device::Cpu;
    }

    #[cfg(feature = "metal")]
    {
        match Device::new_metal(0) {
            Ok(device) => {
                log::info!("Metal device selected: {:?}", device);
                return device;
            }
            Err(err) => log::info!("Metal unavailable ({err}), falling back"),
        }
    }

    match Device::cuda_if_available(0) {
        Ok(device) if device.is_cuda() => {
            log::info!("CUDA device selected: {:?}", device);
            device
        }
        Ok(_) | Err(_) => {
            log::info!("Using CPU backend");
            Device::Cpu
        }
    }
}
