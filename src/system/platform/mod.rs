//! Host readings `sysinfo` does not provide: battery state and the hardware
//! vendor/model strings.

use super::sensors::RawBattery;

pub trait PlatformExtensions {
    fn battery() -> Option<RawBattery>;
    fn hardware_vendor() -> Option<String>;
    fn hardware_model() -> Option<String>;
}

#[cfg(target_os = "linux")]
mod linux;
#[cfg(target_os = "macos")]
mod macos;
#[cfg(target_os = "windows")]
mod windows;
#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
mod unsupported;

#[cfg(target_os = "linux")]
use linux as platform_impl;
#[cfg(target_os = "macos")]
use macos as platform_impl;
#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
use unsupported as platform_impl;
#[cfg(target_os = "windows")]
use windows as platform_impl;

/// `None` when the host has no battery or does not expose one.
pub fn battery() -> Option<RawBattery> {
    platform_impl::Platform::battery()
}

pub fn hardware_vendor() -> Option<String> {
    platform_impl::Platform::hardware_vendor()
}

pub fn hardware_model() -> Option<String> {
    platform_impl::Platform::hardware_model()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrappers_do_not_panic() {
        let _ = battery();
        let _ = hardware_vendor();
        let _ = hardware_model();
    }
}
