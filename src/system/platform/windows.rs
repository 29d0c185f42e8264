use windows_sys::Win32::System::Power::{GetSystemPowerStatus, SYSTEM_POWER_STATUS};

use super::PlatformExtensions;
use crate::system::sensors::RawBattery;

const NO_SYSTEM_BATTERY: u8 = 128;
const CHARGING: u8 = 8;
const UNKNOWN_STATUS: u8 = 255;

pub struct Platform;

impl PlatformExtensions for Platform {
    fn battery() -> Option<RawBattery> {
        let mut status = unsafe { std::mem::zeroed::<SYSTEM_POWER_STATUS>() };
        let ok = unsafe { GetSystemPowerStatus(&mut status) };
        if ok == 0 {
            return None;
        }
        if status.BatteryFlag == UNKNOWN_STATUS || status.BatteryFlag & NO_SYSTEM_BATTERY != 0 {
            return None;
        }

        let percent = (status.BatteryLifePercent != UNKNOWN_STATUS)
            .then_some(f64::from(status.BatteryLifePercent));
        // Seconds; u32::MAX means the estimate is unknown.
        let time_remaining =
            (status.BatteryLifeTime != u32::MAX).then_some(status.BatteryLifeTime / 60);

        Some(RawBattery {
            percent,
            is_charging: Some(status.BatteryFlag & CHARGING != 0),
            time_remaining,
            ..RawBattery::default()
        })
    }

    fn hardware_vendor() -> Option<String> {
        // Would need WMI; reported as Unknown.
        None
    }

    fn hardware_model() -> Option<String> {
        None
    }
}
