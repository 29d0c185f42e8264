use super::PlatformExtensions;
use crate::system::sensors::RawBattery;

pub struct Platform;

impl PlatformExtensions for Platform {
    fn battery() -> Option<RawBattery> {
        None
    }

    fn hardware_vendor() -> Option<String> {
        None
    }

    fn hardware_model() -> Option<String> {
        None
    }
}
