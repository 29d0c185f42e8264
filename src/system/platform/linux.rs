use std::path::{Path, PathBuf};

use super::PlatformExtensions;
use crate::system::sensors::RawBattery;

const POWER_SUPPLY_DIR: &str = "/sys/class/power_supply";
const DMI_DIR: &str = "/sys/class/dmi/id";
const DEVICE_TREE_MODEL: &str = "/proc/device-tree/model";

pub struct Platform;

impl PlatformExtensions for Platform {
    fn battery() -> Option<RawBattery> {
        let dir = find_battery_dir(Path::new(POWER_SUPPLY_DIR))?;
        read_battery_dir(&dir)
    }

    fn hardware_vendor() -> Option<String> {
        read_trimmed(&Path::new(DMI_DIR).join("sys_vendor"))
    }

    fn hardware_model() -> Option<String> {
        // Boards without DMI (Raspberry Pi and friends) expose a device-tree model.
        read_trimmed(&Path::new(DMI_DIR).join("product_name"))
            .or_else(|| read_trimmed(Path::new(DEVICE_TREE_MODEL)))
    }
}

fn find_battery_dir(root: &Path) -> Option<PathBuf> {
    let mut candidates: Vec<PathBuf> = std::fs::read_dir(root)
        .ok()?
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| {
            read_trimmed(&path.join("type")).as_deref() == Some("Battery")
                // Peripheral batteries (mice, headsets) report scope "Device".
                && read_trimmed(&path.join("scope")).as_deref() != Some("Device")
        })
        .collect();
    candidates.sort();
    candidates.into_iter().next()
}

fn read_battery_dir(dir: &Path) -> Option<RawBattery> {
    if read_trimmed(&dir.join("present")).as_deref() == Some("0") {
        return None;
    }

    let status = read_trimmed(&dir.join("status"));
    let is_charging = status.as_deref().map(|s| s.eq_ignore_ascii_case("Charging"));
    let discharging = status
        .as_deref()
        .is_some_and(|s| s.eq_ignore_ascii_case("Discharging"));

    // Energy files are in µWh, charge files in µAh; either pair yields a ratio.
    let (now, full, rate) = match read_number(&dir.join("energy_now")) {
        Some(energy_now) => (
            Some(energy_now),
            read_number(&dir.join("energy_full")),
            read_number(&dir.join("power_now")),
        ),
        None => (
            read_number(&dir.join("charge_now")),
            read_number(&dir.join("charge_full")),
            read_number(&dir.join("current_now")),
        ),
    };

    let percent = read_number(&dir.join("capacity")).or_else(|| match (now, full) {
        (Some(now), Some(full)) if full > 0.0 => Some(now / full * 100.0),
        _ => None,
    });

    let time_remaining = match (discharging, now, rate) {
        (true, Some(now), Some(rate)) if rate > 0.0 => Some((now / rate * 60.0).round() as u32),
        _ => None,
    };

    Some(RawBattery {
        percent,
        is_charging,
        current_capacity: now,
        max_capacity: full,
        cycle_count: read_number(&dir.join("cycle_count")).map(|c| c as u32),
        // Tenths of a degree Celsius.
        temperature: read_number(&dir.join("temp")).map(|t| t / 10.0),
        // Microvolts.
        voltage: read_number(&dir.join("voltage_now")).map(|v| v / 1_000_000.0),
        time_remaining,
    })
}

fn read_number(path: &Path) -> Option<f64> {
    read_trimmed(path)?.parse().ok()
}

fn read_trimmed(path: &Path) -> Option<String> {
    let contents = std::fs::read_to_string(path).ok()?;
    let trimmed = contents.trim_matches(|c: char| c.is_whitespace() || c == '\0');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fake_supply(name: &str, files: &[(&str, &str)]) -> PathBuf {
        let dir = std::env::temp_dir()
            .join(format!("sysglance_power_{}_{name}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        for (file, contents) in files {
            std::fs::write(dir.join(file), contents).unwrap();
        }
        dir
    }

    #[test]
    fn reads_energy_based_battery() {
        let dir = fake_supply(
            "energy",
            &[
                ("type", "Battery\n"),
                ("status", "Discharging\n"),
                ("capacity", "81\n"),
                ("energy_now", "40000000\n"),
                ("energy_full", "50000000\n"),
                ("power_now", "10000000\n"),
                ("cycle_count", "312\n"),
                ("voltage_now", "12150000\n"),
            ],
        );
        let raw = read_battery_dir(&dir).unwrap();
        assert_eq!(raw.percent, Some(81.0));
        assert_eq!(raw.is_charging, Some(false));
        assert_eq!(raw.current_capacity, Some(40_000_000.0));
        assert_eq!(raw.max_capacity, Some(50_000_000.0));
        assert_eq!(raw.cycle_count, Some(312));
        assert_eq!(raw.voltage, Some(12.15));
        assert_eq!(raw.time_remaining, Some(240));
        assert_eq!(raw.temperature, None);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn charge_based_battery_without_capacity_file() {
        let dir = fake_supply(
            "charge",
            &[
                ("type", "Battery\n"),
                ("status", "Charging\n"),
                ("charge_now", "2500000\n"),
                ("charge_full", "5000000\n"),
                ("current_now", "1000000\n"),
                ("temp", "312\n"),
            ],
        );
        let raw = read_battery_dir(&dir).unwrap();
        assert_eq!(raw.percent, Some(50.0));
        assert_eq!(raw.is_charging, Some(true));
        // Only estimated while discharging.
        assert_eq!(raw.time_remaining, None);
        assert!((raw.temperature.unwrap() - 31.2).abs() < 1e-9);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn absent_battery_is_none() {
        let dir = fake_supply("absent", &[("type", "Battery\n"), ("present", "0\n")]);
        assert!(read_battery_dir(&dir).is_none());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_power_supply_root_is_none() {
        assert!(find_battery_dir(Path::new("/nonexistent/power_supply")).is_none());
    }
}
