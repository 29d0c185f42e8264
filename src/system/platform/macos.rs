use std::ffi::CString;
use std::process::Command;

use super::PlatformExtensions;
use crate::system::sensors::RawBattery;

pub struct Platform;

impl PlatformExtensions for Platform {
    fn battery() -> Option<RawBattery> {
        let pmset = command_stdout("pmset", &["-g", "batt"])?;
        let mut raw = parse_pmset(&pmset)?;

        if let Some(ioreg) = command_stdout("ioreg", &["-rn", "AppleSmartBattery"]) {
            raw.cycle_count = ioreg_value(&ioreg, "CycleCount").map(|c| c as u32);
            // Centi-degrees Celsius and millivolts.
            raw.temperature = ioreg_value(&ioreg, "Temperature").map(|t| t as f64 / 100.0);
            raw.voltage = ioreg_value(&ioreg, "Voltage").map(|v| v as f64 / 1000.0);
            raw.current_capacity = ioreg_value(&ioreg, "AppleRawCurrentCapacity")
                .or_else(|| ioreg_value(&ioreg, "CurrentCapacity"))
                .map(|c| c as f64);
            raw.max_capacity = ioreg_value(&ioreg, "AppleRawMaxCapacity")
                .or_else(|| ioreg_value(&ioreg, "MaxCapacity"))
                .map(|c| c as f64);
        }

        Some(raw)
    }

    fn hardware_vendor() -> Option<String> {
        Some("Apple Inc.".to_string())
    }

    fn hardware_model() -> Option<String> {
        sysctl_string("hw.model")
    }
}

fn command_stdout(program: &str, args: &[&str]) -> Option<String> {
    let output = Command::new(program).args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    Some(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Parses the `InternalBattery` line of `pmset -g batt`, e.g.
/// ` -InternalBattery-0 (id=123)	85%; discharging; 4:12 remaining present: true`.
fn parse_pmset(output: &str) -> Option<RawBattery> {
    let line = output.lines().find(|l| l.contains("InternalBattery"))?;
    let mut fields = line.split(';').map(str::trim);

    let percent = fields
        .next()?
        .split_whitespace()
        .find_map(|token| token.strip_suffix('%'))
        .and_then(|p| p.parse::<f64>().ok());
    let state = fields.next().unwrap_or_default();
    let is_charging = state == "charging" || state == "finishing charge";

    let time_remaining = fields.next().and_then(|rest| {
        let clock = rest.split_whitespace().next()?;
        let (hours, minutes) = clock.split_once(':')?;
        let hours: u32 = hours.parse().ok()?;
        let minutes: u32 = minutes.parse().ok()?;
        Some(hours * 60 + minutes)
    });

    Some(RawBattery {
        percent,
        is_charging: Some(is_charging),
        time_remaining: if is_charging { None } else { time_remaining },
        ..RawBattery::default()
    })
}

/// Reads a `"Key" = 1234` line from `ioreg` output.
fn ioreg_value(output: &str, key: &str) -> Option<i64> {
    let needle = format!("\"{key}\" = ");
    output.lines().find_map(|line| {
        let rest = line.trim().strip_prefix(&needle)?;
        rest.trim().parse().ok()
    })
}

fn sysctl_string(name: &str) -> Option<String> {
    let name = CString::new(name).ok()?;
    let mut len: libc::size_t = 0;
    let rc = unsafe {
        libc::sysctlbyname(
            name.as_ptr(),
            std::ptr::null_mut(),
            &mut len,
            std::ptr::null_mut(),
            0,
        )
    };
    if rc != 0 || len == 0 {
        return None;
    }
    let mut buf = vec![0u8; len];
    let rc = unsafe {
        libc::sysctlbyname(
            name.as_ptr(),
            buf.as_mut_ptr().cast(),
            &mut len,
            std::ptr::null_mut(),
            0,
        )
    };
    if rc != 0 {
        return None;
    }
    buf.truncate(len);
    while buf.last() == Some(&0) {
        buf.pop();
    }
    String::from_utf8(buf).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_discharging_pmset_line() {
        let out = "Now drawing from 'Battery Power'\n -InternalBattery-0 (id=4653155)\t85%; discharging; 4:12 remaining present: true\n";
        let raw = parse_pmset(out).unwrap();
        assert_eq!(raw.percent, Some(85.0));
        assert_eq!(raw.is_charging, Some(false));
        assert_eq!(raw.time_remaining, Some(252));
    }

    #[test]
    fn charging_line_has_no_remaining_estimate() {
        let out = " -InternalBattery-0 (id=1)\t40%; charging; 1:05 remaining present: true";
        let raw = parse_pmset(out).unwrap();
        assert_eq!(raw.is_charging, Some(true));
        assert_eq!(raw.time_remaining, None);
    }

    #[test]
    fn no_estimate_yet() {
        let out = " -InternalBattery-0 (id=1)\t99%; discharging; (no estimate) present: true";
        let raw = parse_pmset(out).unwrap();
        assert_eq!(raw.time_remaining, None);
    }

    #[test]
    fn reads_ioreg_keys() {
        let out = "  | {\n    \"CycleCount\" = 231\n    \"Voltage\" = 12874\n  }";
        assert_eq!(ioreg_value(out, "CycleCount"), Some(231));
        assert_eq!(ioreg_value(out, "Voltage"), Some(12874));
        assert_eq!(ioreg_value(out, "Temperature"), None);
    }
}
