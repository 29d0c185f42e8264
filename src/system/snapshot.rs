//! Metric records exchanged between the acquisition service, the bridge and
//! the polling client.
//!
//! Every record serializes in camelCase so a snapshot printed as JSON keeps
//! the field names renderers already expect (`isCharging`, `cycleCount`, ...).

use serde::{Deserialize, Serialize};

/// Placeholder for identity fields the host could not report.
pub const UNKNOWN: &str = "Unknown";

/// Clamp a percentage into `[0, 100]`. NaN collapses to 0.
pub fn clamp_percent(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

/// `round(part / whole * 100)` clamped to `[0, 100]`, or 0 for an empty whole.
pub fn ratio_percent(part: f64, whole: f64) -> f32 {
    if whole <= 0.0 || !whole.is_finite() || !part.is_finite() {
        return 0.0;
    }
    clamp_percent((part / whole * 100.0).round() as f32)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoreMetrics {
    pub usage: f32,
    pub temperature: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CpuMetrics {
    pub usage: f32,
    pub temperature: f32,
    /// Average clock speed in GHz.
    pub frequency: f32,
    pub cores: Vec<CoreMetrics>,
}

impl CpuMetrics {
    /// Record reported when the CPU sensors fail.
    pub fn unavailable() -> Self {
        CpuMetrics {
            usage: 0.0,
            temperature: 0.0,
            frequency: 0.0,
            cores: Vec::new(),
        }
    }

    /// Percent fields clamped; temperatures and frequency pass through.
    pub fn normalized(mut self) -> Self {
        self.usage = clamp_percent(self.usage);
        for core in &mut self.cores {
            core.usage = clamp_percent(core.usage);
        }
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatteryMetrics {
    pub level: f32,
    pub is_charging: bool,
    pub health: f32,
    pub cycle_count: u32,
    pub temperature: f32,
    /// Volts.
    pub voltage: f32,
    /// Minutes; `None` when the host cannot estimate it.
    pub time_remaining: Option<u32>,
}

impl BatteryMetrics {
    /// Record reported when the battery query fails or no battery exists.
    ///
    /// Health is reported as 100 here, unlike the zeroed CPU record.
    pub fn unavailable() -> Self {
        BatteryMetrics {
            level: 0.0,
            is_charging: false,
            health: 100.0,
            cycle_count: 0,
            temperature: 0.0,
            voltage: 0.0,
            time_remaining: None,
        }
    }

    pub fn normalized(mut self) -> Self {
        self.level = clamp_percent(self.level);
        self.health = clamp_percent(self.health);
        self
    }
}

/// Battery health from the current and full-charge capacities.
///
/// Falls back to 100 when either capacity is missing or the maximum is zero.
pub fn battery_health(current: Option<f64>, max: Option<f64>) -> f32 {
    match (current, max) {
        (Some(current), Some(max)) if max > 0.0 => ratio_percent(current, max),
        _ => 100.0,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryMetrics {
    pub total: u64,
    pub used: u64,
    pub free: u64,
    pub usage: f32,
}

impl MemoryMetrics {
    /// Derives `free` and `usage` from the totals.
    pub fn from_totals(total: u64, used: u64) -> Self {
        MemoryMetrics {
            total,
            used,
            free: total.saturating_sub(used),
            usage: ratio_percent(used as f64, total as f64),
        }
    }

    pub fn unavailable() -> Self {
        MemoryMetrics {
            total: 0,
            used: 0,
            free: 0,
            usage: 0.0,
        }
    }

    /// `free` and `usage` are always recomputed from `total` and `used`.
    pub fn normalized(self) -> Self {
        Self::from_totals(self.total, self.used)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemIdentity {
    pub manufacturer: String,
    pub model: String,
    pub os: String,
    pub arch: String,
    pub cpu_manufacturer: String,
    pub cpu_brand: String,
    pub cpu_cores: u32,
    /// Nominal clock speed in GHz.
    pub cpu_speed: f32,
}

impl SystemIdentity {
    pub fn unavailable() -> Self {
        SystemIdentity {
            manufacturer: UNKNOWN.to_string(),
            model: UNKNOWN.to_string(),
            os: UNKNOWN.to_string(),
            arch: UNKNOWN.to_string(),
            cpu_manufacturer: UNKNOWN.to_string(),
            cpu_brand: UNKNOWN.to_string(),
            cpu_cores: 0,
            cpu_speed: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemSnapshot {
    pub cpu: CpuMetrics,
    pub battery: BatteryMetrics,
    pub memory: MemoryMetrics,
    pub system: SystemIdentity,
}

impl SystemSnapshot {
    /// Joins the four query results into one snapshot, clamping percentages
    /// and recomputing `memory.free`.
    pub fn merge(
        cpu: CpuMetrics,
        battery: BatteryMetrics,
        memory: MemoryMetrics,
        system: SystemIdentity,
    ) -> Self {
        SystemSnapshot {
            cpu: cpu.normalized(),
            battery: battery.normalized(),
            memory: memory.normalized(),
            system,
        }
    }
}
