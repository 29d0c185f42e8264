use std::sync::Arc;

use super::sensors::{RawCpuLoad, RawCpuSpeed, RawCpuTemperature, SensorError, SensorLibrary};
use super::snapshot::{
    BatteryMetrics, CoreMetrics, CpuMetrics, MemoryMetrics, SystemIdentity, UNKNOWN,
    battery_health, clamp_percent,
};

/// Privileged side of the pipeline: the only code that talks to sensors.
///
/// Every query resolves. A failing sensor is logged and replaced by the
/// query's fixed default record so callers never see the error.
pub struct AcquisitionService<S> {
    sensors: Arc<S>,
}

impl<S> Clone for AcquisitionService<S> {
    fn clone(&self) -> Self {
        Self {
            sensors: Arc::clone(&self.sensors),
        }
    }
}

impl<S: SensorLibrary> AcquisitionService<S> {
    pub fn new(sensors: S) -> Self {
        Self {
            sensors: Arc::new(sensors),
        }
    }

    pub fn from_shared(sensors: Arc<S>) -> Self {
        Self { sensors }
    }

    pub async fn query_cpu(&self) -> CpuMetrics {
        let result = tokio::try_join!(
            self.sensors.cpu_current_speed(),
            self.sensors.current_load(),
            self.sensors.cpu_temperature(),
        );
        match result {
            Ok((speed, load, temp)) => build_cpu(speed, load, temp),
            Err(e) => {
                log_sensor_failure("cpu", &e);
                CpuMetrics::unavailable()
            }
        }
    }

    pub async fn query_battery(&self) -> BatteryMetrics {
        match self.sensors.battery().await {
            Ok(raw) => BatteryMetrics {
                level: clamp_percent(raw.percent.unwrap_or(0.0) as f32),
                is_charging: raw.is_charging.unwrap_or(false),
                health: battery_health(raw.current_capacity, raw.max_capacity),
                cycle_count: raw.cycle_count.unwrap_or(0),
                temperature: raw.temperature.unwrap_or(0.0) as f32,
                voltage: raw.voltage.unwrap_or(0.0) as f32,
                time_remaining: raw.time_remaining.filter(|m| *m > 0),
            },
            Err(e) => {
                log_sensor_failure("battery", &e);
                BatteryMetrics::unavailable()
            }
        }
    }

    pub async fn query_memory(&self) -> MemoryMetrics {
        match self.sensors.mem().await {
            Ok(raw) => MemoryMetrics::from_totals(raw.total, raw.used),
            Err(e) => {
                log_sensor_failure("memory", &e);
                MemoryMetrics::unavailable()
            }
        }
    }

    pub async fn query_system_identity(&self) -> SystemIdentity {
        let result = tokio::try_join!(
            self.sensors.system(),
            self.sensors.os_info(),
            self.sensors.cpu(),
        );
        match result {
            Ok((system, os, cpu)) => {
                let os_label = match (os.distro, os.release) {
                    (Some(distro), Some(release)) => format!("{distro} {release}"),
                    (Some(distro), None) => distro,
                    (None, Some(release)) => release,
                    (None, None) => UNKNOWN.to_string(),
                };
                SystemIdentity {
                    manufacturer: or_unknown(system.manufacturer),
                    model: or_unknown(system.model),
                    os: os_label,
                    arch: or_unknown(os.arch),
                    cpu_manufacturer: or_unknown(cpu.manufacturer),
                    cpu_brand: or_unknown(cpu.brand),
                    cpu_cores: cpu.cores.unwrap_or(0),
                    cpu_speed: cpu.speed.unwrap_or(0.0) as f32,
                }
            }
            Err(e) => {
                log_sensor_failure("system identity", &e);
                SystemIdentity::unavailable()
            }
        }
    }
}

fn build_cpu(speed: RawCpuSpeed, load: RawCpuLoad, temp: RawCpuTemperature) -> CpuMetrics {
    let cores = load
        .cpus
        .iter()
        .map(|core| CoreMetrics {
            usage: clamp_percent(core.load.round() as f32),
            temperature: temp.cores.get(core.cpu).copied().unwrap_or(0.0) as f32,
        })
        .collect();

    CpuMetrics {
        usage: clamp_percent(load.current_load.round() as f32),
        temperature: temp.main.unwrap_or(0.0) as f32,
        frequency: speed.avg.unwrap_or(0.0) as f32,
        cores,
    }
}

fn or_unknown(value: Option<String>) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => UNKNOWN.to_string(),
    }
}

fn log_sensor_failure(query: &'static str, error: &SensorError) {
    match error {
        SensorError::Unavailable(_) => tracing::debug!(%error, "{query} query unavailable"),
        SensorError::Read { .. } => tracing::warn!(%error, "{query} query failed"),
    }
}
