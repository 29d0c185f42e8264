use std::sync::{Arc, Mutex};
use std::time::Instant;

use async_trait::async_trait;
use sysinfo::{Components, MINIMUM_CPU_UPDATE_INTERVAL, System};

use super::platform;
use super::sensors::{
    RawBattery, RawCoreLoad, RawCpuInfo, RawCpuLoad, RawCpuSpeed, RawCpuTemperature, RawMemory,
    RawOsInfo, RawSystem, SensorError, SensorLibrary, read_blocking,
};

struct Probe {
    sys: System,
    components: Components,
    last_cpu_refresh: Instant,
}

impl Probe {
    /// CPU usage is a delta between two refreshes, so back-to-back queries
    /// within one cycle share a single refresh.
    fn refresh_cpu(&mut self) {
        if self.last_cpu_refresh.elapsed() >= MINIMUM_CPU_UPDATE_INTERVAL {
            self.sys.refresh_cpu_all();
            self.last_cpu_refresh = Instant::now();
        }
    }
}

/// [`SensorLibrary`] backed by `sysinfo`, with battery and hardware identity
/// from the platform layer.
///
/// Every read runs on the blocking pool through [`read_blocking`].
pub struct SysinfoSensors {
    probe: Arc<Mutex<Probe>>,
}

impl Default for SysinfoSensors {
    fn default() -> Self {
        Self::new()
    }
}

impl SysinfoSensors {
    pub fn new() -> Self {
        let mut sys = System::new();
        sys.refresh_memory();
        sys.refresh_cpu_all();
        SysinfoSensors {
            probe: Arc::new(Mutex::new(Probe {
                sys,
                components: Components::new_with_refreshed_list(),
                last_cpu_refresh: Instant::now(),
            })),
        }
    }

    async fn with_probe<T, F>(&self, what: &'static str, read: F) -> Result<T, SensorError>
    where
        F: FnOnce(&mut Probe) -> Result<T, SensorError> + Send + 'static,
        T: Send + 'static,
    {
        let probe = Arc::clone(&self.probe);
        read_blocking(what, move || {
            let mut probe = probe.lock().map_err(|_| SensorError::Read {
                what,
                detail: "sensor state poisoned by an earlier panic".to_string(),
            })?;
            read(&mut probe)
        })
        .await
    }
}

#[async_trait]
impl SensorLibrary for SysinfoSensors {
    async fn cpu_current_speed(&self) -> Result<RawCpuSpeed, SensorError> {
        self.with_probe("cpu speed", |probe| {
            probe.refresh_cpu();
            let cpus = probe.sys.cpus();
            if cpus.is_empty() {
                return Err(SensorError::Unavailable("cpu speed"));
            }
            let total_mhz: u64 = cpus.iter().map(|cpu| cpu.frequency()).sum();
            let avg_mhz = total_mhz as f64 / cpus.len() as f64;
            Ok(RawCpuSpeed {
                avg: (avg_mhz > 0.0).then_some(avg_mhz / 1000.0),
            })
        })
        .await
    }

    async fn current_load(&self) -> Result<RawCpuLoad, SensorError> {
        self.with_probe("cpu load", |probe| {
            probe.refresh_cpu();
            let cpus = probe
                .sys
                .cpus()
                .iter()
                .enumerate()
                .map(|(index, cpu)| RawCoreLoad {
                    cpu: index,
                    load: f64::from(cpu.cpu_usage()),
                })
                .collect();
            Ok(RawCpuLoad {
                current_load: f64::from(probe.sys.global_cpu_usage()),
                cpus,
            })
        })
        .await
    }

    async fn cpu_temperature(&self) -> Result<RawCpuTemperature, SensorError> {
        self.with_probe("cpu temperature", |probe| {
            probe.components.refresh(true);
            let readings: Vec<(String, f32)> = probe
                .components
                .iter()
                .filter_map(|c| c.temperature().map(|t| (c.label().to_string(), t)))
                .collect();
            Ok(cpu_temperature_from_labels(&readings))
        })
        .await
    }

    async fn battery(&self) -> Result<RawBattery, SensorError> {
        read_blocking("battery", || {
            platform::battery().ok_or(SensorError::Unavailable("battery"))
        })
        .await
    }

    async fn mem(&self) -> Result<RawMemory, SensorError> {
        self.with_probe("memory", |probe| {
            probe.sys.refresh_memory();
            let total = probe.sys.total_memory();
            if total == 0 {
                return Err(SensorError::Unavailable("memory"));
            }
            Ok(RawMemory {
                total,
                used: probe.sys.used_memory(),
            })
        })
        .await
    }

    async fn system(&self) -> Result<RawSystem, SensorError> {
        read_blocking("system", || {
            Ok(RawSystem {
                manufacturer: platform::hardware_vendor(),
                model: platform::hardware_model(),
            })
        })
        .await
    }

    async fn os_info(&self) -> Result<RawOsInfo, SensorError> {
        read_blocking("os info", || {
            Ok(RawOsInfo {
                distro: System::name(),
                release: System::os_version(),
                arch: host_arch(System::cpu_arch()),
            })
        })
        .await
    }

    async fn cpu(&self) -> Result<RawCpuInfo, SensorError> {
        self.with_probe("cpu info", |probe| {
            let first = probe
                .sys
                .cpus()
                .first()
                .ok_or(SensorError::Unavailable("cpu info"))?;
            let cores = System::physical_core_count().unwrap_or(probe.sys.cpus().len());
            Ok(RawCpuInfo {
                manufacturer: Some(cpu_manufacturer(first.vendor_id(), first.brand())),
                brand: Some(first.brand().trim().to_string()),
                cores: Some(cores as u32),
                speed: (first.frequency() > 0).then(|| first.frequency() as f64 / 1000.0),
            })
        })
        .await
    }
}

/// Architecture reported by the running kernel, not the one this binary
/// was built for.
fn host_arch(reported: String) -> Option<String> {
    let reported = reported.trim();
    (!reported.is_empty()).then(|| reported.to_string())
}

/// Maps raw vendor ids to the names people recognise.
fn cpu_manufacturer(vendor_id: &str, brand: &str) -> String {
    match vendor_id {
        "GenuineIntel" => "Intel".to_string(),
        "AuthenticAMD" => "AMD".to_string(),
        "" if brand.starts_with("Apple") => "Apple".to_string(),
        other => other.to_string(),
    }
}

/// Picks the package temperature and per-core readings out of component
/// labels such as `coretemp Package id 0`, `coretemp Core 3`, `k10temp Tctl`.
fn cpu_temperature_from_labels(readings: &[(String, f32)]) -> RawCpuTemperature {
    let mut cores: Vec<(usize, f64)> = Vec::new();
    let mut main = None;

    for (label, temp) in readings {
        let temp = f64::from(*temp);
        if let Some(index) = core_index(label) {
            cores.push((index, temp));
        } else if main.is_none() && is_package_label(label) {
            main = Some(temp);
        }
    }

    cores.sort_by_key(|(index, _)| *index);
    let mut by_index = Vec::new();
    for (index, temp) in cores {
        if index >= by_index.len() {
            by_index.resize(index + 1, 0.0);
        }
        by_index[index] = temp;
    }

    let main = main.or_else(|| {
        let known: Vec<f64> = by_index.iter().copied().filter(|t| *t > 0.0).collect();
        (!known.is_empty()).then(|| known.iter().sum::<f64>() / known.len() as f64)
    });

    RawCpuTemperature {
        main,
        cores: by_index,
    }
}

fn core_index(label: &str) -> Option<usize> {
    let (_, rest) = label.split_once("Core ")?;
    rest.split_whitespace().next()?.parse().ok()
}

fn is_package_label(label: &str) -> bool {
    let lower = label.to_lowercase();
    ["package", "tctl", "tdie", "cpu"]
        .iter()
        .any(|needle| lower.contains(needle))
}
