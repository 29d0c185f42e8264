//! The raw sensor capability the acquisition service is built on.
//!
//! Readings are deliberately loose: any field may be missing on a given host,
//! and any call may fail outright.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SensorError {
    #[error("{0} is not available on this host")]
    Unavailable(&'static str),
    #[error("failed to read {what}: {detail}")]
    Read { what: &'static str, detail: String },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawCpuSpeed {
    /// Average over all cores, GHz.
    pub avg: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawCoreLoad {
    /// Core index, used to look up its temperature.
    pub cpu: usize,
    pub load: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawCpuLoad {
    pub current_load: f64,
    pub cpus: Vec<RawCoreLoad>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawCpuTemperature {
    pub main: Option<f64>,
    /// Indexed by core; shorter than the core list when the host exposes
    /// fewer sensors than cores.
    pub cores: Vec<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawBattery {
    pub percent: Option<f64>,
    pub is_charging: Option<bool>,
    pub current_capacity: Option<f64>,
    pub max_capacity: Option<f64>,
    pub cycle_count: Option<u32>,
    pub temperature: Option<f64>,
    pub voltage: Option<f64>,
    /// Minutes.
    pub time_remaining: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawMemory {
    pub total: u64,
    pub used: u64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSystem {
    pub manufacturer: Option<String>,
    pub model: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawOsInfo {
    pub distro: Option<String>,
    pub release: Option<String>,
    pub arch: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawCpuInfo {
    pub manufacturer: Option<String>,
    pub brand: Option<String>,
    pub cores: Option<u32>,
    /// Nominal speed, GHz.
    pub speed: Option<f64>,
}

/// Host sensor and system-information capability.
#[async_trait]
pub trait SensorLibrary: Send + Sync {
    async fn cpu_current_speed(&self) -> Result<RawCpuSpeed, SensorError>;
    async fn current_load(&self) -> Result<RawCpuLoad, SensorError>;
    async fn cpu_temperature(&self) -> Result<RawCpuTemperature, SensorError>;
    async fn battery(&self) -> Result<RawBattery, SensorError>;
    async fn mem(&self) -> Result<RawMemory, SensorError>;
    async fn system(&self) -> Result<RawSystem, SensorError>;
    async fn os_info(&self) -> Result<RawOsInfo, SensorError>;
    async fn cpu(&self) -> Result<RawCpuInfo, SensorError>;
}

/// Runs a synchronous sensor read on the blocking pool.
///
/// Implementations that shell out, walk `/sys` or refresh `sysinfo` state
/// must go through here; the runtime thread also drives the poll timer.
pub async fn read_blocking<T, F>(what: &'static str, read: F) -> Result<T, SensorError>
where
    F: FnOnce() -> Result<T, SensorError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(read)
        .await
        .map_err(|e| SensorError::Read {
            what,
            detail: e.to_string(),
        })?
}
