use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use sysglance::bridge::{self, BridgeError, MetricsBridge};
use sysglance::poller::{MetricsPoller, PollStatus, SnapshotOrigin, SnapshotSource};
use sysglance::synthetic::SyntheticGenerator;
use sysglance::system::acquisition::AcquisitionService;
use sysglance::system::sensors::{
    RawBattery, RawCpuInfo, RawCpuLoad, RawCpuSpeed, RawCpuTemperature, RawMemory, RawOsInfo,
    RawSystem, SensorError, SensorLibrary, read_blocking,
};

/// Memory reads succeed and count calls; everything else is unavailable.
#[derive(Default)]
struct MemoryOnly {
    calls: AtomicUsize,
}

#[async_trait]
impl SensorLibrary for MemoryOnly {
    async fn cpu_current_speed(&self) -> Result<RawCpuSpeed, SensorError> {
        Err(SensorError::Unavailable("cpu speed"))
    }
    async fn current_load(&self) -> Result<RawCpuLoad, SensorError> {
        Err(SensorError::Unavailable("cpu load"))
    }
    async fn cpu_temperature(&self) -> Result<RawCpuTemperature, SensorError> {
        Err(SensorError::Unavailable("cpu temperature"))
    }
    async fn battery(&self) -> Result<RawBattery, SensorError> {
        Err(SensorError::Unavailable("battery"))
    }
    async fn mem(&self) -> Result<RawMemory, SensorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(RawMemory {
            total: 8_000,
            used: 6_000,
        })
    }
    async fn system(&self) -> Result<RawSystem, SensorError> {
        Err(SensorError::Unavailable("system"))
    }
    async fn os_info(&self) -> Result<RawOsInfo, SensorError> {
        Err(SensorError::Unavailable("os"))
    }
    async fn cpu(&self) -> Result<RawCpuInfo, SensorError> {
        Err(SensorError::Unavailable("cpu info"))
    }
}

#[tokio::test]
async fn client_reaches_service_through_host() {
    let sensors = Arc::new(MemoryOnly::default());
    let (client, host) = bridge::channel(8);
    let _host = host.spawn(AcquisitionService::from_shared(Arc::clone(&sensors)));

    let memory = client.get_memory_info().await.unwrap();
    assert_eq!(memory.total, 8_000);
    assert_eq!(memory.free, 2_000);
    assert_eq!(memory.usage, 75.0);

    // Sensor failures resolve to defaults on the far side of the bridge.
    let battery = client.get_battery_info().await.unwrap();
    assert_eq!(battery.health, 100.0);
    let identity = client.get_system_info().await.unwrap();
    assert_eq!(identity.os, "Unknown");

    assert_eq!(sensors.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn poller_over_live_bridge_reports_sensor_origin() {
    let (client, host) = bridge::channel(8);
    let _host = host.spawn(AcquisitionService::new(MemoryOnly::default()));
    let client: Arc<dyn MetricsBridge> = Arc::new(client);

    let source = SnapshotSource::probe(Some(client), SyntheticGenerator::seeded(5));
    assert_eq!(source.origin(), SnapshotOrigin::Sensors);

    let poller = MetricsPoller::new(source);
    poller.poll_once().await;
    let view = poller.current();
    assert_eq!(view.status, PollStatus::Ready);
    assert_eq!(view.origin, Some(SnapshotOrigin::Sensors));
    let snapshot = view.snapshot.unwrap();
    assert_eq!(snapshot.memory.used, 6_000);
    assert!(snapshot.cpu.cores.is_empty());
}

#[tokio::test]
async fn closed_bridge_falls_back_to_synthetic_at_probe() {
    let (client, host) = bridge::channel(8);
    drop(host);
    assert!(!client.is_available());
    assert!(matches!(
        client.get_cpu_info().await,
        Err(BridgeError::Unreachable)
    ));

    let client: Arc<dyn MetricsBridge> = Arc::new(client);
    let source = SnapshotSource::probe(Some(client), SyntheticGenerator::seeded(5));
    assert_eq!(source.origin(), SnapshotOrigin::Synthetic);
}

#[tokio::test]
async fn host_stops_when_clients_are_gone() {
    let (client, host) = bridge::channel(8);
    let task = host.spawn(AcquisitionService::new(MemoryOnly::default()));
    let second = client.clone();
    drop(client);
    assert!(second.get_memory_info().await.is_ok());
    drop(second);
    task.await.unwrap();
}

/// Battery reads park an OS thread the way a stuck `pmset` would; memory
/// reads are instant and counted.
#[derive(Default)]
struct StuckBattery {
    memory_reads: Arc<AtomicUsize>,
}

#[async_trait]
impl SensorLibrary for StuckBattery {
    async fn cpu_current_speed(&self) -> Result<RawCpuSpeed, SensorError> {
        Err(SensorError::Unavailable("cpu speed"))
    }
    async fn current_load(&self) -> Result<RawCpuLoad, SensorError> {
        Err(SensorError::Unavailable("cpu load"))
    }
    async fn cpu_temperature(&self) -> Result<RawCpuTemperature, SensorError> {
        Err(SensorError::Unavailable("cpu temperature"))
    }
    async fn battery(&self) -> Result<RawBattery, SensorError> {
        read_blocking("battery", || {
            std::thread::sleep(Duration::from_millis(800));
            Err(SensorError::Unavailable("battery"))
        })
        .await
    }
    async fn mem(&self) -> Result<RawMemory, SensorError> {
        let reads = Arc::clone(&self.memory_reads);
        read_blocking("memory", move || {
            reads.fetch_add(1, Ordering::SeqCst);
            Ok(RawMemory {
                total: 8_000,
                used: 2_000,
            })
        })
        .await
    }
    async fn system(&self) -> Result<RawSystem, SensorError> {
        Err(SensorError::Unavailable("system"))
    }
    async fn os_info(&self) -> Result<RawOsInfo, SensorError> {
        Err(SensorError::Unavailable("os"))
    }
    async fn cpu(&self) -> Result<RawCpuInfo, SensorError> {
        Err(SensorError::Unavailable("cpu info"))
    }
}

#[tokio::test]
async fn blocking_sensor_does_not_stall_timer_or_other_queries() {
    let sensors = Arc::new(StuckBattery::default());
    let (client, host) = bridge::channel(64);
    let _host = host.spawn(AcquisitionService::from_shared(Arc::clone(&sensors)));
    let direct = client.clone();
    let client: Arc<dyn MetricsBridge> = Arc::new(client);

    let source = SnapshotSource::probe(Some(client), SyntheticGenerator::seeded(5));
    let handle = MetricsPoller::new(source).spawn(Duration::from_millis(100));

    tokio::time::sleep(Duration::from_millis(450)).await;

    // Every tick still started a cycle and reached the memory sensor.
    assert!(sensors.memory_reads.load(Ordering::SeqCst) >= 3);
    // No cycle can finish while its battery read is parked.
    assert_eq!(handle.current().status, PollStatus::Loading);

    let memory = tokio::time::timeout(Duration::from_millis(200), direct.get_memory_info())
        .await
        .expect("memory query stalled behind the battery read")
        .unwrap();
    assert_eq!(memory.usage, 25.0);

    handle.stop();
}
