//! Consumer-side polling client.
//!
//! Every refresh interval the poller fans the four bridge queries out, joins
//! them into one [`SystemSnapshot`] and publishes it through a single
//! `watch` slot. Observers read the latest [`PollView`]; nothing older is kept.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::bridge::{BridgeError, MetricsBridge};
use crate::synthetic::SyntheticGenerator;
use crate::system::snapshot::SystemSnapshot;

pub const DEFAULT_REFRESH: Duration = Duration::from_millis(2000);
pub const MIN_REFRESH: Duration = Duration::from_millis(100);
pub const CYCLE_FAILURE_MESSAGE: &str = "Failed to fetch system data";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PollStatus {
    /// No cycle has started yet.
    Idle,
    /// The first cycle is in flight.
    Loading,
    Ready,
    /// The last cycle failed; `snapshot` (if any) is from an earlier cycle.
    Stale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotOrigin {
    Sensors,
    Synthetic,
}

/// What observers see: the current snapshot plus loading/error state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PollView {
    pub status: PollStatus,
    pub snapshot: Option<Arc<SystemSnapshot>>,
    pub origin: Option<SnapshotOrigin>,
    pub error: Option<String>,
}

impl PollView {
    fn idle() -> Self {
        PollView {
            status: PollStatus::Idle,
            snapshot: None,
            origin: None,
            error: None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.status, PollStatus::Idle | PollStatus::Loading)
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Where snapshots come from. Chosen once, when the poller is built.
pub enum SnapshotSource {
    Bridge(Arc<dyn MetricsBridge>),
    Synthetic(Mutex<SyntheticGenerator>),
}

impl SnapshotSource {
    /// Uses the bridge when one is installed and reachable, otherwise the
    /// synthetic generator.
    pub fn probe(bridge: Option<Arc<dyn MetricsBridge>>, generator: SyntheticGenerator) -> Self {
        match bridge {
            Some(bridge) if bridge.is_available() => {
                tracing::info!("metrics bridge detected, polling host sensors");
                SnapshotSource::Bridge(bridge)
            }
            _ => {
                tracing::warn!("metrics bridge not available, using synthetic data");
                SnapshotSource::synthetic(generator)
            }
        }
    }

    pub fn synthetic(generator: SyntheticGenerator) -> Self {
        SnapshotSource::Synthetic(Mutex::new(generator))
    }

    pub fn origin(&self) -> SnapshotOrigin {
        match self {
            SnapshotSource::Bridge(_) => SnapshotOrigin::Sensors,
            SnapshotSource::Synthetic(_) => SnapshotOrigin::Synthetic,
        }
    }

    async fn fetch(&self) -> Result<SystemSnapshot, BridgeError> {
        match self {
            SnapshotSource::Bridge(bridge) => {
                let (cpu, battery, memory, system) = tokio::try_join!(
                    bridge.get_cpu_info(),
                    bridge.get_battery_info(),
                    bridge.get_memory_info(),
                    bridge.get_system_info(),
                )?;
                Ok(SystemSnapshot::merge(cpu, battery, memory, system))
            }
            SnapshotSource::Synthetic(generator) => {
                let mut generator = generator
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner());
                Ok(generator.generate())
            }
        }
    }
}

/// Owns the snapshot slot; the only writer to it.
#[derive(Clone)]
pub struct MetricsPoller {
    source: Arc<SnapshotSource>,
    slot: Arc<watch::Sender<PollView>>,
}

impl MetricsPoller {
    pub fn new(source: SnapshotSource) -> Self {
        let (slot, _) = watch::channel(PollView::idle());
        Self {
            source: Arc::new(source),
            slot: Arc::new(slot),
        }
    }

    pub fn origin(&self) -> SnapshotOrigin {
        self.source.origin()
    }

    pub fn subscribe(&self) -> watch::Receiver<PollView> {
        self.slot.subscribe()
    }

    pub fn current(&self) -> PollView {
        self.slot.borrow().clone()
    }

    /// Runs one fetch-merge-publish cycle.
    pub async fn poll_once(&self) {
        run_cycle(&self.source, &self.slot).await;
    }

    /// Starts the timer. The first cycle runs immediately, then one per
    /// `interval`. Each cycle runs on its own task so a hung query never
    /// delays the next tick.
    pub fn spawn(self, interval: Duration) -> PollerHandle {
        let source = Arc::clone(&self.source);
        let slot = Arc::clone(&self.slot);
        let scheduler = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval.max(MIN_REFRESH));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let source = Arc::clone(&source);
                let slot = Arc::clone(&slot);
                tokio::spawn(async move { run_cycle(&source, &slot).await });
            }
        });
        PollerHandle {
            poller: self,
            scheduler,
        }
    }
}

async fn run_cycle(source: &SnapshotSource, slot: &watch::Sender<PollView>) {
    slot.send_if_modified(|view| {
        if view.status == PollStatus::Idle {
            view.status = PollStatus::Loading;
            true
        } else {
            false
        }
    });

    // Whichever cycle completes last owns the slot, regardless of start order.
    match source.fetch().await {
        Ok(snapshot) => {
            let origin = source.origin();
            slot.send_modify(|view| {
                *view = PollView {
                    status: PollStatus::Ready,
                    snapshot: Some(Arc::new(snapshot)),
                    origin: Some(origin),
                    error: None,
                };
            });
        }
        Err(e) => {
            tracing::error!(error = %e, "error fetching system data");
            slot.send_modify(|view| {
                view.status = PollStatus::Stale;
                view.error = Some(CYCLE_FAILURE_MESSAGE.to_string());
            });
        }
    }
}

/// A running poller. Dropping or stopping it cancels future ticks only;
/// cycles already in flight still finish and publish.
pub struct PollerHandle {
    poller: MetricsPoller,
    scheduler: JoinHandle<()>,
}

impl PollerHandle {
    pub fn subscribe(&self) -> watch::Receiver<PollView> {
        self.poller.subscribe()
    }

    pub fn current(&self) -> PollView {
        self.poller.current()
    }

    pub fn origin(&self) -> SnapshotOrigin {
        self.poller.origin()
    }

    /// Out-of-band cycle, independent of the timer.
    pub async fn refresh(&self) {
        self.poller.poll_once().await;
    }

    pub fn stop(&self) {
        self.scheduler.abort();
    }

    pub fn is_running(&self) -> bool {
        !self.scheduler.is_finished()
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.scheduler.abort();
    }
}
