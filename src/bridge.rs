//! Request/response boundary between the consumer and the acquisition service.
//!
//! A [`BridgeClient`] can only ask the four metric questions in
//! [`MetricsRequest`]. It holds no reference to the service or the sensors;
//! the [`BridgeHost`] owns those and answers from its own task.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

use crate::system::acquisition::AcquisitionService;
use crate::system::sensors::SensorLibrary;
use crate::system::snapshot::{BatteryMetrics, CpuMetrics, MemoryMetrics, SystemIdentity};

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("metrics bridge is unreachable")]
    Unreachable,
    #[error("metrics bridge dropped the {0} request without replying")]
    NoReply(&'static str),
}

/// The four operations the consumer side may invoke.
#[async_trait]
pub trait MetricsBridge: Send + Sync {
    async fn get_cpu_info(&self) -> Result<CpuMetrics, BridgeError>;
    async fn get_battery_info(&self) -> Result<BatteryMetrics, BridgeError>;
    async fn get_memory_info(&self) -> Result<MemoryMetrics, BridgeError>;
    async fn get_system_info(&self) -> Result<SystemIdentity, BridgeError>;

    /// Presence probe; never fails.
    fn is_available(&self) -> bool;
}

#[derive(Debug)]
pub enum MetricsRequest {
    Cpu(oneshot::Sender<CpuMetrics>),
    Battery(oneshot::Sender<BatteryMetrics>),
    Memory(oneshot::Sender<MemoryMetrics>),
    System(oneshot::Sender<SystemIdentity>),
}

impl MetricsRequest {
    fn name(&self) -> &'static str {
        match self {
            MetricsRequest::Cpu(_) => "cpu",
            MetricsRequest::Battery(_) => "battery",
            MetricsRequest::Memory(_) => "memory",
            MetricsRequest::System(_) => "system",
        }
    }
}

/// Creates a connected client/host pair.
pub fn channel(capacity: usize) -> (BridgeClient, BridgeHost) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (BridgeClient { tx }, BridgeHost { rx })
}

#[derive(Clone)]
pub struct BridgeClient {
    tx: mpsc::Sender<MetricsRequest>,
}

impl BridgeClient {
    async fn call<T>(
        &self,
        name: &'static str,
        make: impl FnOnce(oneshot::Sender<T>) -> MetricsRequest,
    ) -> Result<T, BridgeError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(make(reply_tx))
            .await
            .map_err(|_| BridgeError::Unreachable)?;
        reply_rx.await.map_err(|_| BridgeError::NoReply(name))
    }
}

#[async_trait]
impl MetricsBridge for BridgeClient {
    async fn get_cpu_info(&self) -> Result<CpuMetrics, BridgeError> {
        self.call("cpu", MetricsRequest::Cpu).await
    }

    async fn get_battery_info(&self) -> Result<BatteryMetrics, BridgeError> {
        self.call("battery", MetricsRequest::Battery).await
    }

    async fn get_memory_info(&self) -> Result<MemoryMetrics, BridgeError> {
        self.call("memory", MetricsRequest::Memory).await
    }

    async fn get_system_info(&self) -> Result<SystemIdentity, BridgeError> {
        self.call("system", MetricsRequest::System).await
    }

    fn is_available(&self) -> bool {
        !self.tx.is_closed()
    }
}

/// Privileged end of the bridge.
pub struct BridgeHost {
    rx: mpsc::Receiver<MetricsRequest>,
}

impl BridgeHost {
    /// Answers requests until every client is gone. Each request runs on its
    /// own task so a cycle's four queries are served concurrently.
    pub async fn serve<S>(mut self, service: AcquisitionService<S>)
    where
        S: SensorLibrary + 'static,
    {
        tracing::debug!("metrics bridge host started");
        while let Some(request) = self.rx.recv().await {
            let service = service.clone();
            tokio::spawn(async move {
                let name = request.name();
                let delivered = match request {
                    MetricsRequest::Cpu(reply) => reply.send(service.query_cpu().await).is_ok(),
                    MetricsRequest::Battery(reply) => {
                        reply.send(service.query_battery().await).is_ok()
                    }
                    MetricsRequest::Memory(reply) => {
                        reply.send(service.query_memory().await).is_ok()
                    }
                    MetricsRequest::System(reply) => {
                        reply.send(service.query_system_identity().await).is_ok()
                    }
                };
                if !delivered {
                    tracing::debug!(request = name, "requester went away before reply");
                }
            });
        }
        tracing::debug!("metrics bridge host stopped");
    }

    /// Runs [`BridgeHost::serve`] on the current runtime.
    pub fn spawn<S>(self, service: AcquisitionService<S>) -> tokio::task::JoinHandle<()>
    where
        S: SensorLibrary + 'static,
    {
        tokio::spawn(self.serve(service))
    }
}
