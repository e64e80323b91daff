//! gRPC health reporting over `tonic-health`.
//!
//! One binary may host several gRPC services; the reporter flips all of them
//! together so health checks see a consistent state during startup and shutdown.

use std::sync::Arc;
use tokio::sync::Mutex;
use tonic_health::server::HealthReporter as TonicHealthReporter;

/// Health status for a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthStatus {
    Serving,
    NotServing,
}

impl From<HealthStatus> for tonic_health::ServingStatus {
    fn from(status: HealthStatus) -> Self {
        match status {
            HealthStatus::Serving => tonic_health::ServingStatus::Serving,
            HealthStatus::NotServing => tonic_health::ServingStatus::NotServing,
        }
    }
}

/// Reporter for the fully-qualified gRPC service names hosted by a binary.
#[derive(Clone)]
pub struct HealthReporter {
    inner: Arc<Mutex<TonicHealthReporter>>,
    service_names: Arc<[String]>,
}

impl HealthReporter {
    pub fn new(reporter: TonicHealthReporter, service_names: Vec<String>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(reporter)),
            service_names: service_names.into(),
        }
    }

    pub fn service_names(&self) -> &[String] {
        &self.service_names
    }

    /// Set the same status on every hosted service, plus the empty
    /// whole-server entry.
    pub async fn set_status(&self, status: HealthStatus) {
        let mut reporter = self.inner.lock().await;
        reporter.set_service_status("", status.into()).await;
        for name in self.service_names.iter() {
            reporter.set_service_status(name, status.into()).await;
        }
        tracing::info!(status = ?status, services = ?self.service_names, "Health status updated");
    }

    pub async fn set_serving(&self) {
        self.set_status(HealthStatus::Serving).await;
    }

    pub async fn set_not_serving(&self) {
        self.set_status(HealthStatus::NotServing).await;
    }
}

/// Health service components returned by `create_health_service`.
pub struct HealthComponents<S> {
    /// The health server to add to the gRPC router.
    pub server: tonic_health::pb::health_server::HealthServer<S>,
    /// The reporter for updating health status.
    pub reporter: HealthReporter,
}

/// Create a health service whose services start as `NOT_SERVING`; call
/// `reporter.set_serving()` once dependencies are reachable.
pub async fn create_health_service(
    service_names: Vec<String>,
) -> HealthComponents<impl tonic_health::pb::health_server::Health> {
    let (reporter, health_server) = tonic_health::server::health_reporter();

    let reporter = HealthReporter::new(reporter, service_names);
    reporter.set_not_serving().await;

    HealthComponents {
        server: health_server,
        reporter,
    }
}
