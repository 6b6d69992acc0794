//! Polling supervisor: one task per host plus a liveness heartbeat.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::config::{HostTarget, TripollConfig};
use crate::error::ConfigError;
use crate::mib::Metric;
use crate::poller::HostPoller;
use crate::resolver::{InterfaceMatcher, resolve_interfaces};
use crate::sink::PointSink;
use crate::snmp::SnmpConnector;

/// How long pollers get to finish their current round after shutdown.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// A host ready to be polled: resolved settings plus compiled patterns.
#[derive(Debug, Clone)]
pub struct HostPlan {
    pub target: HostTarget,
    pub matcher: InterfaceMatcher,
}

/// Starts one independent poller per host and keeps the process alive.
///
/// Hosts share nothing but the sink. A host that cannot be reached or
/// resolved only affects its own task.
pub struct Supervisor {
    hosts: Vec<HostPlan>,
    metrics: Vec<Metric>,
    connector: Arc<dyn SnmpConnector>,
    sink: Arc<dyn PointSink>,
    heartbeat: Duration,
    log_points: bool,
    shutdown: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl Supervisor {
    /// Build a supervisor from validated configuration.
    pub fn new(
        config: &TripollConfig,
        connector: Arc<dyn SnmpConnector>,
        sink: Arc<dyn PointSink>,
    ) -> Result<Self, ConfigError> {
        let hosts = config
            .targets()
            .into_iter()
            .map(|target| {
                let matcher = InterfaceMatcher::new(&target.patterns).map_err(|e| {
                    ConfigError::validation(format!(
                        "Host '{}' has an invalid interface pattern: {}",
                        target.address, e
                    ))
                })?;
                Ok(HostPlan { target, matcher })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        Ok(Self {
            hosts,
            metrics: config.metrics()?,
            connector,
            sink,
            heartbeat: config.heartbeat(),
            log_points: config.polling.log_points,
            shutdown: CancellationToken::new(),
            tasks: Vec::new(),
        })
    }

    /// Log every emitted sample at debug level.
    pub fn with_point_logging(mut self, enabled: bool) -> Self {
        self.log_points = enabled;
        self
    }

    /// Token that stops the heartbeat and every poller when cancelled.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Stop the heartbeat and every poller.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    pub fn hosts(&self) -> &[HostPlan] {
        &self.hosts
    }

    /// Spawn a poller task for every host without waiting on any of them.
    pub fn spawn_pollers(&mut self) {
        for plan in &self.hosts {
            let task = host_task(
                plan.clone(),
                self.metrics.clone(),
                self.connector.clone(),
                self.sink.clone(),
                self.log_points,
                self.shutdown.child_token(),
            );
            let span = tracing::info_span!("poller", host = %plan.target.address);
            self.tasks.push(tokio::spawn(task.instrument(span)));
        }

        tracing::info!(pollers = self.tasks.len(), "Pollers started");
    }

    /// Start all pollers and log liveness until shutdown.
    pub async fn run(mut self) {
        self.spawn_pollers();

        let mut ticker = tokio::time::interval(self.heartbeat);
        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    let running = self.tasks.iter().filter(|t| !t.is_finished()).count();
                    tracing::info!(pollers = running, "tripoll is alive");
                }
            }
        }

        tracing::info!("Stopping pollers");
        self.drain().await;
    }

    /// Wait for pollers to stop, aborting whatever is still running once the
    /// shared grace period ends.
    async fn drain(self) {
        let deadline = Instant::now() + SHUTDOWN_GRACE;
        let mut aborted = 0;

        for mut task in self.tasks {
            if tokio::time::timeout_at(deadline, &mut task).await.is_err() {
                task.abort();
                aborted += 1;
            }
        }

        if aborted > 0 {
            tracing::warn!(aborted, "Pollers did not stop in time");
        }
    }
}

/// Lifecycle of one host: open a session, resolve interfaces, poll forever.
async fn host_task(
    plan: HostPlan,
    metrics: Vec<Metric>,
    connector: Arc<dyn SnmpConnector>,
    sink: Arc<dyn PointSink>,
    log_points: bool,
    shutdown: CancellationToken,
) {
    let HostPlan { target, matcher } = plan;

    let mut client = match connector.connect(&target).await {
        Ok(client) => client,
        Err(e) => {
            tracing::error!(
                host = %target.address,
                error = %e,
                "Cannot open SNMP session; host will not be polled"
            );
            return;
        }
    };

    let interfaces = match resolve_interfaces(client.as_mut(), &target.address, &matcher).await {
        Ok(interfaces) => interfaces,
        Err(e) => {
            tracing::warn!(
                host = %target.address,
                error = %e,
                "Interface resolution failed; polling no interfaces until restart"
            );
            Vec::new()
        }
    };

    HostPoller::new(
        target.address,
        interfaces,
        metrics,
        client,
        sink,
        target.interval,
    )
    .with_point_logging(log_points)
    .run(shutdown)
    .await;
}
