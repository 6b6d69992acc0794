//! Per-host polling loop.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tripoll_common::CounterSample;

use crate::mib::Metric;
use crate::resolver::ResolvedInterface;
use crate::sink::PointSink;
use crate::snmp::SnmpClient;

/// Result of one GET for an (interface, metric) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    Success(u64),
    TransportError(String),
    ProtocolError(String),
}

/// Counters for one pass over every (interface, metric) pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoundStats {
    pub attempted: usize,
    pub succeeded: usize,
    pub transport_errors: usize,
    pub protocol_errors: usize,
    pub sink_errors: usize,
}

/// Read one counter instance.
pub async fn poll(client: &mut dyn SnmpClient, metric: &Metric, index: &str) -> PollOutcome {
    let oid = metric.instance_oid(index);

    match client.get(&oid).await {
        Ok(value) => match value.as_counter() {
            Some(counter) => PollOutcome::Success(counter),
            None => PollOutcome::ProtocolError(format!(
                "{} returned a non-counter value {:?}",
                oid, value
            )),
        },
        Err(e) if e.is_protocol() => PollOutcome::ProtocolError(e.to_string()),
        Err(e) => PollOutcome::TransportError(e.to_string()),
    }
}

/// Samples every configured counter of one host at a fixed delay.
///
/// Owns the host's SNMP session and its resolved interfaces. The sink is the
/// only thing shared with other pollers.
pub struct HostPoller {
    host: String,
    interfaces: Vec<ResolvedInterface>,
    metrics: Vec<Metric>,
    client: Box<dyn SnmpClient>,
    sink: Arc<dyn PointSink>,
    interval: Duration,
    log_points: bool,
}

impl HostPoller {
    /// Create a new poller for a host.
    pub fn new(
        host: impl Into<String>,
        interfaces: Vec<ResolvedInterface>,
        metrics: Vec<Metric>,
        client: Box<dyn SnmpClient>,
        sink: Arc<dyn PointSink>,
        interval: Duration,
    ) -> Self {
        Self {
            host: host.into(),
            interfaces,
            metrics,
            client,
            sink,
            interval,
            log_points: false,
        }
    }

    /// Log every emitted sample at debug level.
    pub fn with_point_logging(mut self, enabled: bool) -> Self {
        self.log_points = enabled;
        self
    }

    /// Run rounds until `shutdown` is cancelled.
    ///
    /// The delay starts after a round completes, so a slow round pushes every
    /// later round back. Cancellation is observed between rounds only.
    pub async fn run(mut self, shutdown: CancellationToken) {
        tracing::info!(
            host = %self.host,
            interval_secs = self.interval.as_secs(),
            interfaces = self.interfaces.len(),
            metrics = self.metrics.len(),
            "Starting poller"
        );

        loop {
            let stats = self.poll_round().await;

            tracing::debug!(
                host = %self.host,
                attempted = stats.attempted,
                succeeded = stats.succeeded,
                transport_errors = stats.transport_errors,
                protocol_errors = stats.protocol_errors,
                sink_errors = stats.sink_errors,
                "Poll round complete"
            );

            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }

        tracing::info!(host = %self.host, "Poller stopped");
    }

    /// Poll every (interface, metric) pair once, in configured order.
    ///
    /// Each success is written to the sink immediately as a one-sample batch.
    /// Failures of any kind skip that pair only.
    pub async fn poll_round(&mut self) -> RoundStats {
        let mut stats = RoundStats::default();

        for interface in &self.interfaces {
            for metric in &self.metrics {
                stats.attempted += 1;

                match poll(self.client.as_mut(), metric, &interface.index).await {
                    PollOutcome::Success(value) => {
                        stats.succeeded += 1;

                        let sample =
                            CounterSample::now(&metric.name, &self.host, &interface.name, value);
                        if self.log_points {
                            tracing::debug!(sample = ?sample, "Emitting sample");
                        }

                        if let Err(e) = self.sink.write(std::slice::from_ref(&sample)).await {
                            stats.sink_errors += 1;
                            tracing::warn!(
                                host = %self.host,
                                interface = %interface.name,
                                metric = %metric.name,
                                error = %e,
                                "Sink write failed"
                            );
                        }
                    }
                    PollOutcome::TransportError(detail) => {
                        stats.transport_errors += 1;
                        tracing::warn!(
                            host = %self.host,
                            interface = %interface.name,
                            metric = %metric.name,
                            error = %detail,
                            "Poll failed"
                        );
                    }
                    PollOutcome::ProtocolError(detail) => {
                        stats.protocol_errors += 1;
                        tracing::warn!(
                            host = %self.host,
                            interface = %interface.name,
                            metric = %metric.name,
                            error = %detail,
                            "Agent returned an error"
                        );
                    }
                }
            }
        }

        stats
    }
}
