//! Point sinks: where counter samples go once they are read.
//!
//! All pollers share one sink through `Arc<dyn PointSink>`, so every
//! implementation must accept concurrent writes.

mod influx;
mod zenoh_sink;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tripoll_common::CounterSample;

use crate::config::SinkConfig;

pub use influx::{InfluxSink, line_protocol};
pub use zenoh_sink::{ZenohSink, sample_key};

/// Errors reported by a sink write.
#[derive(Error, Debug)]
pub enum SinkError {
    /// The HTTP request could not be completed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The store answered with a non-success status.
    #[error("Write rejected with status {code}: {body}")]
    Status { code: u16, body: String },

    /// Serialization error.
    #[error("Failed to encode sample: {0}")]
    Encode(String),

    /// Publishing error.
    #[error("Failed to publish to {key}: {message}")]
    Publish { key: String, message: String },

    /// Sink could not be set up.
    #[error("Failed to connect sink: {0}")]
    Connect(String),
}

/// Accepts batches of samples for persistence.
///
/// Failures are reported to the caller and never retried here.
#[async_trait]
pub trait PointSink: Send + Sync {
    async fn write(&self, points: &[CounterSample]) -> Result<(), SinkError>;
}

/// Build the sink selected by configuration.
pub async fn build_sink(config: &SinkConfig) -> Result<Arc<dyn PointSink>, SinkError> {
    match config {
        SinkConfig::Influxdb(influx) => {
            let sink = InfluxSink::new(influx)?;
            tracing::info!(
                url = %influx.url,
                database = %influx.database,
                "Writing samples to InfluxDB"
            );
            Ok(Arc::new(sink))
        }
        SinkConfig::Zenoh(zenoh) => {
            let sink = ZenohSink::connect(zenoh).await?;
            tracing::info!(key_prefix = %zenoh.key_prefix, "Publishing samples to Zenoh");
            Ok(Arc::new(sink))
        }
    }
}
