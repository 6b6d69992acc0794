//! Zenoh publishing sink.

use std::sync::Arc;

use async_trait::async_trait;
use tripoll_common::{CounterSample, Format, connect, encode};

use super::{PointSink, SinkError};
use crate::config::ZenohSinkConfig;

/// Publishes each sample on `<prefix>/<host>/<interface>/<metric>`.
#[derive(Clone)]
pub struct ZenohSink {
    session: Arc<zenoh::Session>,
    key_prefix: String,
    format: Format,
}

impl ZenohSink {
    /// Open a Zenoh session and build the sink.
    pub async fn connect(config: &ZenohSinkConfig) -> Result<Self, SinkError> {
        let session = connect(&config.zenoh)
            .await
            .map_err(|e| SinkError::Connect(e.to_string()))?;

        Ok(Self::new(
            Arc::new(session),
            config.key_prefix.clone(),
            config.serialization,
        ))
    }

    pub fn new(session: Arc<zenoh::Session>, key_prefix: impl Into<String>, format: Format) -> Self {
        Self {
            session,
            key_prefix: key_prefix.into(),
            format,
        }
    }
}

#[async_trait]
impl PointSink for ZenohSink {
    async fn write(&self, points: &[CounterSample]) -> Result<(), SinkError> {
        for point in points {
            let key = sample_key(&self.key_prefix, point);
            let payload =
                encode(point, self.format).map_err(|e| SinkError::Encode(e.to_string()))?;

            self.session
                .put(&key, payload)
                .await
                .map_err(|e| SinkError::Publish {
                    key: key.clone(),
                    message: e.to_string(),
                })?;

            tracing::trace!(key = %key, "Published sample");
        }

        Ok(())
    }
}

/// Key expression for a sample. Each name becomes exactly one chunk.
pub fn sample_key(prefix: &str, sample: &CounterSample) -> String {
    format!(
        "{}/{}/{}/{}",
        prefix,
        key_chunk(&sample.host),
        key_chunk(&sample.interface),
        key_chunk(&sample.metric)
    )
}

/// Replace characters that are separators or wildcards in key expressions.
fn key_chunk(name: &str) -> String {
    let chunk: String = name
        .chars()
        .map(|c| match c {
            '/' | '*' | '$' | '?' | '#' => '_',
            c if c.is_whitespace() => '_',
            c => c,
        })
        .collect();

    if chunk.is_empty() { "_".to_string() } else { chunk }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_key() {
        let sample = CounterSample::now("ifHCInOctets", "sw1", "0/5", 1);
        assert_eq!(sample_key("tripoll", &sample), "tripoll/sw1/0_5/ifHCInOctets");
    }

    #[test]
    fn test_key_chunk_sanitizing() {
        assert_eq!(key_chunk("Gi1/0/1 uplink"), "Gi1_0_1_uplink");
        assert_eq!(key_chunk("eth*"), "eth_");
        assert_eq!(key_chunk(""), "_");
        assert_eq!(key_chunk("10.0.0.2"), "10.0.0.2");
    }
}
