//! InfluxDB 1.x HTTP write API.

use std::fmt::Write as _;
use std::time::Duration;

use async_trait::async_trait;
use tripoll_common::CounterSample;

use super::{PointSink, SinkError};
use crate::config::InfluxConfig;

/// Writes samples as line protocol to `<url>/write?db=<database>&precision=s`.
///
/// Each sample becomes one line: measurement is the metric name, tags are
/// `host` and `interface`, the single field is `value`.
#[derive(Debug, Clone)]
pub struct InfluxSink {
    client: reqwest::Client,
    write_url: String,
    database: String,
    credentials: Option<(String, Option<String>)>,
}

impl InfluxSink {
    pub fn new(config: &InfluxConfig) -> Result<Self, SinkError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            write_url: format!("{}/write", config.url.trim_end_matches('/')),
            database: config.database.clone(),
            credentials: config
                .username
                .clone()
                .map(|user| (user, config.password.clone())),
        })
    }

    pub fn write_url(&self) -> &str {
        &self.write_url
    }
}

#[async_trait]
impl PointSink for InfluxSink {
    async fn write(&self, points: &[CounterSample]) -> Result<(), SinkError> {
        if points.is_empty() {
            return Ok(());
        }

        let body = points
            .iter()
            .map(line_protocol)
            .collect::<Vec<_>>()
            .join("\n");

        let mut request = self
            .client
            .post(&self.write_url)
            .query(&[("db", self.database.as_str()), ("precision", "s")])
            .body(body);

        if let Some((user, password)) = &self.credentials {
            request = request.basic_auth(user, password.as_ref());
        }

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SinkError::Status {
                code: status.as_u16(),
                body: body.trim().to_string(),
            });
        }

        tracing::trace!(points = points.len(), "Wrote samples to InfluxDB");
        Ok(())
    }
}

/// Render a sample as one line of InfluxDB line protocol.
///
/// InfluxDB 1.x only accepts signed integer fields, so counters above
/// `i64::MAX` are written as `i64::MAX`.
pub fn line_protocol(sample: &CounterSample) -> String {
    let mut line = String::new();

    escape_into(&mut line, &sample.metric, &[',', ' ']);
    line.push_str(",host=");
    escape_into(&mut line, &sample.host, &[',', ' ', '=']);
    line.push_str(",interface=");
    escape_into(&mut line, &sample.interface, &[',', ' ', '=']);

    let value = i64::try_from(sample.value).unwrap_or(i64::MAX);
    let _ = write!(line, " value={}i {}", value, sample.timestamp.timestamp());

    line
}

fn escape_into(out: &mut String, raw: &str, special: &[char]) {
    for c in raw.chars() {
        if special.contains(&c) || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
}
