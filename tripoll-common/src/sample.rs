use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

/// Timestamp layout used for every emitted sample: `YYYY-MM-DDTHH:MM:SSZ`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// One interface counter reading taken from a host.
///
/// Samples are produced per successful poll and handed straight to a sink;
/// nothing keeps them around afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterSample {
    /// Measurement name, e.g. `ifHCInOctets`.
    pub metric: String,

    /// Host address the counter was read from.
    pub host: String,

    /// Logical interface name (the configured pattern that matched).
    pub interface: String,

    /// When the counter was read, truncated to whole seconds.
    #[serde(with = "rfc3339_seconds")]
    pub timestamp: DateTime<Utc>,

    /// Raw counter value.
    pub value: u64,
}

impl CounterSample {
    /// Create a sample stamped with the current UTC time.
    pub fn now(
        metric: impl Into<String>,
        host: impl Into<String>,
        interface: impl Into<String>,
        value: u64,
    ) -> Self {
        Self::at(metric, host, interface, Utc::now(), value)
    }

    /// Create a sample with an explicit timestamp.
    pub fn at(
        metric: impl Into<String>,
        host: impl Into<String>,
        interface: impl Into<String>,
        timestamp: DateTime<Utc>,
        value: u64,
    ) -> Self {
        Self {
            metric: metric.into(),
            host: host.into(),
            interface: interface.into(),
            timestamp: timestamp.trunc_subsecs(0),
            value,
        }
    }

    /// The timestamp rendered as `YYYY-MM-DDTHH:MM:SSZ`.
    pub fn time(&self) -> String {
        format_timestamp(&self.timestamp)
    }
}

/// Render a UTC time as `YYYY-MM-DDTHH:MM:SSZ`.
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}

mod rfc3339_seconds {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    use super::{TIMESTAMP_FORMAT, format_timestamp};

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_timestamp(ts))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, TIMESTAMP_FORMAT)
            .map(|naive| naive.and_utc())
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_sample_creation() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        let sample = CounterSample::at("ifHCInOctets", "sw1", "0/5", ts, 123456);

        assert_eq!(sample.metric, "ifHCInOctets");
        assert_eq!(sample.host, "sw1");
        assert_eq!(sample.interface, "0/5");
        assert_eq!(sample.value, 123456);
        assert_eq!(sample.time(), "2024-03-09T07:05:01Z");
    }

    #[test]
    fn test_subseconds_are_dropped() {
        let ts = Utc.timestamp_opt(1_700_000_000, 987_654_321).unwrap();
        let sample = CounterSample::at("ifHCOutOctets", "sw1", "eth0", ts, 1);

        assert_eq!(sample.timestamp.timestamp_subsec_nanos(), 0);
        assert_eq!(sample.time(), "2023-11-14T22:13:20Z");
    }

    #[test]
    fn test_now_has_expected_shape() {
        let sample = CounterSample::now("ifHCInOctets", "sw1", "0/5", 7);
        let time = sample.time();

        assert_eq!(time.len(), 20);
        assert!(time.ends_with('Z'));
        assert_eq!(&time[10..11], "T");
    }

    #[test]
    fn test_json_timestamp_field() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let sample = CounterSample::at("ifHCInOctets", "sw1", "0/5", ts, 42);

        let json = serde_json::to_value(&sample).unwrap();
        assert_eq!(json["timestamp"], "2024-01-02T03:04:05Z");
        assert_eq!(json["value"], 42);

        let back: CounterSample = serde_json::from_value(json).unwrap();
        assert_eq!(back, sample);
    }
}
