use serde::Serialize;

use crate::error::{Error, Result};

/// Payload encoding for samples published over Zenoh.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// JSON (human-readable).
    #[default]
    Json,

    /// CBOR (compact binary).
    Cbor,
}

/// Encode a value to bytes using the specified format.
pub fn encode<T: Serialize>(value: &T, format: Format) -> Result<Vec<u8>> {
    match format {
        Format::Json => serde_json::to_vec(value).map_err(Error::from),
        Format::Cbor => {
            let mut buf = Vec::new();
            ciborium::into_writer(value, &mut buf)?;
            Ok(buf)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::CounterSample;

    fn sample() -> CounterSample {
        CounterSample::now("ifHCInOctets", "sw1", "0/5", 123456)
    }

    #[test]
    fn test_json_payload() {
        let encoded = encode(&sample(), Format::Json).unwrap();
        let decoded: CounterSample = serde_json::from_slice(&encoded).unwrap();
        assert_eq!(decoded.interface, "0/5");
        assert_eq!(decoded.value, 123456);
    }

    #[test]
    fn test_cbor_is_smaller() {
        let json = encode(&sample(), Format::Json).unwrap();
        let cbor = encode(&sample(), Format::Cbor).unwrap();

        assert!(cbor.len() < json.len(), "CBOR should be smaller than JSON");

        let decoded: CounterSample = ciborium::from_reader(cbor.as_slice()).unwrap();
        assert_eq!(decoded.metric, "ifHCInOctets");
    }

    #[test]
    fn test_format_names() {
        let format: Format = serde_json::from_str("\"cbor\"").unwrap();
        assert_eq!(format, Format::Cbor);
        assert_eq!(Format::default(), Format::Json);
    }
}
