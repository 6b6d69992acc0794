//! IF-MIB column definitions used to poll interface counters.
//!
//! Metrics are configured by name (`ifHCInOctets`, `ifHCOutOctets`, ...).
//! Each name maps to the OID of an `ifTable`/`ifXTable` column; the instance
//! to read is formed by appending the interface index resolved at startup.

use std::collections::{BTreeMap, HashMap};

use crate::error::ConfigError;
use crate::oid::parse_oid;

/// Root of the interface description column (`IF-MIB::ifDescr`).
pub const IF_DESCR: &str = "1.3.6.1.2.1.2.2.1.2";

/// Built-in counter columns from IF-MIB (RFC 2863).
const IF_MIB_COUNTERS: &[(&str, &str)] = &[
    // ifTable (32-bit)
    ("ifInOctets", "1.3.6.1.2.1.2.2.1.10"),
    ("ifInUcastPkts", "1.3.6.1.2.1.2.2.1.11"),
    ("ifInDiscards", "1.3.6.1.2.1.2.2.1.13"),
    ("ifInErrors", "1.3.6.1.2.1.2.2.1.14"),
    ("ifOutOctets", "1.3.6.1.2.1.2.2.1.16"),
    ("ifOutUcastPkts", "1.3.6.1.2.1.2.2.1.17"),
    ("ifOutDiscards", "1.3.6.1.2.1.2.2.1.19"),
    ("ifOutErrors", "1.3.6.1.2.1.2.2.1.20"),
    // ifXTable (64-bit high capacity)
    ("ifHCInOctets", "1.3.6.1.2.1.31.1.1.1.6"),
    ("ifHCInUcastPkts", "1.3.6.1.2.1.31.1.1.1.7"),
    ("ifHCOutOctets", "1.3.6.1.2.1.31.1.1.1.10"),
    ("ifHCOutUcastPkts", "1.3.6.1.2.1.31.1.1.1.11"),
];

/// A counter column to sample for every resolved interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metric {
    /// Measurement name written to the sink.
    pub name: String,
    /// Column OID without the instance index.
    pub oid: String,
}

impl Metric {
    /// OID of this column for one interface.
    pub fn instance_oid(&self, index: &str) -> String {
        format!("{}.{}", self.oid, index)
    }
}

/// Lookup table from metric name to column OID.
#[derive(Debug, Clone)]
pub struct MetricTable {
    columns: HashMap<String, String>,
}

impl Default for MetricTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl MetricTable {
    /// Table containing only the built-in IF-MIB counters.
    pub fn builtin() -> Self {
        let columns = IF_MIB_COUNTERS
            .iter()
            .map(|(name, oid)| (name.to_string(), oid.to_string()))
            .collect();
        Self { columns }
    }

    /// Add or override columns from configuration.
    ///
    /// Every OID must be a valid numeric OID.
    pub fn with_custom(mut self, custom: &BTreeMap<String, String>) -> Result<Self, ConfigError> {
        for (name, oid) in custom {
            let oid = oid.trim_start_matches('.');
            parse_oid(oid).map_err(|e| {
                ConfigError::validation(format!("Metric '{}' has an invalid OID: {}", name, e))
            })?;
            self.columns.insert(name.clone(), oid.to_string());
        }
        Ok(self)
    }

    /// Look up a single metric by name.
    pub fn get(&self, name: &str) -> Option<Metric> {
        self.columns.get(name).map(|oid| Metric {
            name: name.to_string(),
            oid: oid.clone(),
        })
    }

    /// Resolve configured metric names, preserving their order.
    pub fn resolve<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<Metric>, ConfigError> {
        names
            .iter()
            .map(|name| {
                let name = name.as_ref();
                self.get(name).ok_or_else(|| {
                    ConfigError::validation(format!("Unknown metric '{}'", name))
                })
            })
            .collect()
    }
}
