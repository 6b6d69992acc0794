//! tripoll: interface traffic counter poller.
//!
//! Resolves configured interface names to SNMP `ifIndex` values on every
//! host, then runs one independent polling loop per host that reads the
//! 64-bit octet counters at a fixed delay and writes each reading to a
//! shared point sink.
//!
//! # Flow
//!
//! ```text
//! config -> resolver (per host) -> poller (per host, forever) -> sink
//! ```
//!
//! - [`config`] - JSON5 configuration and validation
//! - [`snmp`] - SNMP client adapter (GET / WALK)
//! - [`resolver`] - `ifDescr` walk and interface name matching
//! - [`poller`] - per-host polling loop
//! - [`sink`] - InfluxDB and Zenoh point sinks
//! - [`supervisor`] - task startup, heartbeat and shutdown

pub mod args;
pub mod config;
pub mod error;
pub mod mib;
pub mod oid;
pub mod poller;
pub mod resolver;
pub mod sink;
pub mod snmp;
pub mod supervisor;

#[cfg(test)]
mod testing;

pub use config::{HostConfig, HostTarget, SinkConfig, TripollConfig};
pub use error::ConfigError;
pub use poller::{HostPoller, PollOutcome, RoundStats};
pub use resolver::{InterfaceMatcher, ResolvedInterface, resolve_interfaces};
pub use sink::{PointSink, SinkError, build_sink};
pub use snmp::{Snmp2Connector, SnmpClient, SnmpConnector, SnmpError, SnmpValue, VarBind};
pub use supervisor::Supervisor;
