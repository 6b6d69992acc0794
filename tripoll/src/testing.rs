//! In-memory SNMP agents and sinks for unit tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tripoll_common::CounterSample;

use crate::config::HostTarget;
use crate::sink::{PointSink, SinkError};
use crate::snmp::{SnmpClient, SnmpConnector, SnmpError, SnmpValue, VarBind, WalkError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Get(String),
    Walk(String),
}

/// Scripted agent: a fixed walk table plus per-OID GET answers.
#[derive(Debug, Clone, Default)]
pub struct FakeClient {
    rows: Vec<VarBind>,
    walk_error: Option<SnmpError>,
    values: HashMap<String, Result<SnmpValue, SnmpError>>,
    get_delay: Option<Duration>,
    log: Arc<Mutex<Vec<Request>>>,
}

impl FakeClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(mut self, rows: Vec<VarBind>) -> Self {
        self.rows = rows;
        self
    }

    /// Fail the walk after returning the configured rows.
    pub fn with_walk_error(mut self, error: SnmpError) -> Self {
        self.walk_error = Some(error);
        self
    }

    pub fn with_value(mut self, oid: &str, value: Result<SnmpValue, SnmpError>) -> Self {
        self.values.insert(oid.to_string(), value);
        self
    }

    /// Make every GET take `delay` before answering.
    pub fn with_get_delay(mut self, delay: Duration) -> Self {
        self.get_delay = Some(delay);
        self
    }

    pub fn requests(&self) -> Vec<Request> {
        self.log.lock().unwrap().clone()
    }

    pub fn gets(&self) -> Vec<String> {
        self.requests()
            .into_iter()
            .filter_map(|r| match r {
                Request::Get(oid) => Some(oid),
                Request::Walk(_) => None,
            })
            .collect()
    }

    pub fn walks(&self) -> Vec<String> {
        self.requests()
            .into_iter()
            .filter_map(|r| match r {
                Request::Walk(oid) => Some(oid),
                Request::Get(_) => None,
            })
            .collect()
    }
}

#[async_trait]
impl SnmpClient for FakeClient {
    async fn get(&mut self, oid: &str) -> Result<SnmpValue, SnmpError> {
        self.log.lock().unwrap().push(Request::Get(oid.to_string()));
        if let Some(delay) = self.get_delay {
            tokio::time::sleep(delay).await;
        }
        self.values
            .get(oid)
            .cloned()
            .unwrap_or_else(|| Err(SnmpError::protocol("noSuchInstance", oid)))
    }

    async fn walk(&mut self, root: &str) -> Result<Vec<VarBind>, WalkError> {
        self.log.lock().unwrap().push(Request::Walk(root.to_string()));
        match &self.walk_error {
            Some(error) => Err(WalkError::new(self.rows.clone(), error.clone())),
            None => Ok(self.rows.clone()),
        }
    }
}

/// Hands out clones of per-address fake clients; unknown hosts are unreachable.
#[derive(Debug, Clone, Default)]
pub struct FakeConnector {
    clients: HashMap<String, FakeClient>,
}

impl FakeConnector {
    pub fn with_host(mut self, address: &str, client: FakeClient) -> Self {
        self.clients.insert(address.to_string(), client);
        self
    }
}

#[async_trait]
impl SnmpConnector for FakeConnector {
    async fn connect(&self, target: &HostTarget) -> Result<Box<dyn SnmpClient>, SnmpError> {
        self.clients
            .get(&target.address)
            .cloned()
            .map(|client| Box::new(client) as Box<dyn SnmpClient>)
            .ok_or_else(|| SnmpError::transport(format!("{} unreachable", target.address)))
    }
}

/// Sink that keeps every write, optionally rejecting them.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    writes: Arc<Mutex<Vec<Vec<CounterSample>>>>,
    failing: bool,
}

impl RecordingSink {
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Default::default()
        }
    }

    pub fn writes(&self) -> Vec<Vec<CounterSample>> {
        self.writes.lock().unwrap().clone()
    }

    pub fn samples(&self) -> Vec<CounterSample> {
        self.writes().into_iter().flatten().collect()
    }
}

#[async_trait]
impl PointSink for RecordingSink {
    async fn write(&self, points: &[CounterSample]) -> Result<(), SinkError> {
        self.writes.lock().unwrap().push(points.to_vec());
        if self.failing {
            return Err(SinkError::Status {
                code: 500,
                body: "write rejected".to_string(),
            });
        }
        Ok(())
    }
}
