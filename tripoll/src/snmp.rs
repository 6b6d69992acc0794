//! SNMP client adapter.
//!
//! The resolver and pollers only see the [`SnmpClient`] and [`SnmpConnector`]
//! traits. [`Snmp2Connector`] is the production implementation backed by an
//! `snmp2` v2c session; tests substitute in-memory fakes.

use std::cmp::Ordering;
use std::time::Duration;

use async_trait::async_trait;
use snmp2::{AsyncSession, Oid, Value};
use thiserror::Error;
use tokio::time::timeout;

use crate::config::HostTarget;
use crate::oid::{compare_oids, oid_starts_with, oid_to_string, parse_oid};

/// Errors returned by SNMP operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnmpError {
    /// The request never produced a response (socket error, timeout, bad packet).
    #[error("transport error: {0}")]
    Transport(String),

    /// The agent answered with an error status.
    #[error("{status} at {}", .oid.as_deref().unwrap_or("?"))]
    Protocol {
        /// Symbolic error status, e.g. `noSuchName`.
        status: String,
        /// 1-based index of the offending variable binding, 0 when unknown.
        index: u32,
        /// OID of the offending variable binding, when it can be identified.
        oid: Option<String>,
    },

    /// An OID could not be parsed.
    #[error("invalid OID {0}")]
    InvalidOid(String),
}

impl SnmpError {
    /// Create a transport error.
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create a protocol error for a single-binding request.
    pub fn protocol(status: impl Into<String>, oid: impl Into<String>) -> Self {
        Self::Protocol {
            status: status.into(),
            index: 1,
            oid: Some(oid.into()),
        }
    }

    /// Whether the error came from the agent rather than the transport.
    pub fn is_protocol(&self) -> bool {
        matches!(self, Self::Protocol { .. })
    }
}

/// A walk that stopped early, with the rows collected before the failure.
#[derive(Debug, Clone, Error)]
#[error("walk stopped after {} rows: {error}", .rows.len())]
pub struct WalkError {
    pub rows: Vec<VarBind>,
    pub error: SnmpError,
}

impl WalkError {
    pub fn new(rows: Vec<VarBind>, error: SnmpError) -> Self {
        Self { rows, error }
    }
}

/// Owned SNMP value, detached from the response buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnmpValue {
    /// Counter32, Counter64, Unsigned32/Gauge32 and TimeTicks.
    Counter(u64),
    Integer(i64),
    /// OCTET STRING (lossy UTF-8), OBJECT IDENTIFIER and IpAddress renderings.
    Text(String),
    Null,
}

impl SnmpValue {
    /// Convert an `snmp2` value. Exceptions and unsupported types map to `Null`.
    pub fn from_snmp(value: &Value) -> Self {
        match value {
            Value::Integer(n) => SnmpValue::Integer(*n),
            Value::OctetString(s) => SnmpValue::Text(String::from_utf8_lossy(s).into_owned()),
            Value::ObjectIdentifier(oid) => SnmpValue::Text(oid_to_string(oid)),
            Value::IpAddress(ip) => {
                SnmpValue::Text(format!("{}.{}.{}.{}", ip[0], ip[1], ip[2], ip[3]))
            }
            Value::Counter32(n) => SnmpValue::Counter(*n as u64),
            Value::Unsigned32(n) => SnmpValue::Counter(*n as u64),
            Value::Timeticks(n) => SnmpValue::Counter(*n as u64),
            Value::Counter64(n) => SnmpValue::Counter(*n),
            _ => SnmpValue::Null,
        }
    }

    /// Counter reading, if the value can be one.
    pub fn as_counter(&self) -> Option<u64> {
        match self {
            SnmpValue::Counter(n) => Some(*n),
            SnmpValue::Integer(n) => u64::try_from(*n).ok(),
            _ => None,
        }
    }

    /// Human-readable form, as matched against interface name patterns.
    pub fn display(&self) -> String {
        match self {
            SnmpValue::Counter(n) => n.to_string(),
            SnmpValue::Integer(n) => n.to_string(),
            SnmpValue::Text(s) => s.clone(),
            SnmpValue::Null => String::new(),
        }
    }
}

/// One `(oid, value)` pair returned by a walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarBind {
    pub oid: String,
    pub value: SnmpValue,
}

impl VarBind {
    pub fn new(oid: impl Into<String>, value: SnmpValue) -> Self {
        Self {
            oid: oid.into(),
            value,
        }
    }
}

/// GET and table WALK against one host.
#[async_trait]
pub trait SnmpClient: Send {
    /// Read a single instance.
    async fn get(&mut self, oid: &str) -> Result<SnmpValue, SnmpError>;

    /// Read every instance below `root`, in agent order.
    async fn walk(&mut self, root: &str) -> Result<Vec<VarBind>, WalkError>;
}

/// Opens an [`SnmpClient`] session for a host.
#[async_trait]
pub trait SnmpConnector: Send + Sync {
    async fn connect(&self, target: &HostTarget) -> Result<Box<dyn SnmpClient>, SnmpError>;
}

/// Connector producing `snmp2` v2c sessions.
#[derive(Debug, Clone)]
pub struct Snmp2Connector {
    request_timeout: Duration,
}

impl Snmp2Connector {
    pub fn new(request_timeout: Duration) -> Self {
        Self { request_timeout }
    }
}

#[async_trait]
impl SnmpConnector for Snmp2Connector {
    async fn connect(&self, target: &HostTarget) -> Result<Box<dyn SnmpClient>, SnmpError> {
        let address = target.socket_addr();
        let session = AsyncSession::new_v2c(address.as_str(), target.community.as_bytes(), 0)
            .await
            .map_err(|e| {
                SnmpError::transport(format!("failed to open session to {}: {}", address, e))
            })?;

        tracing::debug!(address = %address, "Opened SNMPv2c session");

        Ok(Box::new(Snmp2Client {
            session,
            request_timeout: self.request_timeout,
        }))
    }
}

/// A persistent v2c session to one host.
pub struct Snmp2Client {
    session: AsyncSession,
    request_timeout: Duration,
}

#[async_trait]
impl SnmpClient for Snmp2Client {
    async fn get(&mut self, oid_str: &str) -> Result<SnmpValue, SnmpError> {
        let oid = parse_oid(oid_str)?;

        let response = timeout(self.request_timeout, self.session.get(&oid))
            .await
            .map_err(|_| SnmpError::transport("GET timed out"))?
            .map_err(|e| SnmpError::transport(format!("GET failed: {}", e)))?;

        let varbinds: Vec<(Oid, Value)> = response.varbinds.into_iter().collect();
        check_status(response.error_status, response.error_index, &varbinds)?;

        let Some((resp_oid, value)) = varbinds.into_iter().next() else {
            return Err(SnmpError::protocol("emptyResponse", oid_str));
        };

        match value {
            Value::NoSuchObject => {
                Err(SnmpError::protocol("noSuchObject", oid_to_string(&resp_oid)))
            }
            Value::NoSuchInstance => {
                Err(SnmpError::protocol("noSuchInstance", oid_to_string(&resp_oid)))
            }
            other => Ok(SnmpValue::from_snmp(&other)),
        }
    }

    async fn walk(&mut self, root: &str) -> Result<Vec<VarBind>, WalkError> {
        let subtree = parse_oid(root).map_err(|e| WalkError::new(Vec::new(), e))?;
        let mut rows = Vec::new();
        let mut current_oid = subtree.clone();

        loop {
            let request = self.session.getnext(&current_oid);
            let response = match timeout(self.request_timeout, request).await {
                Ok(Ok(response)) => response,
                Ok(Err(e)) => {
                    let error = SnmpError::transport(format!("GETNEXT failed: {}", e));
                    return Err(WalkError::new(rows, error));
                }
                Err(_) => {
                    let error = SnmpError::transport("GETNEXT timed out");
                    return Err(WalkError::new(rows, error));
                }
            };

            let varbinds: Vec<(Oid, Value)> = response.varbinds.into_iter().collect();
            let status = check_status(response.error_status, response.error_index, &varbinds);
            if let Err(error) = status {
                return Err(WalkError::new(rows, error));
            }

            let Some((resp_oid, value)) = varbinds.into_iter().next() else {
                break;
            };

            if !oid_starts_with(&resp_oid, &subtree) || matches!(value, Value::EndOfMibView) {
                break;
            }

            let next = oid_to_string(&resp_oid);
            if let Err(error) = check_increasing(&oid_to_string(&current_oid), &next) {
                return Err(WalkError::new(rows, error));
            }

            rows.push(VarBind::new(next, SnmpValue::from_snmp(&value)));
            current_oid = resp_oid.to_owned();
        }

        Ok(rows)
    }
}

/// Map a non-zero error-status to [`SnmpError::Protocol`], naming the
/// offending binding by its 1-based error index.
fn check_status(status: u32, index: u32, varbinds: &[(Oid, Value)]) -> Result<(), SnmpError> {
    if status == 0 {
        return Ok(());
    }

    let oid = usize::try_from(index)
        .ok()
        .and_then(|i| i.checked_sub(1))
        .and_then(|i| varbinds.get(i))
        .map(|(oid, _)| oid_to_string(oid));

    Err(SnmpError::Protocol {
        status: error_status_name(status).to_string(),
        index,
        oid,
    })
}

/// A GETNEXT reply must sort after the request OID, or a misbehaving agent
/// would keep the walk going forever.
fn check_increasing(requested: &str, returned: &str) -> Result<(), SnmpError> {
    if compare_oids(returned, requested) == Ordering::Greater {
        return Ok(());
    }

    Err(SnmpError::Protocol {
        status: "oidNotIncreasing".to_string(),
        index: 1,
        oid: Some(returned.to_string()),
    })
}

/// Symbolic name of an SNMPv2 error-status (RFC 3416).
pub fn error_status_name(status: u32) -> &'static str {
    match status {
        0 => "noError",
        1 => "tooBig",
        2 => "noSuchName",
        3 => "badValue",
        4 => "readOnly",
        5 => "genErr",
        6 => "noAccess",
        7 => "wrongType",
        8 => "wrongLength",
        9 => "wrongEncoding",
        10 => "wrongValue",
        11 => "noCreation",
        12 => "inconsistentValue",
        13 => "resourceUnavailable",
        14 => "commitFailed",
        15 => "undoFailed",
        16 => "authorizationError",
        17 => "notWritable",
        18 => "inconsistentName",
        _ => "unknownError",
    }
}
