//! Interface discovery.
//!
//! Resolves configured interface names to `ifIndex` values by walking
//! `ifDescr` and matching each description against the configured patterns.
//!
//! Matching rules:
//! - A pattern is a regular expression anchored at the end of the
//!   description, so `0/5` matches `GigabitEthernet0/5` but not
//!   `GigabitEthernet0/50`.
//! - Patterns are tried in configured order and the first match wins for a
//!   given row.
//! - Every matching row produces an entry. Two rows ending in the same
//!   pattern yield two entries with the same logical name; they are not
//!   deduplicated.
//! - Patterns with no matching row are left out of the result.

use regex::Regex;

use crate::mib::IF_DESCR;
use crate::oid::table_index;
use crate::snmp::{SnmpClient, SnmpError, VarBind};

/// A configured interface bound to its SNMP table index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedInterface {
    /// The pattern that matched; used as the `interface` tag of samples.
    pub name: String,
    /// Last component of the `ifDescr` row OID.
    pub index: String,
}

impl ResolvedInterface {
    pub fn new(name: impl Into<String>, index: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            index: index.into(),
        }
    }
}

/// Compiled interface name patterns for one host.
#[derive(Debug, Clone)]
pub struct InterfaceMatcher {
    patterns: Vec<(String, Regex)>,
}

impl InterfaceMatcher {
    /// Compile patterns, each anchored at the end of the description.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, regex::Error> {
        let patterns = patterns
            .iter()
            .map(|pattern| {
                let pattern = pattern.as_ref();
                Regex::new(&format!("(?:{})$", pattern)).map(|re| (pattern.to_string(), re))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { patterns })
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Name of the first pattern matching the end of `description`.
    pub fn first_match(&self, description: &str) -> Option<&str> {
        self.patterns
            .iter()
            .find(|(_, re)| re.is_match(description))
            .map(|(name, _)| name.as_str())
    }

    /// Match walked `ifDescr` rows, in walk order.
    pub fn match_rows(&self, rows: &[VarBind]) -> Vec<ResolvedInterface> {
        rows.iter()
            .filter_map(|row| {
                self.first_match(&row.value.display())
                    .map(|name| ResolvedInterface::new(name, table_index(&row.oid)))
            })
            .collect()
    }
}

/// Walk `ifDescr` on `host` and resolve its interfaces.
///
/// A transport failure fails the whole resolution. An error status part way
/// through the walk is logged and the rows walked so far are still matched.
pub async fn resolve_interfaces(
    client: &mut dyn SnmpClient,
    host: &str,
    matcher: &InterfaceMatcher,
) -> Result<Vec<ResolvedInterface>, SnmpError> {
    if matcher.is_empty() {
        tracing::debug!(host = %host, "No interface patterns configured");
        return Ok(Vec::new());
    }

    let rows = match client.walk(IF_DESCR).await {
        Ok(rows) => rows,
        Err(walk) => match walk.error {
            SnmpError::Protocol { ref status, index, ref oid } => {
                tracing::warn!(
                    host = %host,
                    status = %status,
                    index,
                    oid = oid.as_deref().unwrap_or("?"),
                    rows = walk.rows.len(),
                    "ifDescr walk ended with an error status; using partial table"
                );
                walk.rows
            }
            error => return Err(error),
        },
    };

    let resolved = matcher.match_rows(&rows);

    tracing::info!(
        host = %host,
        rows = rows.len(),
        patterns = matcher.len(),
        resolved = resolved.len(),
        "Resolved interfaces"
    );
    for interface in &resolved {
        tracing::debug!(
            host = %host,
            interface = %interface.name,
            index = %interface.index,
            "Interface resolved"
        );
    }

    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snmp::SnmpValue;
    use crate::testing::FakeClient;

    fn descr(index: u32, text: &str) -> VarBind {
        VarBind::new(
            format!(".1.3.6.1.2.1.2.2.1.2.{}", index),
            SnmpValue::Text(text.to_string()),
        )
    }

    #[test]
    fn test_suffix_anchor() {
        let matcher = InterfaceMatcher::new(&["0/5"]).unwrap();

        assert_eq!(matcher.first_match("GigabitEthernet0/5"), Some("0/5"));
        assert_eq!(matcher.first_match("GigabitEthernet0/50"), None);
        assert_eq!(matcher.first_match("GigabitEthernet0/5.100"), None);
    }

    #[test]
    fn test_first_match_wins_per_row() {
        let matcher = InterfaceMatcher::new(&["0/5", "Ethernet0/5"]).unwrap();
        let rows = vec![descr(5, "GigabitEthernet0/5")];

        assert_eq!(
            matcher.match_rows(&rows),
            vec![ResolvedInterface::new("0/5", "5")]
        );
    }

    #[test]
    fn test_duplicates_preserved() {
        let matcher = InterfaceMatcher::new(&["0/1"]).unwrap();
        let rows = vec![
            descr(1, "GigabitEthernet0/1"),
            descr(2, "GigabitEthernet0/2"),
            descr(101, "TenGigabitEthernet0/1"),
        ];

        assert_eq!(
            matcher.match_rows(&rows),
            vec![
                ResolvedInterface::new("0/1", "1"),
                ResolvedInterface::new("0/1", "101"),
            ]
        );
    }

    #[test]
    fn test_regex_patterns() {
        let matcher = InterfaceMatcher::new(&["eth[0-9]+"]).unwrap();
        let rows = vec![descr(2, "eth0"), descr(3, "lo"), descr(4, "eth12")];

        let resolved = matcher.match_rows(&rows);
        assert_eq!(resolved.len(), 2);
        assert!(resolved.iter().all(|i| i.name == "eth[0-9]+"));
        assert_eq!(resolved[1].index, "4");
    }

    #[test]
    fn test_invalid_pattern() {
        assert!(InterfaceMatcher::new(&["Gi(0/1"]).is_err());
    }

    #[tokio::test]
    async fn test_resolve_scenario() {
        let mut client = FakeClient::new().with_rows(vec![
            descr(5, "GigabitEthernet0/5"),
            descr(7, "GigabitEthernet0/7"),
        ]);
        let matcher = InterfaceMatcher::new(&["0/5"]).unwrap();

        let resolved = resolve_interfaces(&mut client, "sw1", &matcher).await.unwrap();

        assert_eq!(resolved, vec![ResolvedInterface::new("0/5", "5")]);
        assert_eq!(client.walks(), vec![IF_DESCR.to_string()]);
    }

    #[tokio::test]
    async fn test_transport_error_fails_resolution() {
        let mut client = FakeClient::new()
            .with_rows(vec![descr(5, "GigabitEthernet0/5")])
            .with_walk_error(SnmpError::transport("request timed out"));
        let matcher = InterfaceMatcher::new(&["0/5"]).unwrap();

        let result = resolve_interfaces(&mut client, "sw1", &matcher).await;
        assert!(matches!(result, Err(SnmpError::Transport(_))));
    }

    #[tokio::test]
    async fn test_protocol_error_keeps_partial_rows() {
        let mut client = FakeClient::new()
            .with_rows(vec![descr(5, "GigabitEthernet0/5")])
            .with_walk_error(SnmpError::Protocol {
                status: "genErr".to_string(),
                index: 1,
                oid: None,
            });
        let matcher = InterfaceMatcher::new(&["0/5", "0/7"]).unwrap();

        let resolved = resolve_interfaces(&mut client, "sw1", &matcher).await.unwrap();
        assert_eq!(resolved, vec![ResolvedInterface::new("0/5", "5")]);
    }

    #[tokio::test]
    async fn test_repeating_agent_keeps_rows_before_repeat() {
        // The walk stopped when the agent answered row 1 a second time.
        let mut client = FakeClient::new()
            .with_rows(vec![descr(1, "eth0")])
            .with_walk_error(SnmpError::Protocol {
                status: "oidNotIncreasing".to_string(),
                index: 1,
                oid: Some("1.3.6.1.2.1.2.2.1.2.1".to_string()),
            });
        let matcher = InterfaceMatcher::new(&["eth0"]).unwrap();

        let resolved = resolve_interfaces(&mut client, "sw1", &matcher).await.unwrap();
        assert_eq!(resolved, vec![ResolvedInterface::new("eth0", "1")]);
        assert_eq!(client.walks().len(), 1);
    }

    #[tokio::test]
    async fn test_no_patterns_skips_walk() {
        let mut client = FakeClient::new().with_rows(vec![descr(5, "GigabitEthernet0/5")]);
        let matcher = InterfaceMatcher::new::<&str>(&[]).unwrap();

        let resolved = resolve_interfaces(&mut client, "sw1", &matcher).await.unwrap();
        assert!(resolved.is_empty());
        assert!(client.walks().is_empty());
    }
}
