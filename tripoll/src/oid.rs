use std::cmp::Ordering;

use snmp2::Oid;

use crate::snmp::SnmpError;

/// Parse a dotted OID string (e.g., "1.3.6.1.2.1.2.2.1.2") into an snmp2::Oid.
///
/// A leading dot is accepted.
pub fn parse_oid(oid_str: &str) -> Result<Oid<'static>, SnmpError> {
    oid_str
        .trim_start_matches('.')
        .parse::<Oid>()
        .map(|oid| oid.to_owned())
        .map_err(|e| SnmpError::InvalidOid(format!("'{}': {:?}", oid_str, e)))
}

/// Convert an snmp2::Oid back to a dotted string representation.
pub fn oid_to_string(oid: &Oid) -> String {
    oid.to_id_string()
}

/// Check if an OID is a child of (or equal to) a parent OID.
pub fn oid_starts_with(oid: &Oid, parent: &Oid) -> bool {
    oid.starts_with(parent)
}

/// Order two dotted OIDs by their numeric components, as agents sort them.
///
/// `"1.3.6.1.2.1.2.2.1.2.10"` sorts after `"1.3.6.1.2.1.2.2.1.2.9"`, and a
/// parent sorts before all of its children.
pub fn compare_oids(a: &str, b: &str) -> Ordering {
    let components = |oid: &str| -> Vec<u64> {
        oid.trim_start_matches('.')
            .split('.')
            .map(|c| c.parse().unwrap_or(0))
            .collect()
    };
    components(a).cmp(&components(b))
}

/// Interface index of a table row: the last dotted component of its OID.
///
/// `".1.3.6.1.2.1.2.2.1.2.5"` yields `"5"`.
pub fn table_index(oid: &str) -> &str {
    oid.rsplit('.').next().unwrap_or(oid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_oid() {
        let oid = parse_oid("1.3.6.1.2.1.2.2.1.2").unwrap();
        assert_eq!(oid_to_string(&oid), "1.3.6.1.2.1.2.2.1.2");

        let dotted = parse_oid(".1.3.6.1.2.1.2.2.1.2").unwrap();
        assert_eq!(oid_to_string(&dotted), "1.3.6.1.2.1.2.2.1.2");
    }

    #[test]
    fn test_oid_starts_with() {
        let parent = parse_oid("1.3.6.1.2.1.2.2.1.2").unwrap();
        let row = parse_oid("1.3.6.1.2.1.2.2.1.2.17").unwrap();
        let next_column = parse_oid("1.3.6.1.2.1.2.2.1.3.1").unwrap();

        assert!(oid_starts_with(&row, &parent));
        assert!(oid_starts_with(&parent, &parent));
        assert!(!oid_starts_with(&next_column, &parent));
        assert!(!oid_starts_with(&parent, &row));
    }

    #[test]
    fn test_compare_oids() {
        let base = "1.3.6.1.2.1.2.2.1.2";
        let row = |index: &str| format!("{}.{}", base, index);

        assert_eq!(compare_oids(&row("10"), &row("9")), Ordering::Greater);
        assert_eq!(compare_oids(base, &row("1")), Ordering::Less);
        assert_eq!(compare_oids(&format!(".{}", row("1")), &row("1")), Ordering::Equal);
        assert_eq!(compare_oids("1.3.6.1.2.1.2.2.1.3.1", &row("99")), Ordering::Greater);
    }

    #[test]
    fn test_table_index() {
        assert_eq!(table_index(".1.3.6.1.2.1.2.2.1.2.5"), "5");
        assert_eq!(table_index("1.3.6.1.2.1.2.2.1.2.10101"), "10101");
        assert_eq!(table_index("7"), "7");
    }
}
