//! Well-known port to service label table

/// Label used for ports that have no catalog entry
pub const UNKNOWN_SERVICE: &str = "Unknown";

/// Static well-known port table, sorted by port number
const SERVICES: &[(u16, &str)] = &[
    (20, "FTP-Data"),
    (21, "FTP"),
    (22, "SSH"),
    (23, "Telnet"),
    (25, "SMTP"),
    (53, "DNS"),
    (67, "DHCP"),
    (69, "TFTP"),
    (80, "HTTP"),
    (110, "POP3"),
    (119, "NNTP"),
    (123, "NTP"),
    (135, "MS-RPC"),
    (139, "NetBIOS"),
    (143, "IMAP"),
    (161, "SNMP"),
    (389, "LDAP"),
    (443, "HTTPS"),
    (445, "SMB"),
    (465, "SMTPS"),
    (514, "Syslog"),
    (587, "SMTP-Submission"),
    (631, "IPP"),
    (636, "LDAPS"),
    (993, "IMAPS"),
    (995, "POP3S"),
    (1433, "MSSQL"),
    (1521, "Oracle"),
    (1723, "PPTP"),
    (1883, "MQTT"),
    (2049, "NFS"),
    (3306, "MySQL"),
    (3389, "RDP"),
    (5432, "PostgreSQL"),
    (5672, "AMQP"),
    (5900, "VNC"),
    (6379, "Redis"),
    (8080, "HTTP-Alt"),
    (8443, "HTTPS-Alt"),
    (9200, "Elasticsearch"),
    (11211, "Memcached"),
    (27017, "MongoDB"),
];

/// Read-only view over the well-known service table.
///
/// The table is a `const`, so lookups are safe from any number of
/// concurrent probes without synchronization.
#[derive(Debug, Clone, Copy, Default)]
pub struct ServiceCatalog;

impl ServiceCatalog {
    /// Label for `port`, or `"Unknown"` when the port is not catalogued
    pub fn label(port: u16) -> &'static str {
        Self::lookup(port).unwrap_or(UNKNOWN_SERVICE)
    }

    /// Label for `port` if it is catalogued
    pub fn lookup(port: u16) -> Option<&'static str> {
        SERVICES
            .binary_search_by_key(&port, |&(p, _)| p)
            .ok()
            .map(|idx| SERVICES[idx].1)
    }

    /// Number of catalogued services
    pub fn len() -> usize {
        SERVICES.len()
    }

    /// Iterate all catalogued entries in port order
    pub fn entries() -> impl Iterator<Item = (u16, &'static str)> {
        SERVICES.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_labels() {
        assert_eq!(ServiceCatalog::label(22), "SSH");
        assert_eq!(ServiceCatalog::label(443), "HTTPS");
        assert_eq!(ServiceCatalog::label(3389), "RDP");
    }

    #[test]
    fn test_unknown_port_is_labelled_not_failed() {
        assert_eq!(ServiceCatalog::label(4), UNKNOWN_SERVICE);
        assert_eq!(ServiceCatalog::lookup(65535), None);
    }

    #[test]
    fn test_table_is_sorted_and_unique() {
        // binary search relies on this
        let ports: Vec<u16> = ServiceCatalog::entries().map(|(p, _)| p).collect();
        assert!(ports.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(ports.len(), ServiceCatalog::len());
    }

    #[test]
    fn test_default_ports_are_all_catalogued() {
        for &port in crate::defaults::DEFAULT_PORTS {
            assert!(ServiceCatalog::lookup(port).is_some(), "port {} missing", port);
        }
    }
}
