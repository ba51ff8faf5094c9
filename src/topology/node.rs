//! Node records produced by topology discovery

use std::fmt;
use std::ops::RangeInclusive;

use serde::Serialize;

/// Replication role of a node at the time of the query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum NodeRole {
    Master,
    Slave,
    Unknown,
}

impl NodeRole {
    /// Parse the `role` field of INFO replication
    pub fn from_info(role: &str) -> Self {
        match role.trim() {
            r if r.eq_ignore_ascii_case("master") => NodeRole::Master,
            r if r.eq_ignore_ascii_case("slave") || r.eq_ignore_ascii_case("replica") => {
                NodeRole::Slave
            }
            _ => NodeRole::Unknown,
        }
    }

    /// Derive the role from a CLUSTER NODES flags field by substring match
    pub fn from_flags(flags: &str) -> Self {
        if flags.contains("master") {
            NodeRole::Master
        } else if flags.contains("slave") {
            NodeRole::Slave
        } else {
            NodeRole::Unknown
        }
    }
}

impl fmt::Display for NodeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NodeRole::Master => "master",
            NodeRole::Slave => "slave",
            NodeRole::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Member of a standalone master/replica group
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplicationNode {
    pub host: String,
    pub port: u16,
    pub role: NodeRole,
}

impl ReplicationNode {
    pub fn new(host: impl Into<String>, port: u16, role: NodeRole) -> Self {
        Self {
            host: host.into(),
            port,
            role,
        }
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Inclusive range of hash slots
pub type SlotRange = RangeInclusive<u16>;

/// One line of CLUSTER NODES output
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClusterNode {
    pub node_id: String,
    pub host: String,
    pub port: u16,
    /// Cluster bus port, when the `@cport` suffix is present
    pub bus_port: Option<u16>,
    pub role: NodeRole,
    /// Raw comma-separated flags, e.g. `myself,master`
    pub flags: String,
    /// Master node id; empty for masters
    pub master_id: String,
    pub link_state: String,
    /// First slot token, verbatim, for display
    pub slot_range: Option<String>,
    /// Every numeric slot range on the line
    #[serde(skip)]
    pub slots: Vec<SlotRange>,
}

impl ClusterNode {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn is_master(&self) -> bool {
        self.role == NodeRole::Master
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_from_flags() {
        assert_eq!(NodeRole::from_flags("myself,master"), NodeRole::Master);
        assert_eq!(NodeRole::from_flags("slave"), NodeRole::Slave);
        assert_eq!(NodeRole::from_flags("handshake"), NodeRole::Unknown);
    }

    #[test]
    fn test_role_from_info() {
        assert_eq!(NodeRole::from_info("master"), NodeRole::Master);
        assert_eq!(NodeRole::from_info("slave\r"), NodeRole::Slave);
        assert_eq!(NodeRole::from_info("sentinel"), NodeRole::Unknown);
    }

    #[test]
    fn test_role_serializes_uppercase() {
        let node = ReplicationNode::new("10.0.0.1", 6379, NodeRole::Master);
        let json = serde_json::to_string(&node).unwrap();
        assert_eq!(json, r#"{"host":"10.0.0.1","port":6379,"role":"MASTER"}"#);
    }
}
