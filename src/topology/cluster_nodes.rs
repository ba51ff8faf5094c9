//! CLUSTER NODES parsing and slot mapping
//!
//! Line format:
//! `<id> <ip:port@cport[,hostname]> <flags> <master> <ping-sent> <pong-recv> <config-epoch> <link-state> <slot> <slot> ... <slot>`
//!
//! Example:
//! ```text
//! 07c37dfeb235213a872192d90877d0cd55635b91 127.0.0.1:30004@31004 slave e7d1eecce10fd6bb5eb35b9f99a514335d9ba9ca 0 1426238317239 4 connected
//! ```

use tracing::warn;

use super::node::{ClusterNode, NodeRole, SlotRange};
use crate::utils::ParseError;

pub const SLOT_COUNT: usize = 16384;

const MIN_FIELDS: usize = 8;

/// What to do with a line that has fewer than 8 fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinePolicy {
    /// Fail the whole parse
    #[default]
    Abort,
    /// Drop the line and keep going
    Skip,
}

/// Parse a full CLUSTER NODES reply. Output order follows input lines;
/// blank lines are ignored.
pub fn parse_cluster_nodes(text: &str, policy: LinePolicy) -> Result<Vec<ClusterNode>, ParseError> {
    let mut nodes = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match parse_cluster_node_line(line) {
            Ok(node) => nodes.push(node),
            Err(ParseError::ClusterNodeLine { fields, .. }) if policy == LinePolicy::Skip => {
                warn!("Skipping CLUSTER NODES line {} with {} fields", idx + 1, fields);
            }
            Err(ParseError::ClusterNodeLine { fields, .. }) => {
                return Err(ParseError::ClusterNodeLine {
                    line: idx + 1,
                    fields,
                })
            }
            Err(e) => return Err(e),
        }
    }
    Ok(nodes)
}

/// Parse one line. The reported line number is 0; `parse_cluster_nodes`
/// fills in the real one.
pub fn parse_cluster_node_line(line: &str) -> Result<ClusterNode, ParseError> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < MIN_FIELDS {
        return Err(ParseError::ClusterNodeLine {
            line: 0,
            fields: parts.len(),
        });
    }

    let (host, port, bus_port) = parse_node_address(parts[1])?;
    let flags = parts[2].to_string();
    let master_id = match parts[3] {
        "-" => String::new(),
        id => id.to_string(),
    };

    let slot_range = parts.get(8).map(|s| s.to_string());
    let slots = parts[8..].iter().filter_map(|s| parse_slot_range(s)).collect();

    Ok(ClusterNode {
        node_id: parts[0].trim().to_string(),
        host,
        port,
        bus_port,
        role: NodeRole::from_flags(&flags),
        flags,
        master_id,
        link_state: parts[7].to_string(),
        slot_range,
        slots,
    })
}

/// Parse node address: `host:port`, `host:port@cport`, `host:port@cport,hostname`
fn parse_node_address(addr: &str) -> Result<(String, u16, Option<u16>), ParseError> {
    let invalid = || ParseError::NodeAddress(addr.to_string());

    let addr = addr.split(',').next().unwrap_or(addr);
    let (host_port, bus_port) = match addr.split_once('@') {
        Some((hp, cport)) => (hp, cport.parse().ok()),
        None => (addr, None),
    };

    let (host, port) = host_port.rsplit_once(':').ok_or_else(invalid)?;
    let port: u16 = port.parse().map_err(|_| invalid())?;
    Ok((host.to_string(), port, bus_port))
}

/// Parse slot token `0-5460` or `42`; importing/migrating markers are skipped
fn parse_slot_range(s: &str) -> Option<SlotRange> {
    if s.starts_with('[') {
        return None;
    }
    match s.split_once('-') {
        Some((start, end)) => Some(start.parse().ok()?..=end.parse().ok()?),
        None => {
            let slot: u16 = s.parse().ok()?;
            Some(slot..=slot)
        }
    }
}

/// Slot ownership snapshot used to route keyed commands
#[derive(Debug, Clone)]
pub struct ClusterTopology {
    nodes: Vec<ClusterNode>,
    slot_map: Vec<Option<usize>>,
}

impl ClusterTopology {
    pub fn from_nodes(nodes: Vec<ClusterNode>) -> Self {
        let mut slot_map = vec![None; SLOT_COUNT];
        for (idx, node) in nodes.iter().enumerate() {
            if !node.is_master() {
                continue;
            }
            for range in &node.slots {
                for slot in range.clone() {
                    if let Some(entry) = slot_map.get_mut(slot as usize) {
                        *entry = Some(idx);
                    }
                }
            }
        }
        Self { nodes, slot_map }
    }

    pub fn nodes(&self) -> &[ClusterNode] {
        &self.nodes
    }

    pub fn node_for_slot(&self, slot: u16) -> Option<&ClusterNode> {
        self.slot_map
            .get(slot as usize)
            .copied()
            .flatten()
            .map(|idx| &self.nodes[idx])
    }

    pub fn masters(&self) -> impl Iterator<Item = &ClusterNode> {
        self.nodes.iter().filter(|n| n.is_master())
    }

    /// Point `slot` at the node listening on `host:port` (after a MOVED reply).
    /// Returns false when that node is not part of the snapshot.
    pub fn reassign_slot(&mut self, slot: u16, host: &str, port: u16) -> bool {
        let Some(idx) = self
            .nodes
            .iter()
            .position(|n| n.host == host && n.port == port)
        else {
            return false;
        };
        if let Some(entry) = self.slot_map.get_mut(slot as usize) {
            *entry = Some(idx);
        }
        true
    }

    /// Hash slot for a key, honouring `{hash tags}`
    pub fn slot_for_key(key: &[u8]) -> u16 {
        let hashed = hash_tag(key).unwrap_or(key);
        crc16(hashed) % SLOT_COUNT as u16
    }
}

/// Contents of the first non-empty `{...}` section, if any
pub fn hash_tag(key: &[u8]) -> Option<&[u8]> {
    let start = key.iter().position(|&b| b == b'{')?;
    let len = key[start + 1..].iter().position(|&b| b == b'}')?;
    if len == 0 {
        return None;
    }
    Some(&key[start + 1..start + 1 + len])
}

/// CRC16/XMODEM as used for cluster slot calculation
fn crc16(data: &[u8]) -> u16 {
    let mut crc: u16 = 0;
    for &byte in data {
        crc ^= (byte as u16) << 8;
        for _ in 0..8 {
            if crc & 0x8000 != 0 {
                crc = (crc << 1) ^ 0x1021;
            } else {
                crc <<= 1;
            }
        }
    }
    crc
}

#[cfg(test)]
mod tests {
    use super::*;

    const NODES: &str = "\
07c37dfeb235213a872192d90877d0cd55635b91 127.0.0.1:30001@31001 myself,master - 0 1426238316232 1 connected 0-5460
e7d1eecce10fd6bb5eb35b9f99a514335d9ba9ca 127.0.0.1:30002@31002 master - 0 1426238316232 2 connected 5461-10922 [10923->-67ed2db8d677e59ec4a4cefb06858cf2a1a89fa1]
67ed2db8d677e59ec4a4cefb06858cf2a1a89fa1 127.0.0.1:30003@31003 master - 0 1426238316232 3 connected 10923-16383
292f8b365bb7edb5e285caf0b7e6ddc7265d2f4f 127.0.0.1:30004@31004 slave 07c37dfeb235213a872192d90877d0cd55635b91 0 1426238316232 1 connected
";

    #[test]
    fn test_parse_master_line() {
        let node = parse_cluster_node_line(
            "abc123 127.0.0.1:7000@17000 master - 0 0 1 connected 0-5460",
        )
        .unwrap();

        assert_eq!(node.node_id, "abc123");
        assert_eq!(node.host, "127.0.0.1");
        assert_eq!(node.port, 7000);
        assert_eq!(node.bus_port, Some(17000));
        assert_eq!(node.role, NodeRole::Master);
        assert_eq!(node.master_id, "");
        assert_eq!(node.link_state, "connected");
        assert_eq!(node.slot_range.as_deref(), Some("0-5460"));
        assert_eq!(node.slots, vec![0..=5460]);
    }

    #[test]
    fn test_parse_replica_line() {
        let nodes = parse_cluster_nodes(NODES, LinePolicy::Abort).unwrap();
        let replica = &nodes[3];

        assert_eq!(replica.role, NodeRole::Slave);
        assert_eq!(replica.master_id, "07c37dfeb235213a872192d90877d0cd55635b91");
        assert_eq!(replica.slot_range, None);
        assert!(replica.slots.is_empty());
    }

    #[test]
    fn test_output_follows_input_order() {
        let nodes = parse_cluster_nodes(NODES, LinePolicy::Abort).unwrap();
        let ports: Vec<u16> = nodes.iter().map(|n| n.port).collect();
        assert_eq!(ports, vec![30001, 30002, 30003, 30004]);
        assert_eq!(nodes[0].flags, "myself,master");
    }

    #[test]
    fn test_only_first_slot_token_is_displayed() {
        let nodes = parse_cluster_nodes(NODES, LinePolicy::Abort).unwrap();
        assert_eq!(nodes[1].slot_range.as_deref(), Some("5461-10922"));
        assert_eq!(nodes[1].slots, vec![5461..=10922]);
    }

    #[test]
    fn test_unknown_role() {
        let node = parse_cluster_node_line("id 10.0.0.9:7000@17000 handshake - 0 0 0 disconnected")
            .unwrap();
        assert_eq!(node.role, NodeRole::Unknown);
        assert_eq!(node.link_state, "disconnected");
    }

    #[test]
    fn test_short_line_aborts() {
        let text = "abc 127.0.0.1:7000@17000 master - 0 0 1 connected 0-100\nbroken line here\n";
        match parse_cluster_nodes(text, LinePolicy::Abort) {
            Err(ParseError::ClusterNodeLine { line, fields }) => {
                assert_eq!(line, 2);
                assert_eq!(fields, 3);
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_short_line_skipped() {
        let text = "abc 127.0.0.1:7000@17000 master - 0 0 1 connected 0-100\nbroken line here\n";
        let nodes = parse_cluster_nodes(text, LinePolicy::Skip).unwrap();
        assert_eq!(nodes.len(), 1);
    }

    #[test]
    fn test_parse_node_address_variants() {
        assert_eq!(
            parse_node_address("10.0.0.1:6379@16379,cache.example.com").unwrap(),
            ("10.0.0.1".to_string(), 6379, Some(16379))
        );
        assert_eq!(
            parse_node_address("127.0.0.1:6379").unwrap(),
            ("127.0.0.1".to_string(), 6379, None)
        );
        assert!(parse_node_address("nonsense").is_err());
    }

    #[test]
    fn test_slot_map() {
        let nodes = parse_cluster_nodes(NODES, LinePolicy::Abort).unwrap();
        let topology = ClusterTopology::from_nodes(nodes);

        assert_eq!(topology.node_for_slot(0).unwrap().port, 30001);
        assert_eq!(topology.node_for_slot(10922).unwrap().port, 30002);
        assert_eq!(topology.node_for_slot(16383).unwrap().port, 30003);
        assert_eq!(topology.masters().count(), 3);
    }

    #[test]
    fn test_reassign_slot() {
        let nodes = parse_cluster_nodes(NODES, LinePolicy::Abort).unwrap();
        let mut topology = ClusterTopology::from_nodes(nodes);

        assert!(topology.reassign_slot(0, "127.0.0.1", 30003));
        assert_eq!(topology.node_for_slot(0).unwrap().port, 30003);
        assert!(!topology.reassign_slot(0, "10.9.9.9", 1));
    }

    #[test]
    fn test_crc16() {
        // Known test vector: "123456789" -> 0x31C3
        assert_eq!(crc16(b"123456789"), 0x31C3);
    }

    #[test]
    fn test_hash_tags() {
        assert_eq!(
            ClusterTopology::slot_for_key(b"{user1000}.following"),
            ClusterTopology::slot_for_key(b"{user1000}.followers")
        );
        assert_eq!(hash_tag(b"foo{}{bar}"), None);
        assert_eq!(hash_tag(b"{a}*"), Some(&b"a"[..]));
    }
}
