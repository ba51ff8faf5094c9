//! Standalone topology from INFO replication
//!
//! Master view:
//! ```text
//! role:master
//! connected_slaves:2
//! slave0:ip=127.0.0.1,port=8801,state=online,offset=152173185,lag=1
//! slave1:ip=127.0.0.1,port=8802,state=online,offset=152173185,lag=1
//! ```
//!
//! Replica view:
//! ```text
//! role:slave
//! master_host:127.0.0.1
//! master_port:8800
//! master_link_status:up
//! ```

use tracing::debug;

use super::node::{NodeRole, ReplicationNode};
use crate::client::connector::{self, Dialer};
use crate::client::control_plane::{ControlPlane, ControlPlaneExt};
use crate::config::{ClientConfig, Endpoint, EndpointSet};
use crate::utils::{ParseError, Result};

/// `key:value` lines of an INFO reply, in reply order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InfoMap {
    entries: Vec<(String, String)>,
}

impl InfoMap {
    /// Section headers (`# Replication`), blank lines and lines without a
    /// colon are ignored. Only the first colon splits key from value.
    pub fn parse(text: &str) -> Self {
        let entries = text
            .lines()
            .map(|line| line.trim_end_matches('\r'))
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .filter_map(|line| line.split_once(':'))
            .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
            .collect();
        Self { entries }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn role(&self) -> NodeRole {
        self.get("role").map(NodeRole::from_info).unwrap_or(NodeRole::Unknown)
    }

    /// `master_host`/`master_port` as reported by a replica
    pub fn master_endpoint(&self) -> std::result::Result<Endpoint, ParseError> {
        let host = self
            .get("master_host")
            .filter(|h| !h.is_empty())
            .ok_or_else(|| ParseError::ReplicationInfo("replica without master_host".into()))?;
        let port = self
            .get("master_port")
            .and_then(|p| p.parse::<u16>().ok())
            .ok_or_else(|| ParseError::ReplicationInfo("replica without valid master_port".into()))?;
        Endpoint::new(host, port).map_err(ParseError::ReplicationInfo)
    }
}

/// `slave0`, `slave1`, ... but not `slave_read_only` or `slave_repl_offset`
fn is_replica_key(key: &str) -> bool {
    key.strip_prefix("slave")
        .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
}

/// Replica entries of a master's INFO replication, in reply order.
///
/// An entry with fewer than two comma-separated fields ends the walk; the
/// replicas collected before it are returned.
pub fn parse_replicas(info: &InfoMap) -> Vec<ReplicationNode> {
    let mut replicas = Vec::new();

    for (key, value) in info.iter().filter(|(k, _)| is_replica_key(k)) {
        let fields: Vec<&str> = value.split(',').collect();
        if fields.len() < 2 {
            debug!("Malformed replica entry {}:{}, stopping", key, value);
            break;
        }

        let mut ip = None;
        let mut port = None;
        for (k, v) in fields.iter().filter_map(|f| f.split_once('=')) {
            match k {
                "ip" => ip = Some(v),
                "port" => port = Some(v),
                _ => {}
            }
        }

        match (ip.filter(|s| !s.is_empty()), port.and_then(|p| p.parse::<u16>().ok())) {
            (Some(ip), Some(port)) => replicas.push(ReplicationNode::new(ip, port, NodeRole::Slave)),
            _ => debug!("Replica entry {} lacks ip/port, ignored", key),
        }
    }

    replicas
}

/// Resolve the master/replica group that `queried` belongs to.
///
/// When the queried node is a replica, one new connection is opened to the
/// master it reports (same credentials) and that node's view is used; the
/// connection is closed once read. The
/// redirect is not followed further even if the master also claims to be a
/// replica.
pub fn resolve_topology<C, D>(
    conn: &mut C,
    queried: &Endpoint,
    dialer: &D,
    config: &ClientConfig,
) -> Result<Vec<ReplicationNode>>
where
    C: ControlPlane + ?Sized,
    D: Dialer,
{
    let info = conn.info(Some("replication"))?;

    let (master, info) = if info.role() == NodeRole::Slave {
        let master = info.master_endpoint()?;
        debug!("{} is a replica, reading topology from master {}", queried, master);

        let endpoints: EndpointSet = std::iter::once(master.clone()).collect();
        let mut established = connector::connect(dialer, &config.with_endpoints(endpoints))?;
        let master_info = established.conn.info(Some("replication"));
        established.conn.close();
        (master, master_info?)
    } else {
        (queried.clone(), info)
    };

    let mut nodes = vec![ReplicationNode::new(master.host, master.port, NodeRole::Master)];
    nodes.extend(parse_replicas(&info));
    Ok(nodes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::connector::mock::MockDialer;
    use crate::client::control_plane::mock::{bulk, MockControlPlane};
    use crate::config::Credentials;
    use crate::utils::{AdminError, RespValue};

    const MASTER_INFO: &str = "# Replication\r\n\
role:master\r\n\
connected_slaves:2\r\n\
slave0:ip=127.0.0.1,port=8801,state=online,offset=152173185,lag=1\r\n\
slave1:ip=127.0.0.1,port=8802,state=online,offset=152173185,lag=1\r\n\
master_failover_state:no-failover\r\n\
master_repl_offset:152173185\r\n";

    const REPLICA_INFO: &str = "# Replication\r\n\
role:slave\r\n\
master_host:10.0.0.1\r\n\
master_port:6379\r\n\
master_link_status:up\r\n\
slave_read_only:1\r\n\
slave_repl_offset:100\r\n";

    fn config() -> ClientConfig {
        ClientConfig::new(
            std::iter::once("10.0.0.2:6380".parse().unwrap()).collect(),
            Credentials {
                password: Some("pw".into()),
                client_name: None,
            },
        )
    }

    #[test]
    fn test_info_map() {
        let info = InfoMap::parse(MASTER_INFO);
        assert_eq!(info.get("role"), Some("master"));
        assert_eq!(info.get("connected_slaves"), Some("2"));
        assert_eq!(info.get("# Replication"), None);
    }

    #[test]
    fn test_replica_keys() {
        assert!(is_replica_key("slave0"));
        assert!(is_replica_key("slave12"));
        assert!(!is_replica_key("slave_read_only"));
        assert!(!is_replica_key("connected_slaves"));
        assert!(!is_replica_key("slave"));
    }

    #[test]
    fn test_master_topology() {
        let endpoint: Endpoint = "127.0.0.1:8800".parse().unwrap();
        let mut conn = MockControlPlane::new(vec![bulk(MASTER_INFO)]);
        let dialer = MockDialer::default();

        let nodes = resolve_topology(&mut conn, &endpoint, &dialer, &config()).unwrap();

        assert_eq!(
            nodes,
            vec![
                ReplicationNode::new("127.0.0.1", 8800, NodeRole::Master),
                ReplicationNode::new("127.0.0.1", 8801, NodeRole::Slave),
                ReplicationNode::new("127.0.0.1", 8802, NodeRole::Slave),
            ]
        );
        assert!(dialer.dialed.borrow().is_empty());
    }

    #[test]
    fn test_replica_redirects_to_master() {
        let endpoint: Endpoint = "10.0.0.2:6380".parse().unwrap();
        let mut conn = MockControlPlane::new(vec![bulk(REPLICA_INFO)]);
        let master_info = "role:master\nslave0:ip=10.0.0.2,port=6380,state=online\n";
        let dialer = MockDialer::default().with(
            "10.0.0.1:6379",
            MockControlPlane::new(vec![
                RespValue::SimpleString("OK".into()),
                RespValue::SimpleString("PONG".into()),
                bulk(master_info),
            ]),
        );

        let nodes = resolve_topology(&mut conn, &endpoint, &dialer, &config()).unwrap();

        assert_eq!(nodes[0], ReplicationNode::new("10.0.0.1", 6379, NodeRole::Master));
        assert_eq!(nodes[1], ReplicationNode::new("10.0.0.2", 6380, NodeRole::Slave));
        assert_eq!(*dialer.dialed.borrow(), vec!["10.0.0.1:6379"]);
    }

    #[test]
    fn test_redirect_is_one_hop() {
        let endpoint: Endpoint = "10.0.0.2:6380".parse().unwrap();
        let mut conn = MockControlPlane::new(vec![bulk(REPLICA_INFO)]);
        let stale = "role:slave\nmaster_host:10.0.0.9\nmaster_port:6379\n";
        let dialer = MockDialer::default().with(
            "10.0.0.1:6379",
            MockControlPlane::new(vec![
                RespValue::SimpleString("OK".into()),
                RespValue::SimpleString("PONG".into()),
                bulk(stale),
            ]),
        );

        let nodes = resolve_topology(&mut conn, &endpoint, &dialer, &config()).unwrap();
        assert_eq!(nodes, vec![ReplicationNode::new("10.0.0.1", 6379, NodeRole::Master)]);
        assert_eq!(dialer.dialed.borrow().len(), 1);
    }

    #[test]
    fn test_replica_without_master_host() {
        let endpoint: Endpoint = "10.0.0.2:6380".parse().unwrap();
        let mut conn = MockControlPlane::new(vec![bulk("role:slave\n")]);
        let err = resolve_topology(&mut conn, &endpoint, &MockDialer::default(), &config())
            .unwrap_err();
        assert!(matches!(err, AdminError::Parse(ParseError::ReplicationInfo(_))));
    }

    #[test]
    fn test_malformed_replica_truncates() {
        let info = InfoMap::parse(
            "role:master\n\
slave0:ip=10.0.0.3,port=7001,state=online\n\
slave1:garbage\n\
slave2:ip=10.0.0.5,port=7003,state=online\n",
        );
        let replicas = parse_replicas(&info);
        assert_eq!(replicas, vec![ReplicationNode::new("10.0.0.3", 7001, NodeRole::Slave)]);
    }
}
