//! Slot-routed client for sharded clusters
//!
//! The seed connection comes from the endpoint failover. Its CLUSTER NODES
//! view gives the slot map; keyed commands go to the master owning the key's
//! slot over a lazily opened per-node connection.
//!
//! Redirects are followed once:
//! - `MOVED`: the slot map is updated and the command re-sent to the new owner
//! - `ASK`: the command is re-sent to the indicated node after `ASKING`,
//!   the slot map is left alone

use std::collections::HashMap;
use std::io;

use tracing::{debug, info};

use super::connector::{self, Dialer, Established, TcpDialer};
use super::control_plane::{ControlPlane, ControlPlaneExt, Deployment};
use crate::config::{ClientConfig, Endpoint, EndpointSet};
use crate::topology::{parse_cluster_nodes, ClusterNode, ClusterTopology, LinePolicy};
use crate::topology::cluster_nodes::hash_tag;
use crate::utils::{AdminError, ConnectionError, RespValue, Result};

/// Commands without a key argument; always sent to the seed node
const KEYLESS: &[&str] = &[
    "ASKING", "AUTH", "CLIENT", "CLUSTER", "DBSIZE", "ECHO", "INFO", "PING", "QUIT", "SELECT",
];

pub struct ClusterClient<D: Dialer = TcpDialer> {
    dialer: D,
    config: ClientConfig,
    seed: Established<D::Conn>,
    topology: ClusterTopology,
    /// Node connections other than the seed, keyed by `host:port`
    pool: HashMap<String, D::Conn>,
}

impl ClusterClient<TcpDialer> {
    pub fn connect(config: ClientConfig) -> Result<Self> {
        Self::connect_with(config, TcpDialer)
    }
}

impl<D: Dialer> ClusterClient<D> {
    pub fn connect_with(config: ClientConfig, dialer: D) -> Result<Self> {
        let mut seed = connector::connect(&dialer, &config)?;
        let nodes = parse_cluster_nodes(&seed.conn.cluster_nodes()?, LinePolicy::Abort)?;
        let topology = ClusterTopology::from_nodes(nodes);
        info!(
            "Cluster seed {} reports {} nodes ({} masters)",
            seed.endpoint,
            topology.nodes().len(),
            topology.masters().count()
        );

        Ok(Self {
            dialer,
            config,
            seed,
            topology,
            pool: HashMap::new(),
        })
    }

    /// Seed endpoint that answered the probe
    pub fn endpoint(&self) -> &Endpoint {
        &self.seed.endpoint
    }

    pub fn topology(&self) -> &ClusterTopology {
        &self.topology
    }

    /// Fresh CLUSTER NODES listing from the seed; also refreshes the slot map
    pub fn cluster_nodes(&mut self) -> Result<Vec<ClusterNode>> {
        let text = ControlPlaneExt::cluster_nodes(&mut self.seed.conn)?;
        let nodes = parse_cluster_nodes(&text, LinePolicy::Abort)?;
        self.topology = ClusterTopology::from_nodes(nodes.clone());
        Ok(nodes)
    }

    /// Node owning the routing key of `args`; `None` means the seed
    fn target_for(&self, args: &[&str]) -> Option<Endpoint> {
        let key = routing_key(args)?;
        let node = self
            .topology
            .node_for_slot(ClusterTopology::slot_for_key(key.as_bytes()))?;
        if node.host.is_empty() {
            // `myself` before the node learned its own address
            return None;
        }
        Some(Endpoint {
            host: node.host.clone(),
            port: node.port,
        })
    }

    /// Seed or pooled connection for `endpoint`, opening it on first use with
    /// the client's credentials. Connect failures keep their own error kind.
    fn node_conn(&mut self, endpoint: Option<&Endpoint>) -> Result<&mut D::Conn> {
        let endpoint = match endpoint {
            Some(ep) if *ep != self.seed.endpoint => ep,
            _ => return Ok(&mut self.seed.conn),
        };

        let key = endpoint.to_string();
        if !self.pool.contains_key(&key) {
            let single: EndpointSet = std::iter::once(endpoint.clone()).collect();
            let established = connector::connect(&self.dialer, &self.config.with_endpoints(single))?;
            debug!("Opened connection to cluster node {}", key);
            self.pool.insert(key.clone(), established.conn);
        }
        self.pool
            .get_mut(&key)
            .ok_or(AdminError::Connection(ConnectionError::Closed))
    }

    fn send(&mut self, endpoint: Option<&Endpoint>, args: &[&str], asking: bool) -> Result<RespValue> {
        let conn = self.node_conn(endpoint)?;
        if asking {
            conn.execute(&["ASKING"])?;
        }
        Ok(conn.execute(args)?)
    }

    fn route_and_send(&mut self, args: &[&str]) -> Result<RespValue> {
        let target = self.target_for(args);
        let reply = self.send(target.as_ref(), args, false)?;

        let Some((is_ask, slot, host, port)) = reply.redirect() else {
            return Ok(reply);
        };
        let redirected = Endpoint { host, port };
        if is_ask {
            debug!("ASK redirect for slot {} to {}", slot, redirected);
        } else {
            debug!("MOVED slot {} to {}", slot, redirected);
            if !self.topology.reassign_slot(slot, &redirected.host, redirected.port) {
                debug!("{} is not in the known topology", redirected);
            }
        }
        self.send(Some(&redirected), args, is_ask)
    }
}

impl<D: Dialer> ControlPlane for ClusterClient<D> {
    /// Errors other than plain transport failures (a node rejecting AUTH,
    /// an unreachable node) travel inside the `io::Error` and come back out
    /// unchanged when converted to `AdminError`.
    fn execute(&mut self, args: &[&str]) -> io::Result<RespValue> {
        self.route_and_send(args).map_err(io::Error::other)
    }

    fn deployment(&self) -> Deployment {
        Deployment::Cluster
    }

    /// Close every pooled node connection, then the seed
    fn close(&mut self) {
        debug!("Closing {} cluster node connections", self.pool.len() + 1);
        for conn in self.pool.values_mut() {
            conn.close();
        }
        self.seed.conn.close();
    }
}

/// Key used for slot routing: the MATCH pattern for SCAN when it carries a
/// hash tag, otherwise the first argument of keyed commands
fn routing_key<'a>(args: &[&'a str]) -> Option<&'a str> {
    let verb = args.first()?;
    if verb.eq_ignore_ascii_case("SCAN") {
        let idx = args.iter().position(|a| a.eq_ignore_ascii_case("MATCH"))?;
        let pattern = *args.get(idx + 1)?;
        return hash_tag(pattern.as_bytes()).map(|_| pattern);
    }
    if KEYLESS.iter().any(|k| verb.eq_ignore_ascii_case(k)) {
        return None;
    }
    args.get(1).copied()
}
