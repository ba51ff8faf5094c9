//! Topology discovery
//!
//! - Standalone groups: INFO replication, with a one-hop redirect from a
//!   replica to its master
//! - Clusters: CLUSTER NODES parsing and slot mapping

pub mod cluster_nodes;
pub mod node;
pub mod replication;

pub use cluster_nodes::{parse_cluster_nodes, ClusterTopology, LinePolicy};
pub use node::{ClusterNode, NodeRole, ReplicationNode, SlotRange};
pub use replication::{parse_replicas, resolve_topology, InfoMap};
