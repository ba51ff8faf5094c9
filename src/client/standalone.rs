//! Single-connection client for standalone and master/replica deployments

use std::io;

use tracing::debug;

use super::connector::{self, Dialer, Established, TcpDialer};
use super::control_plane::{ControlPlane, Deployment};
use crate::config::{ClientConfig, Endpoint};
use crate::topology::{resolve_topology, ReplicationNode};
use crate::utils::{RespValue, Result};

/// Owns the one connection chosen by endpoint failover. The connection is
/// never re-established implicitly; a lost connection surfaces as
/// `ConnectionError::Lost` on the next call.
pub struct StandaloneClient<D: Dialer = TcpDialer> {
    dialer: D,
    config: ClientConfig,
    endpoint: Endpoint,
    conn: D::Conn,
}

impl StandaloneClient<TcpDialer> {
    pub fn connect(config: ClientConfig) -> Result<Self> {
        Self::connect_with(config, TcpDialer)
    }
}

impl<D: Dialer> StandaloneClient<D> {
    pub fn connect_with(config: ClientConfig, dialer: D) -> Result<Self> {
        let Established { endpoint, conn } = connector::connect(&dialer, &config)?;
        Ok(Self {
            dialer,
            config,
            endpoint,
            conn,
        })
    }

    /// Endpoint that answered the probe
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Master first, then its replicas. A replica redirects once to its master.
    pub fn replication_nodes(&mut self) -> Result<Vec<ReplicationNode>> {
        resolve_topology(&mut self.conn, &self.endpoint, &self.dialer, &self.config)
    }
}

impl<D: Dialer> ControlPlane for StandaloneClient<D> {
    fn execute(&mut self, args: &[&str]) -> io::Result<RespValue> {
        self.conn.execute(args)
    }

    fn deployment(&self) -> Deployment {
        Deployment::Standalone
    }

    fn close(&mut self) {
        debug!("Closing connection to {}", self.endpoint);
        self.conn.close();
    }
}
