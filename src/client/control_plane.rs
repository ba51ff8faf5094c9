//! Control plane trait for server communication
//!
//! `ControlPlane` is the one seam between this crate and the wire: everything
//! above it (dispatch, auto-query, topology) only builds argument lists and
//! interprets replies. Implementations:
//! - `RawConnection`: a single TCP connection with the RESP codec
//! - `StandaloneClient`: the connection picked by the endpoint failover
//! - `ClusterClient`: slot-routed connections to every cluster master

use std::io;

use crate::topology::{InfoMap, NodeRole};
use crate::utils::{AdminError, RespValue, Result};

/// Deployment topology behind a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deployment {
    /// Single node or master/replica group; supports SELECT
    Standalone,
    /// Sharded cluster; only database 0 exists
    Cluster,
}

/// Control plane operations trait
pub trait ControlPlane {
    /// Execute a command with string arguments
    ///
    /// # Example
    /// ```ignore
    /// let response = conn.execute(&["HGET", "user:1", "name"])?;
    /// ```
    fn execute(&mut self, args: &[&str]) -> io::Result<RespValue>;

    fn deployment(&self) -> Deployment {
        Deployment::Standalone
    }

    /// Release the connection: send QUIT and ignore the outcome, the server
    /// may already be gone. Later calls fail with a lost connection.
    fn close(&mut self) {
        let _ = self.execute(&["QUIT"]);
    }
}

/// Extension trait with the introspection and session commands used by the
/// connection strategy, auto-query, topology resolver and console.
pub trait ControlPlaneExt: ControlPlane {
    /// Send PING and check for PONG
    fn ping(&mut self) -> io::Result<bool> {
        match self.execute(&["PING"])? {
            RespValue::SimpleString(s) => Ok(s.eq_ignore_ascii_case("PONG")),
            _ => Ok(false),
        }
    }

    /// Send AUTH. An error reply is an `Authentication` failure, an I/O
    /// failure is a lost connection.
    fn authenticate(&mut self, password: &str) -> Result<()> {
        match self.execute(&["AUTH", password])? {
            RespValue::SimpleString(s) if s == "OK" => Ok(()),
            RespValue::Error(e) => Err(AdminError::Authentication(e)),
            other => Err(AdminError::unexpected("AUTH", &other)),
        }
    }

    fn client_setname(&mut self, name: &str) -> Result<()> {
        expect_ok(self.execute(&["CLIENT", "SETNAME", name])?, "CLIENT SETNAME")
    }

    fn select_db(&mut self, db: u32) -> Result<()> {
        let db_str = db.to_string();
        expect_ok(self.execute(&["SELECT", &db_str])?, "SELECT")
    }

    /// INFO for one section, or the default sections when `None`
    fn info(&mut self, section: Option<&str>) -> Result<InfoMap> {
        let response = match section {
            Some(section) => self.execute(&["INFO", section])?,
            None => self.execute(&["INFO"])?,
        };
        expect_text(response, "INFO").map(|text| InfoMap::parse(&text))
    }

    /// CLUSTER INFO (`cluster_state`, `cluster_slots_assigned`, ...)
    fn cluster_info(&mut self) -> Result<InfoMap> {
        expect_text(self.execute(&["CLUSTER", "INFO"])?, "CLUSTER INFO").map(|text| InfoMap::parse(&text))
    }

    fn cluster_nodes(&mut self) -> Result<String> {
        expect_text(self.execute(&["CLUSTER", "NODES"])?, "CLUSTER NODES")
    }

    /// Replication role as reported by `INFO replication`
    fn role(&mut self) -> Result<NodeRole> {
        Ok(self.info(Some("replication"))?.role())
    }

    /// TYPE of a key (`none` when absent)
    fn key_type(&mut self, key: &str) -> Result<String> {
        expect_text(self.execute(&["TYPE", key])?, "TYPE")
    }

    /// TTL of a key in seconds (-1 no expiry, -2 absent)
    fn ttl(&mut self, key: &str) -> Result<i64> {
        expect_integer(self.execute(&["TTL", key])?, "TTL")
    }

    /// Number of keys in the selected database
    fn dbsize(&mut self) -> Result<i64> {
        expect_integer(self.execute(&["DBSIZE"])?, "DBSIZE")
    }

    /// How many of `keys` exist; a key named twice counts twice
    fn exists(&mut self, keys: &[&str]) -> Result<i64> {
        keyed_count(self, "EXISTS", keys)
    }

    /// Delete `keys`, returning how many were removed
    fn del(&mut self, keys: &[&str]) -> Result<i64> {
        keyed_count(self, "DEL", keys)
    }
}

// Blanket implementation: any ControlPlane automatically gets ControlPlaneExt
impl<T: ControlPlane + ?Sized> ControlPlaneExt for T {}

fn keyed_count<C: ControlPlane + ?Sized>(conn: &mut C, command: &str, keys: &[&str]) -> Result<i64> {
    if keys.is_empty() {
        return Err(AdminError::MalformedCommand(format!(
            "{} requires at least one key",
            command
        )));
    }
    let mut args = Vec::with_capacity(keys.len() + 1);
    args.push(command);
    args.extend_from_slice(keys);
    expect_integer(conn.execute(&args)?, command)
}

fn expect_ok(response: RespValue, command: &str) -> Result<()> {
    match response {
        RespValue::SimpleString(s) if s == "OK" => Ok(()),
        RespValue::Error(e) => Err(AdminError::Store(e)),
        other => Err(AdminError::unexpected(command, &other)),
    }
}

fn expect_integer(response: RespValue, command: &str) -> Result<i64> {
    match response {
        RespValue::Integer(n) => Ok(n),
        RespValue::Error(e) => Err(AdminError::Store(e)),
        other => Err(AdminError::unexpected(command, &other)),
    }
}

fn expect_text(response: RespValue, command: &str) -> Result<String> {
    match response {
        RespValue::Error(e) => Err(AdminError::Store(e)),
        other => other
            .to_text()
            .ok_or_else(|| AdminError::unexpected(command, &other)),
    }
}


#[cfg(test)]
mod tests {
    use super::mock::*;
    use super::*;

    #[test]
    fn test_ping() {
        let mut mock = MockControlPlane::new(vec![RespValue::SimpleString("PONG".into())]);
        assert!(mock.ping().unwrap());
    }

    #[test]
    fn test_auth_rejection_is_authentication_error() {
        let mut mock = MockControlPlane::new(vec![RespValue::Error(
            "WRONGPASS invalid username-password pair".into(),
        )]);
        assert!(matches!(
            mock.authenticate("nope"),
            Err(AdminError::Authentication(_))
        ));
    }

    #[test]
    fn test_auth_io_failure_is_connection_error() {
        let mut mock = MockControlPlane::default();
        mock.push_io_error(io::ErrorKind::ConnectionReset);
        assert!(matches!(
            mock.authenticate("pw"),
            Err(AdminError::Connection(_))
        ));
    }

    #[test]
    fn test_select_and_ttl() {
        let mut mock = MockControlPlane::new(vec![ok(), RespValue::Integer(-1)]);
        mock.select_db(3).unwrap();
        assert_eq!(mock.ttl("k").unwrap(), -1);
        assert_eq!(mock.calls[0], vec!["SELECT", "3"]);
    }

    #[test]
    fn test_select_error_reply() {
        let mut mock = MockControlPlane::new(vec![RespValue::Error(
            "ERR DB index is out of range".into(),
        )]);
        assert!(matches!(mock.select_db(99), Err(AdminError::Store(_))));
    }

    #[test]
    fn test_dbsize() {
        let mut mock = MockControlPlane::new(vec![RespValue::Integer(12345)]);
        assert_eq!(mock.dbsize().unwrap(), 12345);
    }

    #[test]
    fn test_info_section_and_default() {
        let mut mock = MockControlPlane::new(vec![
            bulk("# Keyspace\r\ndb0:keys=3,expires=0,avg_ttl=0\r\n"),
            bulk("# Server\r\nredis_version:7.2.4\r\n"),
        ]);
        let keyspace = mock.info(Some("keyspace")).unwrap();
        assert_eq!(keyspace.get("db0"), Some("keys=3,expires=0,avg_ttl=0"));
        let default = mock.info(None).unwrap();
        assert_eq!(default.get("redis_version"), Some("7.2.4"));
        assert_eq!(mock.calls[0], vec!["INFO", "keyspace"]);
        assert_eq!(mock.calls[1], vec!["INFO"]);
    }

    #[test]
    fn test_cluster_info() {
        let mut mock = MockControlPlane::new(vec![bulk(
            "cluster_state:ok\r\ncluster_slots_assigned:16384\r\ncluster_known_nodes:6\r\n",
        )]);
        let info = mock.cluster_info().unwrap();
        assert_eq!(info.get("cluster_state"), Some("ok"));
        assert_eq!(info.get("cluster_known_nodes"), Some("6"));
        assert_eq!(mock.calls[0], vec!["CLUSTER", "INFO"]);
    }

    #[test]
    fn test_cluster_info_disabled() {
        let mut mock = MockControlPlane::new(vec![RespValue::Error(
            "ERR This instance has cluster support disabled".into(),
        )]);
        assert!(matches!(mock.cluster_info(), Err(AdminError::Store(_))));
    }

    #[test]
    fn test_role() {
        let mut mock = MockControlPlane::new(vec![
            bulk("# Replication\r\nrole:master\r\nconnected_slaves:0\r\n"),
            bulk("# Replication\r\nrole:slave\r\nmaster_host:10.0.0.1\r\n"),
            bulk("# Replication\r\n"),
            RespValue::Integer(1),
        ]);
        assert_eq!(mock.role().unwrap(), NodeRole::Master);
        assert_eq!(mock.role().unwrap(), NodeRole::Slave);
        assert_eq!(mock.role().unwrap(), NodeRole::Unknown);
        assert!(matches!(mock.role(), Err(AdminError::Protocol(_))));
        assert_eq!(mock.calls[0], vec!["INFO", "replication"]);
    }

    #[test]
    fn test_exists_and_del() {
        let mut mock = MockControlPlane::new(vec![RespValue::Integer(2), RespValue::Integer(1)]);
        assert_eq!(mock.exists(&["a", "b", "a"]).unwrap(), 2);
        assert_eq!(mock.del(&["a"]).unwrap(), 1);
        assert_eq!(mock.calls[0], vec!["EXISTS", "a", "b", "a"]);
        assert_eq!(mock.calls[1], vec!["DEL", "a"]);
    }

    #[test]
    fn test_keyed_count_needs_keys() {
        let mut mock = MockControlPlane::default();
        assert!(matches!(mock.del(&[]), Err(AdminError::MalformedCommand(_))));
        assert!(mock.calls.is_empty());
    }

    #[test]
    fn test_close_sends_quit() {
        let mut mock = MockControlPlane::new(vec![ok()]);
        mock.close();
        assert_eq!(mock.verbs(), vec!["QUIT"]);

        // Nothing scripted: the failure is swallowed
        mock.close();
        assert_eq!(mock.verbs(), vec!["QUIT", "QUIT"]);
    }
}
