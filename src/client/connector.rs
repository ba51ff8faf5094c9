//! Multi-endpoint connection strategy
//!
//! Endpoints are tried in insertion order. Each attempt dials, authenticates
//! (when a password is configured), names the session (when a client name is
//! configured) and finally probes with PING. The first endpoint that answers
//! the probe wins.
//!
//! Failure handling per attempt:
//! - dial failure, I/O failure at any later step, or a non-PONG probe:
//!   move on to the next endpoint
//! - AUTH explicitly rejected by a reachable server: fail immediately,
//!   remaining endpoints are not tried

use std::time::Duration;

use tracing::{debug, info};

use super::control_plane::{ControlPlane, ControlPlaneExt};
use super::raw_connection::RawConnection;
use crate::config::{ClientConfig, Endpoint};
use crate::utils::{AdminError, ConnectionError, Result};

/// Opens transports to endpoints
pub trait Dialer {
    type Conn: ControlPlane;

    fn dial(
        &self,
        endpoint: &Endpoint,
        timeout: Duration,
    ) -> std::result::Result<Self::Conn, ConnectionError>;
}

/// Plain TCP dialer
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpDialer;

impl Dialer for TcpDialer {
    type Conn = RawConnection;

    fn dial(
        &self,
        endpoint: &Endpoint,
        timeout: Duration,
    ) -> std::result::Result<RawConnection, ConnectionError> {
        RawConnection::connect(endpoint, timeout)
    }
}

/// A probed connection together with the endpoint it belongs to
pub struct Established<C> {
    pub endpoint: Endpoint,
    pub conn: C,
}

/// Failover state
enum ProbeState<C> {
    Disconnected,
    Probing(usize),
    Connected(Established<C>),
    Exhausted,
}

/// Outcome of one endpoint attempt that did not produce a connection
enum AttemptError {
    /// Try the next endpoint
    Next(String),
    /// Stop the whole connect
    Fatal(AdminError),
}

/// Drives the failover state machine for one connect call
pub struct Connector<'a, D: Dialer> {
    dialer: &'a D,
    config: &'a ClientConfig,
    state: ProbeState<D::Conn>,
    attempted: usize,
    last_error: Option<String>,
}

impl<'a, D: Dialer> Connector<'a, D> {
    pub fn new(dialer: &'a D, config: &'a ClientConfig) -> Self {
        Self {
            dialer,
            config,
            state: ProbeState::Disconnected,
            attempted: 0,
            last_error: None,
        }
    }

    /// Run until a terminal state is reached
    pub fn connect(mut self) -> Result<Established<D::Conn>> {
        loop {
            match std::mem::replace(&mut self.state, ProbeState::Disconnected) {
                ProbeState::Connected(established) => return Ok(established),
                ProbeState::Exhausted => {
                    return Err(ConnectionError::AllEndpointsUnreachable {
                        attempted: self.attempted,
                        last_error: self
                            .last_error
                            .take()
                            .unwrap_or_else(|| "no endpoints configured".to_string()),
                    }
                    .into())
                }
                state => self.state = self.step(state)?,
            }
        }
    }

    fn step(&mut self, state: ProbeState<D::Conn>) -> Result<ProbeState<D::Conn>> {
        match state {
            ProbeState::Disconnected if self.config.endpoints.is_empty() => {
                Ok(ProbeState::Exhausted)
            }
            ProbeState::Disconnected => Ok(ProbeState::Probing(0)),
            ProbeState::Probing(index) => {
                let config = self.config;
                let Some(endpoint) = config.endpoints.get(index) else {
                    return Ok(ProbeState::Exhausted);
                };
                self.attempted += 1;

                match self.attempt(endpoint) {
                    Ok(conn) => {
                        info!("Connected to {}", endpoint);
                        Ok(ProbeState::Connected(Established {
                            endpoint: endpoint.clone(),
                            conn,
                        }))
                    }
                    Err(AttemptError::Next(reason)) => {
                        debug!("Endpoint {} unusable, trying next: {}", endpoint, reason);
                        self.last_error = Some(format!("{}: {}", endpoint, reason));
                        if index + 1 < config.endpoints.len() {
                            Ok(ProbeState::Probing(index + 1))
                        } else {
                            Ok(ProbeState::Exhausted)
                        }
                    }
                    Err(AttemptError::Fatal(e)) => Err(e),
                }
            }
            terminal => Ok(terminal),
        }
    }

    fn attempt(&self, endpoint: &Endpoint) -> std::result::Result<D::Conn, AttemptError> {
        let mut conn = self
            .dialer
            .dial(endpoint, self.config.timeout())
            .map_err(|e| AttemptError::Next(e.to_string()))?;

        let credentials = &self.config.credentials;
        if let Some(password) = credentials.password.as_deref().filter(|p| !p.is_empty()) {
            match conn.authenticate(password) {
                Ok(()) => {}
                Err(AdminError::Authentication(msg)) => {
                    return Err(AttemptError::Fatal(AdminError::Authentication(format!(
                        "{}: {}",
                        endpoint, msg
                    ))))
                }
                Err(e) => return Err(classify(e)),
            }
        }

        if let Some(name) = credentials.client_name.as_deref().filter(|n| !n.is_empty()) {
            conn.client_setname(name).map_err(classify)?;
        }

        match conn.ping() {
            Ok(true) => Ok(conn),
            Ok(false) => Err(AttemptError::Next("probe did not return PONG".to_string())),
            Err(e) => Err(AttemptError::Next(e.to_string())),
        }
    }
}

/// Connection-level failures fail over, anything else the server said is final
fn classify(e: AdminError) -> AttemptError {
    match e {
        AdminError::Connection(c) => AttemptError::Next(c.to_string()),
        other => AttemptError::Fatal(other),
    }
}

/// Connect to the first usable endpoint of `config`
pub fn connect<D: Dialer>(dialer: &D, config: &ClientConfig) -> Result<Established<D::Conn>> {
    Connector::new(dialer, config).connect()
}


#[cfg(test)]
mod tests {
    use std::io;

    use super::mock::MockDialer;
    use super::*;
    use crate::client::control_plane::mock::{ok, MockControlPlane};
    use crate::config::{Credentials, EndpointSet};
    use crate::utils::RespValue;

    fn pong() -> RespValue {
        RespValue::SimpleString("PONG".into())
    }

    fn config(endpoints: &[&str], password: Option<&str>) -> ClientConfig {
        let set: EndpointSet = endpoints.iter().map(|e| e.parse().unwrap()).collect();
        ClientConfig::new(
            set,
            Credentials {
                password: password.map(String::from),
                client_name: None,
            },
        )
    }

    #[test]
    fn test_first_reachable_endpoint_wins() {
        let dialer = MockDialer::default()
            .with("b:2", MockControlPlane::new(vec![pong()]))
            .with("c:3", MockControlPlane::new(vec![pong()]));
        let config = config(&["a:1", "b:2", "c:3"], None);

        let established = connect(&dialer, &config).unwrap();
        assert_eq!(established.endpoint.to_string(), "b:2");
        assert_eq!(*dialer.dialed.borrow(), vec!["a:1", "b:2"]);
    }

    #[test]
    fn test_all_unreachable() {
        let dialer = MockDialer::default();
        let config = config(&["a:1", "b:2"], None);

        match connect(&dialer, &config) {
            Err(AdminError::Connection(ConnectionError::AllEndpointsUnreachable {
                attempted, ..
            })) => assert_eq!(attempted, 2),
            other => panic!("unexpected: {:?}", other.map(|e| e.endpoint)),
        }
    }

    #[test]
    fn test_empty_endpoint_set() {
        let dialer = MockDialer::default();
        let config = config(&[], None);
        assert!(matches!(
            connect(&dialer, &config),
            Err(AdminError::Connection(ConnectionError::AllEndpointsUnreachable { attempted: 0, .. }))
        ));
    }

    #[test]
    fn test_failed_probe_moves_on() {
        let dialer = MockDialer::default()
            .with("a:1", MockControlPlane::new(vec![RespValue::Error("LOADING".into())]))
            .with("b:2", MockControlPlane::new(vec![pong()]));
        let config = config(&["a:1", "b:2"], None);

        assert_eq!(connect(&dialer, &config).unwrap().endpoint.port, 2);
    }

    #[test]
    fn test_auth_rejection_is_not_failed_over() {
        let dialer = MockDialer::default()
            .with(
                "a:1",
                MockControlPlane::new(vec![RespValue::Error("WRONGPASS".into())]),
            )
            .with("b:2", MockControlPlane::new(vec![ok(), pong()]));
        let config = config(&["a:1", "b:2"], Some("secret"));

        assert!(matches!(
            connect(&dialer, &config),
            Err(AdminError::Authentication(_))
        ));
        assert_eq!(*dialer.dialed.borrow(), vec!["a:1"]);
    }

    #[test]
    fn test_auth_io_failure_is_failed_over() {
        let mut dropped = MockControlPlane::default();
        dropped.push_io_error(io::ErrorKind::ConnectionReset);
        let dialer = MockDialer::default()
            .with("a:1", dropped)
            .with("b:2", MockControlPlane::new(vec![ok(), pong()]));
        let config = config(&["a:1", "b:2"], Some("secret"));

        let established = connect(&dialer, &config).unwrap();
        assert_eq!(established.endpoint.port, 2);
        assert_eq!(established.conn.calls[0], vec!["AUTH", "secret"]);
    }

    #[test]
    fn test_client_name_is_set_before_probe() {
        let dialer =
            MockDialer::default().with("a:1", MockControlPlane::new(vec![ok(), pong()]));
        let mut config = config(&["a:1"], None);
        config.credentials.client_name = Some("console".into());

        let established = connect(&dialer, &config).unwrap();
        assert_eq!(established.conn.verbs(), vec!["CLIENT", "PING"]);
        assert_eq!(established.conn.calls[0], vec!["CLIENT", "SETNAME", "console"]);
    }
}
