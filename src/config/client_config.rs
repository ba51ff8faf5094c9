//! Connection configuration supplied by the caller

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

/// Default connect/read/write timeout applied to every socket operation
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// A single candidate server address
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "RawEndpoint")]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

/// Unvalidated endpoint as read from a config file
#[derive(Deserialize)]
struct RawEndpoint {
    host: String,
    port: u16,
}

impl TryFrom<RawEndpoint> for Endpoint {
    type Error = String;

    fn try_from(raw: RawEndpoint) -> Result<Self, Self::Error> {
        Endpoint::new(raw.host, raw.port)
    }
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Result<Self, String> {
        let host = host.into();
        if host.is_empty() {
            return Err("empty host".to_string());
        }
        if port == 0 {
            return Err(format!("invalid port 0 for host {}", host));
        }
        Ok(Self { host, port })
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl FromStr for Endpoint {
    type Err = String;

    /// Parses `host:port`; the last `:` separates the port so bare IPv6 hosts work.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (host, port) = s
            .rsplit_once(':')
            .ok_or_else(|| format!("missing port in '{}'", s))?;
        let port: u16 = port
            .parse()
            .map_err(|_| format!("invalid port in '{}'", s))?;
        Endpoint::new(host.trim_start_matches('[').trim_end_matches(']'), port)
    }
}

/// Insertion-ordered set of endpoints
///
/// Duplicates are dropped on insert so failover order stays reproducible.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EndpointSet {
    endpoints: Vec<Endpoint>,
}

impl EndpointSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an endpoint; returns false if it was already present
    pub fn insert(&mut self, endpoint: Endpoint) -> bool {
        if self.endpoints.contains(&endpoint) {
            return false;
        }
        self.endpoints.push(endpoint);
        true
    }

    pub fn contains(&self, endpoint: &Endpoint) -> bool {
        self.endpoints.contains(endpoint)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Endpoint> {
        self.endpoints.iter()
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Endpoint> {
        self.endpoints.get(index)
    }
}

impl FromIterator<Endpoint> for EndpointSet {
    fn from_iter<I: IntoIterator<Item = Endpoint>>(iter: I) -> Self {
        let mut set = EndpointSet::new();
        for endpoint in iter {
            set.insert(endpoint);
        }
        set
    }
}

impl<'de> Deserialize<'de> for EndpointSet {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let endpoints = Vec::<Endpoint>::deserialize(deserializer)?;
        Ok(endpoints.into_iter().collect())
    }
}

/// Credentials applied to every connection a client opens
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub password: Option<String>,
    /// Sent with CLIENT SETNAME when present and non-empty
    #[serde(default)]
    pub client_name: Option<String>,
}

/// Complete client configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    pub endpoints: EndpointSet,
    #[serde(default)]
    pub credentials: Credentials,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

impl ClientConfig {
    pub fn new(endpoints: EndpointSet, credentials: Credentials) -> Self {
        Self {
            endpoints,
            credentials,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Same credentials and timeout, different endpoints
    pub fn with_endpoints(&self, endpoints: EndpointSet) -> Self {
        Self {
            endpoints,
            credentials: self.credentials.clone(),
            timeout_ms: self.timeout_ms,
        }
    }
}
