//! Command-line argument parsing for the admin console

use clap::{Parser, ValueEnum};

use super::client_config::{ClientConfig, Credentials, Endpoint, EndpointSet, DEFAULT_TIMEOUT_MS};
use crate::command::Family;

/// Admin console for Valkey/Redis deployments
#[derive(Parser, Debug, Clone)]
#[command(name = "valkey-admin")]
#[command(version, about, long_about = None)]
#[command(disable_help_flag = true)]
#[command(trailing_var_arg = true)]
pub struct CliArgs {
    /// Print help information
    #[arg(long = "help", action = clap::ArgAction::Help)]
    help: (),

    /// Console command to run once (REPL when omitted)
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, hide = true)]
    pub command_args: Vec<String>,

    // ===== Connection Options =====
    /// Server host, optionally `host:port`; repeat for failover candidates
    #[arg(short = 'h', long = "host", default_value = "127.0.0.1", action = clap::ArgAction::Append)]
    pub hosts: Vec<String>,

    /// Port for hosts given without one
    #[arg(short = 'p', long = "port", default_value_t = 6379)]
    pub port: u16,

    /// Password for AUTH command
    #[arg(short = 'a', long = "auth")]
    pub password: Option<String>,

    /// Name sent with CLIENT SETNAME
    #[arg(long = "client-name")]
    pub client_name: Option<String>,

    /// Database number to SELECT before every command
    #[arg(short = 'n', long = "dbnum", default_value_t = 0)]
    pub dbnum: u32,

    /// Connect as a cluster client
    #[arg(long = "cluster")]
    pub cluster_mode: bool,

    /// Connect/read/write timeout in milliseconds
    #[arg(long = "timeout-ms", default_value_t = DEFAULT_TIMEOUT_MS)]
    pub timeout_ms: u64,

    // ===== Operations =====
    /// Restrict console commands to one data-type family
    #[arg(long = "family", value_enum)]
    pub family: Option<FamilyArg>,

    /// Detect the type of KEY and print a preview
    #[arg(long = "query", value_name = "KEY", conflicts_with_all = ["scan", "nodes"])]
    pub query: Option<String>,

    /// Preview size for --query
    #[arg(long = "limit", default_value_t = 100)]
    pub limit: u32,

    /// Fetch one SCAN page for PATTERN
    #[arg(long = "scan", value_name = "PATTERN", conflicts_with = "nodes")]
    pub scan: Option<String>,

    /// Cursor to continue a previous --scan from
    #[arg(long = "cursor", default_value = "0")]
    pub cursor: String,

    /// COUNT hint for --scan
    #[arg(long = "count", default_value_t = 10)]
    pub count: u32,

    /// TYPE filter for --scan
    #[arg(long = "type")]
    pub scan_type: Option<String>,

    /// Print the replication group (or cluster nodes with --cluster)
    #[arg(long = "nodes")]
    pub nodes: bool,

    // ===== Output Options =====
    /// Output format for results
    #[arg(long = "output-format", value_enum, default_value_t = OutputFormat::Text)]
    pub output_format: OutputFormat,

    /// Quiet mode (errors only)
    #[arg(short = 'q', long = "quiet")]
    pub quiet: bool,

    /// Verbose output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

/// Data-type family selectable from the command line
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FamilyArg {
    String,
    Hash,
    List,
    Set,
    Zset,
}

impl From<FamilyArg> for Family {
    fn from(arg: FamilyArg) -> Self {
        match arg {
            FamilyArg::String => Family::String,
            FamilyArg::Hash => Family::Hash,
            FamilyArg::List => Family::List,
            FamilyArg::Set => Family::Set,
            FamilyArg::Zset => Family::SortedSet,
        }
    }
}

/// Output format for results
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// valkey-cli style rendering
    #[default]
    Text,
    Json,
}

impl CliArgs {
    /// Parse CLI arguments from command line
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate argument combinations
    pub fn validate(&self) -> Result<(), String> {
        if self.port == 0 {
            return Err("--port must be between 1 and 65535".to_string());
        }
        if self.timeout_ms == 0 {
            return Err("--timeout-ms must be at least 1".to_string());
        }
        // Cluster deployments only have database 0
        if self.cluster_mode && self.dbnum != 0 {
            return Err("--dbnum cannot be used with --cluster".to_string());
        }
        if self.count == 0 {
            return Err("--count must be at least 1".to_string());
        }
        Ok(())
    }

    /// Failover candidates in command-line order
    pub fn endpoints(&self) -> Result<EndpointSet, String> {
        self.hosts
            .iter()
            .map(|host| {
                if host.starts_with('[') || host.matches(':').count() == 1 {
                    host.parse()
                } else {
                    Endpoint::new(host.as_str(), self.port)
                }
            })
            .collect()
    }

    pub fn client_config(&self) -> Result<ClientConfig, String> {
        let mut config = ClientConfig::new(
            self.endpoints()?,
            Credentials {
                password: self.password.clone(),
                client_name: self.client_name.clone(),
            },
        );
        config.timeout_ms = self.timeout_ms;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_args() {
        let args = CliArgs::parse_from(["test"]);
        assert_eq!(args.port, 6379);
        assert_eq!(args.dbnum, 0);
        assert_eq!(args.limit, 100);
        assert_eq!(args.cursor, "0");
        assert!(args.command_args.is_empty());
        assert_eq!(args.output_format, OutputFormat::Text);
        assert!(args.validate().is_ok());

        let args = CliArgs::parse_from(["test", "--output-format", "json", "GET", "k"]);
        assert_eq!(args.output_format, OutputFormat::Json);
    }

    #[test]
    fn test_multiple_hosts_keep_order() {
        let args = CliArgs::parse_from(["test", "-h", "host1", "-h", "host2:7000", "-h", "host1", "-p", "6380"]);
        let endpoints: Vec<String> = args.endpoints().unwrap().iter().map(|e| e.to_string()).collect();
        assert_eq!(endpoints, vec!["host1:6380", "host2:7000"]);
    }

    #[test]
    fn test_ipv6_hosts() {
        let args = CliArgs::parse_from(["test", "-h", "::1", "-h", "[fe80::1]:7000"]);
        let endpoints: Vec<String> = args.endpoints().unwrap().iter().map(|e| e.to_string()).collect();
        assert_eq!(endpoints, vec!["::1:6379", "fe80::1:7000"]);
    }

    #[test]
    fn test_trailing_command() {
        let args = CliArgs::parse_from(["test", "-n", "2", "HSET", "user:1", "name", "-x"]);
        assert_eq!(args.dbnum, 2);
        assert_eq!(args.command_args, vec!["HSET", "user:1", "name", "-x"]);
    }

    #[test]
    fn test_client_config() {
        let args = CliArgs::parse_from(["test", "-a", "secret", "--client-name", "ops", "--timeout-ms", "250"]);
        let config = args.client_config().unwrap();
        assert_eq!(config.credentials.password.as_deref(), Some("secret"));
        assert_eq!(config.credentials.client_name.as_deref(), Some("ops"));
        assert_eq!(config.timeout_ms, 250);
    }

    #[test]
    fn test_validation_cluster_with_db() {
        let args = CliArgs::parse_from(["test", "--cluster", "-n", "3"]);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_query_conflicts_with_scan() {
        assert!(CliArgs::try_parse_from(["test", "--query", "k", "--scan", "*"]).is_err());
    }

    #[test]
    fn test_family_arg() {
        let args = CliArgs::parse_from(["test", "--family", "zset", "ZCARD", "board"]);
        assert_eq!(args.family.map(Family::from), Some(Family::SortedSet));
    }
}
