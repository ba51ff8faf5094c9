//! Configuration module

pub mod cli;
pub mod client_config;

pub use cli::{CliArgs, FamilyArg, OutputFormat};
pub use client_config::{ClientConfig, Credentials, Endpoint, EndpointSet, DEFAULT_TIMEOUT_MS};
