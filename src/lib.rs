//! valkey-admin library
//!
//! Command dispatch and topology discovery for a Valkey/Redis admin console:
//! free-form console commands routed to typed store calls, type-detecting key
//! previews, cursor scans, and replication/cluster topology discovery.

pub mod client;
pub mod command;
pub mod config;
pub mod query;
pub mod topology;
pub mod utils;
