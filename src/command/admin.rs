//! Server-level console commands: INFO, CLUSTER INFO, DBSIZE, ROLE, EXISTS, DEL
//!
//! These sit outside the data-type families and match on the exact verb, so
//! a key-space verb never shadows a family pattern.

use super::dispatch::{at_least_one, select_database};
use super::tokenizer::{tokenize, Tokens};
use super::value::CommandValue;
use crate::client::control_plane::{ControlPlane, ControlPlaneExt};
use crate::topology::InfoMap;
use crate::utils::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminCommand {
    /// INFO with an optional section
    Info(Option<String>),
    ClusterInfo,
    DbSize,
    Role,
    Exists(Vec<String>),
    Del(Vec<String>),
}

impl AdminCommand {
    /// `None` when the verb is not an admin command
    pub fn parse(tokens: &Tokens) -> Result<Option<Self>> {
        let command = match tokens.verb() {
            "INFO" => AdminCommand::Info(tokens.get(1).map(String::from)),
            "CLUSTER" => match tokens.get(1) {
                Some(sub) if sub.eq_ignore_ascii_case("INFO") => AdminCommand::ClusterInfo,
                _ => return Ok(None),
            },
            "DBSIZE" => AdminCommand::DbSize,
            "ROLE" => AdminCommand::Role,
            "EXISTS" => AdminCommand::Exists(at_least_one(tokens, 1, "key")?.to_vec()),
            "DEL" => AdminCommand::Del(at_least_one(tokens, 1, "key")?.to_vec()),
            _ => return Ok(None),
        };
        Ok(Some(command))
    }

    /// Key-space commands run against the selected database
    fn needs_database(&self) -> bool {
        matches!(
            self,
            AdminCommand::DbSize | AdminCommand::Exists(_) | AdminCommand::Del(_)
        )
    }

    pub fn execute<C: ControlPlane + ?Sized>(&self, conn: &mut C, database: u32) -> Result<CommandValue> {
        if self.needs_database() {
            select_database(conn, database)?;
        }
        let value = match self {
            AdminCommand::Info(section) => info_value(conn.info(section.as_deref())?),
            AdminCommand::ClusterInfo => info_value(conn.cluster_info()?),
            AdminCommand::DbSize => CommandValue::Integer(conn.dbsize()?),
            AdminCommand::Role => CommandValue::Status(conn.role()?.to_string()),
            AdminCommand::Exists(keys) => CommandValue::Integer(conn.exists(&as_strs(keys))?),
            AdminCommand::Del(keys) => CommandValue::Integer(conn.del(&as_strs(keys))?),
        };
        Ok(value)
    }
}

fn as_strs(keys: &[String]) -> Vec<&str> {
    keys.iter().map(String::as_str).collect()
}

fn info_value(info: InfoMap) -> CommandValue {
    CommandValue::Map(
        info.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
    )
}

/// Run `raw` when it is an admin command; `Ok(None)` leaves it to the
/// family dispatchers and sends nothing.
pub fn dispatch_admin<C: ControlPlane + ?Sized>(
    conn: &mut C,
    raw: &str,
    database: u32,
) -> Result<Option<CommandValue>> {
    let tokens = tokenize(raw)?;
    match AdminCommand::parse(&tokens)? {
        Some(command) => command.execute(conn, database).map(Some),
        None => Ok(None),
    }
}
