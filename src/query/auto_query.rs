//! Type-detecting key preview
//!
//! The preview size depends on the key type:
//!
//! | type   | command                           | elements     |
//! |--------|-----------------------------------|--------------|
//! | string | `GET key`                         | 1            |
//! | hash   | `HGETALL key`                     | all fields   |
//! | list   | `LRANGE key 0 limit`              | `limit + 1`  |
//! | set    | `SRANDMEMBER key limit`           | `limit`      |
//! | zset   | `ZRANGE key 0 limit WITHSCORES`   | `limit + 1`  |

use std::fmt;

use serde::{Deserialize, Serialize, Serializer};
use tracing::debug;

use crate::client::control_plane::{ControlPlane, ControlPlaneExt};
use crate::command::dispatch::{select_database, PlannedCommand};
use crate::command::value::{CommandValue, ReplyShape};
use crate::utils::Result;

/// Structured preview request
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AutoQuery {
    pub key: String,
    #[serde(default)]
    pub database: u32,
    #[serde(default)]
    pub limit: u32,
}

impl AutoQuery {
    pub fn new(key: impl Into<String>, database: u32, limit: u32) -> Self {
        Self {
            key: key.into(),
            database,
            limit,
        }
    }
}

/// Type reported by `TYPE`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyType {
    String,
    Hash,
    List,
    Set,
    ZSet,
    /// Key does not exist
    None,
    /// A type with no preview (stream, module types)
    Other(String),
}

impl KeyType {
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "string" => KeyType::String,
            "hash" => KeyType::Hash,
            "list" => KeyType::List,
            "set" => KeyType::Set,
            "zset" => KeyType::ZSet,
            "none" => KeyType::None,
            other => KeyType::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            KeyType::String => "string",
            KeyType::Hash => "hash",
            KeyType::List => "list",
            KeyType::Set => "set",
            KeyType::ZSet => "zset",
            KeyType::None => "none",
            KeyType::Other(s) => s,
        }
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for KeyType {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Remaining lifetime of a key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeToLive {
    /// Key absent (`TTL` returned -2)
    Unknown,
    /// Key exists without expiry (-1)
    NoExpiry,
    Seconds(i64),
}

impl TimeToLive {
    pub fn from_reply(ttl: i64) -> Self {
        match ttl {
            -1 => TimeToLive::NoExpiry,
            n if n < 0 => TimeToLive::Unknown,
            n => TimeToLive::Seconds(n),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AutoQueryResult {
    pub ttl: TimeToLive,
    pub key_type: KeyType,
    pub value: CommandValue,
}

/// Preview command for a key type, `None` for types without one
fn preview_command(key_type: &KeyType, key: &str, limit: u32) -> Option<PlannedCommand> {
    let key = key.to_string();
    let limit = limit.to_string();
    let (args, reply) = match key_type {
        KeyType::String => (vec!["GET".into(), key], ReplyShape::Text),
        KeyType::Hash => (vec!["HGETALL".into(), key], ReplyShape::Map),
        KeyType::List => (
            vec!["LRANGE".into(), key, "0".into(), limit],
            ReplyShape::List,
        ),
        KeyType::Set => (vec!["SRANDMEMBER".into(), key, limit], ReplyShape::List),
        KeyType::ZSet => (
            vec!["ZRANGE".into(), key, "0".into(), limit, "WITHSCORES".into()],
            ReplyShape::Scored,
        ),
        KeyType::None | KeyType::Other(_) => return None,
    };
    Some(PlannedCommand::new(args, reply))
}

/// Detect the type of `query.key` and return its TTL and a bounded preview
pub fn auto_query<C: ControlPlane + ?Sized>(conn: &mut C, query: &AutoQuery) -> Result<AutoQueryResult> {
    select_database(conn, query.database)?;

    let key_type = KeyType::parse(&conn.key_type(&query.key)?);
    let ttl = TimeToLive::from_reply(conn.ttl(&query.key)?);

    let value = match preview_command(&key_type, &query.key, query.limit) {
        Some(planned) => {
            let args: Vec<&str> = planned.args.iter().map(String::as_str).collect();
            let reply = conn.execute(&args)?;
            planned.reply.convert(planned.name(), reply)?
        }
        None => {
            debug!("No preview for {} of type {}", query.key, key_type);
            CommandValue::Nil
        }
    };

    Ok(AutoQueryResult {
        ttl,
        key_type,
        value,
    })
}
