//! Typed command results

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::utils::{AdminError, ProtocolError, RespValue, Result};

/// Member of a sorted set together with its score
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredMember {
    pub member: String,
    pub score: f64,
}

/// Result of one dispatched command
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CommandValue {
    /// Key or element absent
    Nil,
    Status(String),
    Integer(i64),
    Float(f64),
    Text(String),
    /// Ordered sequence; entries may be `Nil` (HMGET)
    List(Vec<CommandValue>),
    Set(BTreeSet<String>),
    Map(BTreeMap<String, String>),
    Scored(Vec<ScoredMember>),
}

impl CommandValue {
    pub fn is_nil(&self) -> bool {
        matches!(self, CommandValue::Nil)
    }
}

/// How a command's reply is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyShape {
    Status,
    Integer,
    /// Bulk string or nil
    Text,
    /// Bulk string holding a float, or nil
    Float,
    /// Array of bulk strings, nil entries kept in place
    List,
    Set,
    /// Flat field/value array
    Map,
    /// Flat member/score array
    Scored,
}

impl ReplyShape {
    pub fn convert(self, command: &str, reply: RespValue) -> Result<CommandValue> {
        if let RespValue::Error(e) = reply {
            return Err(AdminError::Store(e));
        }
        if reply == RespValue::Null {
            return Ok(CommandValue::Nil);
        }

        let unexpected = |reply: &RespValue| AdminError::unexpected(command, reply);

        match self {
            ReplyShape::Status => match reply {
                RespValue::SimpleString(s) => Ok(CommandValue::Status(s)),
                other => Err(unexpected(&other)),
            },
            ReplyShape::Integer => reply
                .as_i64()
                .map(CommandValue::Integer)
                .ok_or_else(|| unexpected(&reply)),
            ReplyShape::Text => reply
                .to_text()
                .map(CommandValue::Text)
                .ok_or_else(|| unexpected(&reply)),
            ReplyShape::Float => {
                let text = reply.to_text().ok_or_else(|| unexpected(&reply))?;
                parse_float(&text).map(CommandValue::Float)
            }
            ReplyShape::List => {
                let items = reply.as_array().ok_or_else(|| unexpected(&reply))?;
                Ok(CommandValue::List(
                    items
                        .iter()
                        .map(|item| match item {
                            RespValue::Integer(n) => CommandValue::Integer(*n),
                            other => other.to_text().map_or(CommandValue::Nil, CommandValue::Text),
                        })
                        .collect(),
                ))
            }
            ReplyShape::Set => {
                let items = reply.as_array().ok_or_else(|| unexpected(&reply))?;
                Ok(CommandValue::Set(items.iter().filter_map(RespValue::to_text).collect()))
            }
            ReplyShape::Map => {
                let pairs = text_pairs(&reply).ok_or_else(|| unexpected(&reply))?;
                Ok(CommandValue::Map(pairs.into_iter().collect()))
            }
            ReplyShape::Scored => {
                let pairs = text_pairs(&reply).ok_or_else(|| unexpected(&reply))?;
                let scored = pairs
                    .into_iter()
                    .map(|(member, score)| -> Result<ScoredMember> {
                        Ok(ScoredMember {
                            member,
                            score: parse_float(&score)?,
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(CommandValue::Scored(scored))
            }
        }
    }
}

/// Flat `[a, b, c, d]` array as `[(a, b), (c, d)]`
fn text_pairs(reply: &RespValue) -> Option<Vec<(String, String)>> {
    let items = reply.as_array()?;
    if items.len() % 2 != 0 {
        return None;
    }
    items
        .chunks(2)
        .map(|pair| Some((pair[0].to_text()?, pair[1].to_text()?)))
        .collect()
}

/// Scores come back as text; `inf`/`-inf` are valid
fn parse_float(text: &str) -> Result<f64> {
    text.trim()
        .parse::<f64>()
        .map_err(|_| ProtocolError::InvalidFloat(text.to_string()).into())
}
