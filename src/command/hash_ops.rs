//! Hash commands: HGETALL, HGET, HMGET, HKEYS, HSET

use super::dispatch::{args, at_least_one, required, DispatchEntry, PlannedCommand};
use super::tokenizer::Tokens;
use super::value::ReplyShape;
use crate::utils::{AdminError, Result};

pub(crate) const TABLE: &[DispatchEntry] = &[
    DispatchEntry { pattern: "HGETALL", handler: hgetall },
    DispatchEntry { pattern: "HGET", handler: hget },
    DispatchEntry { pattern: "HMGET", handler: hmget },
    DispatchEntry { pattern: "HKEYS", handler: hkeys },
    DispatchEntry { pattern: "HSET", handler: hset },
];

fn hgetall(tokens: &Tokens) -> Result<PlannedCommand> {
    let key = required(tokens, 1, "a key")?;
    Ok(PlannedCommand::new(args("HGETALL", [key]), ReplyShape::Map))
}

fn hget(tokens: &Tokens) -> Result<PlannedCommand> {
    let key = required(tokens, 1, "a key")?;
    let field = required(tokens, 2, "a field")?;
    Ok(PlannedCommand::new(args("HGET", [key, field]), ReplyShape::Text))
}

fn hmget(tokens: &Tokens) -> Result<PlannedCommand> {
    let key = required(tokens, 1, "a key")?;
    let fields = at_least_one(tokens, 2, "field")?;
    let argv = args("HMGET", std::iter::once(key).chain(fields.iter().map(String::as_str)));
    Ok(PlannedCommand::new(argv, ReplyShape::List))
}

fn hkeys(tokens: &Tokens) -> Result<PlannedCommand> {
    let key = required(tokens, 1, "a key")?;
    Ok(PlannedCommand::new(args("HKEYS", [key]), ReplyShape::Set))
}

/// Field/value pairs are consumed two tokens at a time after the key
fn hset(tokens: &Tokens) -> Result<PlannedCommand> {
    let key = required(tokens, 1, "a key")?;
    let pairs = at_least_one(tokens, 2, "field/value pair")?;
    if pairs.len() % 2 != 0 {
        return Err(AdminError::MalformedCommand(format!(
            "HSET field '{}' has no value",
            pairs[pairs.len() - 1]
        )));
    }
    let argv = args("HSET", std::iter::once(key).chain(pairs.iter().map(String::as_str)));
    Ok(PlannedCommand::new(argv, ReplyShape::Integer))
}
