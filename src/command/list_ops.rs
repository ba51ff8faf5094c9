//! List commands: LPUSH, RPUSH, LINDEX, LLEN, LRANGE

use super::dispatch::{args, at_least_one, integer, required, DispatchEntry, PlannedCommand};
use super::tokenizer::Tokens;
use super::value::ReplyShape;
use crate::utils::Result;

pub(crate) const TABLE: &[DispatchEntry] = &[
    DispatchEntry { pattern: "LPUSH", handler: lpush },
    DispatchEntry { pattern: "RPUSH", handler: rpush },
    DispatchEntry { pattern: "LINDEX", handler: lindex },
    DispatchEntry { pattern: "LLEN", handler: llen },
    DispatchEntry { pattern: "LRANGE", handler: lrange },
];

fn push(name: &str, tokens: &Tokens) -> Result<PlannedCommand> {
    let key = required(tokens, 1, "a key")?;
    let values = at_least_one(tokens, 2, "value")?;
    let argv = args(name, std::iter::once(key).chain(values.iter().map(String::as_str)));
    Ok(PlannedCommand::new(argv, ReplyShape::Integer))
}

fn lpush(tokens: &Tokens) -> Result<PlannedCommand> {
    push("LPUSH", tokens)
}

fn rpush(tokens: &Tokens) -> Result<PlannedCommand> {
    push("RPUSH", tokens)
}

fn lindex(tokens: &Tokens) -> Result<PlannedCommand> {
    let key = required(tokens, 1, "a key")?;
    let index = integer(tokens, 2, "index")?.to_string();
    Ok(PlannedCommand::new(args("LINDEX", [key, index.as_str()]), ReplyShape::Text))
}

fn llen(tokens: &Tokens) -> Result<PlannedCommand> {
    let key = required(tokens, 1, "a key")?;
    Ok(PlannedCommand::new(args("LLEN", [key]), ReplyShape::Integer))
}

/// `stop` is inclusive, as on the store
fn lrange(tokens: &Tokens) -> Result<PlannedCommand> {
    let key = required(tokens, 1, "a key")?;
    let start = integer(tokens, 2, "start")?.to_string();
    let stop = integer(tokens, 3, "stop")?.to_string();
    Ok(PlannedCommand::new(
        args("LRANGE", [key, start.as_str(), stop.as_str()]),
        ReplyShape::List,
    ))
}
