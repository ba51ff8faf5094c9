//! Set commands: SCARD, SADD, SMEMBERS, SRANDMEMBER

use super::dispatch::{args, at_least_one, integer, required, DispatchEntry, PlannedCommand};
use super::tokenizer::Tokens;
use super::value::ReplyShape;
use crate::utils::Result;

pub(crate) const TABLE: &[DispatchEntry] = &[
    DispatchEntry { pattern: "SCARD", handler: scard },
    DispatchEntry { pattern: "SADD", handler: sadd },
    DispatchEntry { pattern: "SMEMBERS", handler: smembers },
    DispatchEntry { pattern: "SRANDMEMBER", handler: srandmember },
];

fn scard(tokens: &Tokens) -> Result<PlannedCommand> {
    let key = required(tokens, 1, "a key")?;
    Ok(PlannedCommand::new(args("SCARD", [key]), ReplyShape::Integer))
}

fn sadd(tokens: &Tokens) -> Result<PlannedCommand> {
    let key = required(tokens, 1, "a key")?;
    let members = at_least_one(tokens, 2, "member")?;
    let argv = args("SADD", std::iter::once(key).chain(members.iter().map(String::as_str)));
    Ok(PlannedCommand::new(argv, ReplyShape::Integer))
}

fn smembers(tokens: &Tokens) -> Result<PlannedCommand> {
    let key = required(tokens, 1, "a key")?;
    Ok(PlannedCommand::new(args("SMEMBERS", [key]), ReplyShape::Set))
}

/// Count defaults to 1; the count form is always sent so the reply is a list
fn srandmember(tokens: &Tokens) -> Result<PlannedCommand> {
    let key = required(tokens, 1, "a key")?;
    let count = match tokens.get(2) {
        Some(_) => integer(tokens, 2, "count")?,
        None => 1,
    }
    .to_string();
    Ok(PlannedCommand::new(
        args("SRANDMEMBER", [key, count.as_str()]),
        ReplyShape::List,
    ))
}
