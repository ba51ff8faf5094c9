//! String commands: GET, SET

use super::dispatch::{args, required, DispatchEntry, PlannedCommand};
use super::tokenizer::Tokens;
use super::value::ReplyShape;
use crate::utils::Result;

pub(crate) const TABLE: &[DispatchEntry] = &[
    DispatchEntry { pattern: "GET", handler: get },
    DispatchEntry { pattern: "SET", handler: set },
];

fn get(tokens: &Tokens) -> Result<PlannedCommand> {
    let key = required(tokens, 1, "a key")?;
    Ok(PlannedCommand::new(args("GET", [key]), ReplyShape::Text))
}

/// Tokens after the value are ignored
fn set(tokens: &Tokens) -> Result<PlannedCommand> {
    let key = required(tokens, 1, "a key")?;
    let value = required(tokens, 2, "a value")?;
    Ok(PlannedCommand::new(args("SET", [key, value]), ReplyShape::Status))
}
