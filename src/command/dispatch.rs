//! Verb-prefix dispatch
//!
//! Every family owns an ordered table of `(pattern, handler)` entries. A verb
//! selects the first entry whose pattern it starts with, so longer patterns
//! that share a prefix must come first (`HGETALL` before `HGET`).
//!
//! Handlers only marshal tokens into a `PlannedCommand`; they never touch the
//! connection. Argument errors therefore surface before anything is sent.

use std::fmt;

use serde::Serialize;
use tracing::debug;

use super::tokenizer::{tokenize, Tokens};
use super::value::{CommandValue, ReplyShape};
use super::{hash_ops, list_ops, set_ops, string_ops, zset_ops};
use crate::client::control_plane::{ControlPlane, ControlPlaneExt, Deployment};
use crate::utils::{AdminError, Result};

/// Data-type family of a console command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Family {
    String,
    Hash,
    List,
    Set,
    #[serde(rename = "zset")]
    SortedSet,
}

impl Family {
    /// Routing order for commands that do not name a family
    pub const ALL: [Family; 5] = [
        Family::String,
        Family::Hash,
        Family::List,
        Family::Set,
        Family::SortedSet,
    ];

    pub fn table(self) -> &'static [DispatchEntry] {
        match self {
            Family::String => string_ops::TABLE,
            Family::Hash => hash_ops::TABLE,
            Family::List => list_ops::TABLE,
            Family::Set => set_ops::TABLE,
            Family::SortedSet => zset_ops::TABLE,
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Family::String => "string",
            Family::Hash => "hash",
            Family::List => "list",
            Family::Set => "set",
            Family::SortedSet => "zset",
        };
        f.write_str(name)
    }
}

/// Store command ready to send
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedCommand {
    pub args: Vec<String>,
    pub reply: ReplyShape,
}

impl PlannedCommand {
    pub fn new(args: Vec<String>, reply: ReplyShape) -> Self {
        Self { args, reply }
    }

    pub fn name(&self) -> &str {
        self.args.first().map(String::as_str).unwrap_or_default()
    }
}

pub type Handler = fn(&Tokens) -> Result<PlannedCommand>;

pub struct DispatchEntry {
    pub pattern: &'static str,
    pub handler: Handler,
}

/// First entry whose pattern prefixes `verb`
pub fn match_entry(table: &'static [DispatchEntry], verb: &str) -> Option<&'static DispatchEntry> {
    table.iter().find(|entry| verb.starts_with(entry.pattern))
}

/// Plan a command within one family; `None` when no entry matches
pub fn plan(family: Family, tokens: &Tokens) -> Result<Option<PlannedCommand>> {
    match match_entry(family.table(), tokens.verb()) {
        Some(entry) => (entry.handler)(tokens).map(Some),
        None => Ok(None),
    }
}

/// Find the family claiming the verb and plan the command
pub fn route(tokens: &Tokens) -> Result<(Family, PlannedCommand)> {
    for family in Family::ALL {
        if let Some(entry) = match_entry(family.table(), tokens.verb()) {
            return Ok((family, (entry.handler)(tokens)?));
        }
    }
    Err(AdminError::Unsupported(format!(
        "no dispatcher recognizes '{}'",
        tokens.verb()
    )))
}

/// Outcome of a family dispatch
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatched {
    Value(CommandValue),
    /// Verb not in the family's table; nothing was sent
    Unmatched,
}

impl Dispatched {
    /// Unmatched dispatches read as an absent result
    pub fn into_value(self) -> CommandValue {
        match self {
            Dispatched::Value(v) => v,
            Dispatched::Unmatched => CommandValue::Nil,
        }
    }
}

/// Select `database` on standalone connections. Clusters only have db 0:
/// selecting it is a no-op, any other database is `Unsupported`.
pub fn select_database<C: ControlPlane + ?Sized>(conn: &mut C, database: u32) -> Result<()> {
    match conn.deployment() {
        Deployment::Standalone => conn.select_db(database),
        Deployment::Cluster if database == 0 => Ok(()),
        Deployment::Cluster => Err(AdminError::Unsupported(format!(
            "database {} on a cluster connection",
            database
        ))),
    }
}

/// Select the database, send the command and convert the reply
pub fn execute_planned<C: ControlPlane + ?Sized>(
    conn: &mut C,
    planned: &PlannedCommand,
    database: u32,
) -> Result<CommandValue> {
    select_database(conn, database)?;
    let args: Vec<&str> = planned.args.iter().map(String::as_str).collect();
    let reply = conn.execute(&args)?;
    planned.reply.convert(planned.name(), reply)
}

/// Dispatch a raw console command within `family`
pub fn dispatch_family<C: ControlPlane + ?Sized>(
    conn: &mut C,
    family: Family,
    raw: &str,
    database: u32,
) -> Result<Dispatched> {
    let tokens = tokenize(raw)?;
    match plan(family, &tokens)? {
        Some(planned) => execute_planned(conn, &planned, database).map(Dispatched::Value),
        None => {
            debug!("{} dispatcher has no entry for {}", family, tokens.verb());
            Ok(Dispatched::Unmatched)
        }
    }
}

/// Dispatch a raw console command to whichever family recognizes its verb
pub fn dispatch<C: ControlPlane + ?Sized>(
    conn: &mut C,
    raw: &str,
    database: u32,
) -> Result<CommandValue> {
    let tokens = tokenize(raw)?;
    let (family, planned) = route(&tokens)?;
    debug!("Routing {} to {} dispatcher", planned.name(), family);
    execute_planned(conn, &planned, database)
}

// ---------------------------------------------------------------------------
// Argument helpers shared by the family tables
// ---------------------------------------------------------------------------

/// Positional token or a `MalformedCommand` naming what is missing
pub(crate) fn required<'t>(tokens: &'t Tokens, index: usize, what: &str) -> Result<&'t str> {
    tokens.get(index).ok_or_else(|| {
        AdminError::MalformedCommand(format!("{} requires {}", tokens.verb(), what))
    })
}

/// All tokens from `index`, at least one
pub(crate) fn at_least_one<'t>(tokens: &'t Tokens, index: usize, what: &str) -> Result<&'t [String]> {
    let rest = tokens.rest(index);
    if rest.is_empty() {
        return Err(AdminError::MalformedCommand(format!(
            "{} requires at least one {}",
            tokens.verb(),
            what
        )));
    }
    Ok(rest)
}

pub(crate) fn integer(tokens: &Tokens, index: usize, argument: &'static str) -> Result<i64> {
    let raw = required(tokens, index, argument)?;
    raw.parse().map_err(|_| AdminError::InvalidArgument {
        argument,
        value: raw.to_string(),
        expected: "integer",
    })
}

/// Finite or infinite score; NaN is rejected as the store would
pub(crate) fn score(tokens: &Tokens, index: usize) -> Result<f64> {
    let raw = required(tokens, index, "score")?;
    match raw.parse::<f64>() {
        Ok(s) if !s.is_nan() => Ok(s),
        _ => Err(AdminError::InvalidArgument {
            argument: "score",
            value: raw.to_string(),
            expected: "float",
        }),
    }
}

/// Score range bound: a float, `-inf`/`+inf`, optionally prefixed by `(`
pub(crate) fn score_bound<'t>(tokens: &'t Tokens, index: usize, argument: &'static str) -> Result<&'t str> {
    let raw = required(tokens, index, argument)?;
    let number = raw.strip_prefix('(').unwrap_or(raw);
    match number.parse::<f64>() {
        Ok(s) if !s.is_nan() => Ok(raw),
        _ => Err(AdminError::InvalidArgument {
            argument,
            value: raw.to_string(),
            expected: "score bound",
        }),
    }
}

/// Build an argument vector from a command name and borrowed tokens
pub(crate) fn args<'a>(name: &'a str, rest: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    std::iter::once(name)
        .chain(rest)
        .map(String::from)
        .collect()
}
