//! Cursor-based key enumeration
//!
//! `scan` is stateless: the cursor returned in one page is the only input
//! needed for the next. `"0"` starts an enumeration and, when returned,
//! ends it. Keys added or removed while an enumeration is in progress may be
//! reported twice or not at all; that is the store's SCAN guarantee and is
//! passed through unchanged.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::client::control_plane::{ControlPlane, Deployment};
use crate::command::dispatch::select_database;
use crate::topology::cluster_nodes::hash_tag;
use crate::utils::{AdminError, RespValue, Result};

pub const START_CURSOR: &str = "0";
const DEFAULT_COUNT: u32 = 10;

fn default_cursor() -> String {
    START_CURSOR.to_string()
}

fn default_count() -> u32 {
    DEFAULT_COUNT
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ScanRequest {
    #[serde(default = "default_cursor")]
    pub cursor: String,
    pub pattern: String,
    /// Batch-size hint passed as COUNT
    #[serde(default = "default_count")]
    pub count: u32,
    /// Only return keys of this type (`TYPE` option)
    #[serde(default)]
    pub key_type: Option<String>,
    #[serde(default)]
    pub database: Option<u32>,
}

impl ScanRequest {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            cursor: default_cursor(),
            pattern: pattern.into(),
            count: DEFAULT_COUNT,
            key_type: None,
            database: None,
        }
    }

    pub fn with_cursor(mut self, cursor: impl Into<String>) -> Self {
        self.cursor = cursor.into();
        self
    }

    pub fn with_count(mut self, count: u32) -> Self {
        self.count = count;
        self
    }

    fn args(&self) -> Vec<String> {
        let mut args = vec![
            "SCAN".to_string(),
            self.cursor.clone(),
            "MATCH".to_string(),
            self.pattern.clone(),
            "COUNT".to_string(),
            self.count.to_string(),
        ];
        if let Some(t) = &self.key_type {
            args.push("TYPE".to_string());
            args.push(t.clone());
        }
        args
    }
}

/// One page of keys and the cursor to continue from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanPage {
    pub next_cursor: String,
    pub items: Vec<String>,
}

impl ScanPage {
    pub fn is_last(&self) -> bool {
        self.next_cursor == START_CURSOR
    }
}

/// Fetch one page
///
/// On a cluster connection the pattern must carry a `{hash tag}` so the whole
/// enumeration stays on the one node owning that slot.
pub fn scan<C: ControlPlane + ?Sized>(conn: &mut C, request: &ScanRequest) -> Result<ScanPage> {
    if conn.deployment() == Deployment::Cluster && hash_tag(request.pattern.as_bytes()).is_none() {
        return Err(AdminError::Unsupported(format!(
            "cluster SCAN needs a hash tag in the pattern, got '{}'",
            request.pattern
        )));
    }
    if let Some(db) = request.database {
        select_database(conn, db)?;
    }

    let args = request.args();
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    parse_scan_reply(conn.execute(&args)?)
}

/// Reply layout: `[cursor, [key, ...]]`
fn parse_scan_reply(reply: RespValue) -> Result<ScanPage> {
    if let RespValue::Error(e) = reply {
        return Err(AdminError::Store(e));
    }
    let parsed = match reply.as_array() {
        Some([cursor, RespValue::Array(keys)]) => cursor.to_text().map(|next_cursor| ScanPage {
            next_cursor,
            items: keys.iter().filter_map(RespValue::to_text).collect(),
        }),
        _ => None,
    };
    parsed.ok_or_else(|| AdminError::unexpected("SCAN", &reply))
}

/// Lazily walk every page starting at `request.cursor`
pub fn scan_iter<C: ControlPlane + ?Sized>(conn: &mut C, request: ScanRequest) -> ScanIter<'_, C> {
    ScanIter {
        conn,
        request,
        buffered: VecDeque::new(),
        finished: false,
    }
}

/// Iterator over keys; fetches a new page whenever the buffer runs dry.
/// Stops after the first error.
pub struct ScanIter<'c, C: ?Sized> {
    conn: &'c mut C,
    request: ScanRequest,
    buffered: VecDeque<String>,
    finished: bool,
}

impl<C: ControlPlane + ?Sized> Iterator for ScanIter<'_, C> {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(key) = self.buffered.pop_front() {
                return Some(Ok(key));
            }
            if self.finished {
                return None;
            }
            match scan(&mut *self.conn, &self.request) {
                Ok(page) => {
                    self.finished = page.is_last();
                    self.request.cursor = page.next_cursor;
                    self.buffered.extend(page.items);
                }
                Err(e) => {
                    self.finished = true;
                    return Some(Err(e));
                }
            }
        }
    }
}
