//! Structured queries that bypass the console tokenizer
//!
//! - `auto_query`: detect a key's type and return a bounded preview
//! - `scan`: one page of cursor-based key enumeration

pub mod auto_query;
pub mod scan;

pub use auto_query::{auto_query, AutoQuery, AutoQueryResult, KeyType, TimeToLive};
pub use scan::{scan, scan_iter, ScanIter, ScanPage, ScanRequest};
