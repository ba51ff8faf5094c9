//! Console command handling
//!
//! Raw console text is tokenized, matched against the per-family prefix
//! tables and turned into a typed store call. Server-level commands (INFO,
//! DBSIZE, ...) live in `admin`.

pub mod admin;
pub mod dispatch;
mod hash_ops;
mod list_ops;
mod set_ops;
mod string_ops;
pub mod tokenizer;
pub mod value;
mod zset_ops;

pub use admin::{dispatch_admin, AdminCommand};
pub use dispatch::{dispatch, dispatch_family, route, Dispatched, Family, PlannedCommand};
pub use tokenizer::{tokenize, Tokens};
pub use value::{CommandValue, ReplyShape, ScoredMember};
