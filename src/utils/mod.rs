//! Utility modules

pub mod error;
pub mod resp;

pub use error::{AdminError, ConnectionError, ParseError, ProtocolError, Result};
pub use resp::{RespDecoder, RespEncoder, RespValue};
