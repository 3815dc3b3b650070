//! Snapshot (RDB) codec.
//!
//! Decoding understands string, list and sorted-set values together with
//! second and millisecond expiries. Encoding writes the same subset; stream
//! values are not persisted.

mod encoding;
mod opcode;
mod rdb_file_operations;
mod rdb_parser;

use thiserror::Error;

pub use rdb_file_operations::{encode_snapshot, load_rdb_file};
pub use rdb_parser::{RdbParser, Snapshot};

#[derive(Error, Debug)]
pub enum RdbError {
    #[error("unexpected end of snapshot data")]
    UnexpectedEof,
    #[error("invalid magic string")]
    InvalidMagicString,
    #[error("unsupported snapshot version '{0}'")]
    UnsupportedVersion(String),
    #[error("invalid length encoding 0x{0:02X}")]
    InvalidLengthEncoding(u8),
    #[error("compressed strings are not supported")]
    UnsupportedStringEncoding,
    #[error("invalid UTF-8 in snapshot string")]
    InvalidUtf8,
    #[error("unknown opcode 0x{0:02X}")]
    UnknownOpcode(u8),
    #[error("invalid expiration timestamp: {0}")]
    InvalidExpiration(String),
    #[error("invalid sorted set score for member '{0}'")]
    InvalidScore(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
