//! RESP (Redis Serialization Protocol) codec.
//!
//! Decoding is token oriented: a line is read up to its CRLF terminator, the
//! first byte selects the sub-decoder, and bulk strings and arrays recurse using
//! their declared length instead of scanning for delimiters. The decoder yields
//! one frame at a time so several pipelined commands that arrive in a single
//! network read can be processed without waiting for another read.

use bytes::{Buf, BytesMut};
use thiserror::Error;

const CRLF: &[u8] = b"\r\n";
/// Arrays nested deeper than this are refused.
pub const MAX_NESTING_DEPTH: usize = 512;

/// Errors produced while decoding a RESP frame.
///
/// Every variant means the byte alignment with the peer is lost, so callers
/// treat them as fatal for the connection.
#[derive(Error, Debug, PartialEq, Clone)]
pub enum RespError {
    #[error("invalid UTF-8 sequence")]
    InvalidUtf8,
    #[error("empty frame")]
    EmptyFrame,
    #[error("unknown RESP type '{0}'")]
    UnknownRespType(char),
    #[error("invalid integer")]
    InvalidInteger,
    #[error("invalid bulk string length")]
    InvalidBulkString,
    #[error("invalid array length")]
    InvalidArray,
    #[error("missing CRLF terminator")]
    MissingTerminator,
    #[error("arrays nested deeper than {0} levels")]
    NestingTooDeep(usize),
}

impl RespError {
    pub fn as_resp(&self) -> RespValue {
        RespValue::Error(format!("ERR Protocol error: {}", self))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RespValue {
    SimpleString(String),
    Error(String),
    Integer(i64),
    BulkString(String),
    NullBulkString,
    Array(Vec<RespValue>),
}

impl RespValue {
    pub fn ok() -> Self {
        RespValue::SimpleString("OK".to_string())
    }

    pub fn bulk(value: impl Into<String>) -> Self {
        RespValue::BulkString(value.into())
    }

    /// Builds an array of bulk strings, the shape every command request uses.
    pub fn array_of_bulk_strings<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        RespValue::Array(items.into_iter().map(|s| RespValue::bulk(s)).collect())
    }

    /// Returns the textual payload of simple and bulk strings.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            RespValue::SimpleString(s) | RespValue::BulkString(s) => Some(s),
            _ => None,
        }
    }

    pub fn encode(&self) -> String {
        match self {
            RespValue::SimpleString(s) => format!("+{}\r\n", s),
            RespValue::Error(msg) => format!("-{}\r\n", msg),
            RespValue::Integer(i) => format!(":{}\r\n", i),
            RespValue::BulkString(s) => format!("${}\r\n{}\r\n", s.len(), s),
            RespValue::NullBulkString => "$-1\r\n".to_string(),
            RespValue::Array(elements) => {
                let mut encoded = format!("*{}\r\n", elements.len());

                for element in elements {
                    encoded.push_str(&element.encode());
                }

                encoded
            }
        }
    }

    /// Number of bytes `encode` produces, without allocating.
    pub fn encoded_len(&self) -> usize {
        match self {
            RespValue::SimpleString(s) | RespValue::Error(s) => s.len() + 3,
            RespValue::Integer(i) => i.to_string().len() + 3,
            RespValue::BulkString(s) => s.len().to_string().len() + s.len() + 5,
            RespValue::NullBulkString => 5,
            RespValue::Array(elements) => {
                elements.len().to_string().len()
                    + 3
                    + elements.iter().map(RespValue::encoded_len).sum::<usize>()
            }
        }
    }

    /// Decodes a single frame from the start of `input`.
    ///
    /// # Returns
    ///
    /// * `Ok(Some((value, consumed)))` - A complete frame and the number of bytes it used
    /// * `Ok(None)` - The input holds only part of a frame; read more bytes and retry
    /// * `Err(RespError)` - The input is malformed
    pub fn decode(input: &[u8]) -> Result<Option<(RespValue, usize)>, RespError> {
        decode_at(input, 0, 0)
    }

    /// Iterates over the complete frames buffered in `buffer`, consuming the
    /// bytes of each frame as it is yielded. Iteration stops at the first
    /// partial frame (left in the buffer) or after the first error.
    pub fn frames(buffer: &mut BytesMut) -> Frames<'_> {
        Frames {
            buffer,
            failed: false,
        }
    }

    /// Decodes every complete frame in `buffer`.
    pub fn parse(buffer: &mut BytesMut) -> Result<Vec<RespValue>, RespError> {
        Self::frames(buffer)
            .map(|frame| frame.map(|(value, _)| value))
            .collect()
    }
}

/// Lazy frame iterator returned by [`RespValue::frames`].
pub struct Frames<'a> {
    buffer: &'a mut BytesMut,
    failed: bool,
}

impl Iterator for Frames<'_> {
    type Item = Result<(RespValue, usize), RespError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        match RespValue::decode(self.buffer) {
            Ok(Some((value, consumed))) => {
                self.buffer.advance(consumed);
                Some(Ok((value, consumed)))
            }
            Ok(None) => None,
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

/// Decodes the snapshot transfer that follows `+FULLRESYNC`:
/// `$<len>\r\n` and `len` raw bytes with no trailing CRLF.
pub fn decode_snapshot_payload(input: &[u8]) -> Result<Option<(Vec<u8>, usize)>, RespError> {
    let Some((line, start)) = read_line(input, 0)? else {
        return Ok(None);
    };

    let Some(length) = line.strip_prefix(b"$") else {
        return Err(RespError::InvalidBulkString);
    };

    let length = parse_number(length).map_err(|_| RespError::InvalidBulkString)?;
    let length = usize::try_from(length).map_err(|_| RespError::InvalidBulkString)?;

    if input.len() < start + length {
        return Ok(None);
    }

    Ok(Some((input[start..start + length].to_vec(), start + length)))
}

fn decode_at(
    input: &[u8],
    cursor: usize,
    depth: usize,
) -> Result<Option<(RespValue, usize)>, RespError> {
    let Some((line, next)) = read_line(input, cursor)? else {
        return Ok(None);
    };

    let Some((&prefix, content)) = line.split_first() else {
        return Err(RespError::EmptyFrame);
    };

    match prefix {
        b'+' => Ok(Some((RespValue::SimpleString(to_string(content)?), next))),
        b'-' => Ok(Some((RespValue::Error(to_string(content)?), next))),
        b':' => Ok(Some((RespValue::Integer(parse_number(content)?), next))),
        b'$' => {
            let length = parse_number(content).map_err(|_| RespError::InvalidBulkString)?;

            if length == -1 {
                return Ok(Some((RespValue::NullBulkString, next)));
            }

            let length = usize::try_from(length).map_err(|_| RespError::InvalidBulkString)?;
            let end = next + length;

            if input.len() < end + CRLF.len() {
                return Ok(None);
            }

            if &input[end..end + CRLF.len()] != CRLF {
                return Err(RespError::MissingTerminator);
            }

            let content = to_string(&input[next..end])?;

            Ok(Some((RespValue::BulkString(content), end + CRLF.len())))
        }
        b'*' => {
            if depth >= MAX_NESTING_DEPTH {
                return Err(RespError::NestingTooDeep(MAX_NESTING_DEPTH));
            }

            let count = parse_number(content).map_err(|_| RespError::InvalidArray)?;
            let count = usize::try_from(count).map_err(|_| RespError::InvalidArray)?;

            let mut elements = Vec::with_capacity(count.min(1024));
            let mut cursor = next;

            for _ in 0..count {
                let Some((element, element_end)) = decode_at(input, cursor, depth + 1)? else {
                    return Ok(None);
                };

                elements.push(element);
                cursor = element_end;
            }

            Ok(Some((RespValue::Array(elements), cursor)))
        }
        other => Err(RespError::UnknownRespType(other as char)),
    }
}

/// Returns the line starting at `cursor` without its terminator and the
/// position right after the terminator, or `None` if no full line is buffered.
fn read_line(input: &[u8], cursor: usize) -> Result<Option<(&[u8], usize)>, RespError> {
    let Some(remaining) = input.get(cursor..) else {
        return Ok(None);
    };

    let Some(newline) = remaining.iter().position(|&b| b == b'\n') else {
        return Ok(None);
    };

    if newline == 0 || remaining[newline - 1] != b'\r' {
        return Err(RespError::MissingTerminator);
    }

    Ok(Some((&remaining[..newline - 1], cursor + newline + 1)))
}

fn parse_number(content: &[u8]) -> Result<i64, RespError> {
    std::str::from_utf8(content)
        .map_err(|_| RespError::InvalidInteger)?
        .parse::<i64>()
        .map_err(|_| RespError::InvalidInteger)
}

fn to_string(content: &[u8]) -> Result<String, RespError> {
    String::from_utf8(content.to_vec()).map_err(|_| RespError::InvalidUtf8)
}
