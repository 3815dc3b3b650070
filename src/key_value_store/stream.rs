use std::{fmt, str::FromStr};

use thiserror::Error;

#[derive(Error, Debug, PartialEq, Clone)]
pub enum StreamError {
    #[error("ERR The ID specified in XADD must be greater than 0-0")]
    ZeroId,
    #[error("ERR The ID specified in XADD is equal or smaller than the target stream top item")]
    NotIncreasing,
    #[error("ERR Invalid stream ID specified as stream command argument")]
    InvalidId,
}

/// Entry id made of a millisecond timestamp and a sequence number.
/// Ids compare by timestamp first, then by sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct StreamId {
    pub ms: u64,
    pub seq: u64,
}

impl StreamId {
    pub const MIN: StreamId = StreamId { ms: 0, seq: 0 };
    pub const MAX: StreamId = StreamId {
        ms: u64::MAX,
        seq: u64::MAX,
    };

    pub fn new(ms: u64, seq: u64) -> Self {
        Self { ms, seq }
    }

    /// Parses a range bound. `-` and `+` stand for the start and end of the
    /// stream, and a bare timestamp takes the lowest sequence for a lower
    /// bound and the highest for an upper bound.
    pub fn parse_bound(input: &str, upper: bool) -> Result<Self, StreamError> {
        match input {
            "-" => Ok(Self::MIN),
            "+" => Ok(Self::MAX),
            _ => match input.split_once('-') {
                Some(_) => input.parse(),
                None => {
                    let ms = input.parse::<u64>().map_err(|_| StreamError::InvalidId)?;
                    let seq = if upper { u64::MAX } else { 0 };
                    Ok(Self { ms, seq })
                }
            },
        }
    }

    /// The id right after this one within the same millisecond.
    fn next_seq(self) -> Result<Self, StreamError> {
        let seq = self.seq.checked_add(1).ok_or(StreamError::NotIncreasing)?;
        Ok(Self { ms: self.ms, seq })
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.ms, self.seq)
    }
}

impl FromStr for StreamId {
    type Err = StreamError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let (ms, seq) = input.split_once('-').ok_or(StreamError::InvalidId)?;

        Ok(Self {
            ms: ms.parse().map_err(|_| StreamError::InvalidId)?,
            seq: seq.parse().map_err(|_| StreamError::InvalidId)?,
        })
    }
}

/// How XADD asks for the id of a new entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdSpec {
    /// `ms-seq`
    Explicit(StreamId),
    /// `ms-*`
    WildcardSeq(u64),
    /// `*`
    Auto,
}

impl FromStr for IdSpec {
    type Err = StreamError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        if input == "*" {
            return Ok(IdSpec::Auto);
        }

        match input.split_once('-') {
            Some((ms, "*")) => Ok(IdSpec::WildcardSeq(
                ms.parse().map_err(|_| StreamError::InvalidId)?,
            )),
            Some(_) => Ok(IdSpec::Explicit(input.parse()?)),
            None => Err(StreamError::InvalidId),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StreamEntry {
    pub id: StreamId,
    pub fields: Vec<(String, String)>,
}

/// Append-only log of entries with strictly increasing ids.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Stream {
    entries: Vec<StreamEntry>,
}

impl Stream {
    pub fn last_id(&self) -> Option<StreamId> {
        self.entries.last().map(|entry| entry.id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolves `requested` against the current top of the stream and appends.
    ///
    /// # Arguments
    ///
    /// * `requested` - Requested id
    /// * `fields` - Field/value pairs in insertion order
    /// * `now_ms` - Wall clock used by fully automatic ids
    ///
    /// # Returns
    ///
    /// * `Ok(StreamId)` - The id assigned to the new entry
    /// * `Err(StreamError::ZeroId)` - The resolved id is `0-0`
    /// * `Err(StreamError::NotIncreasing)` - The resolved id does not exceed the top entry
    pub fn append(
        &mut self,
        requested: IdSpec,
        fields: Vec<(String, String)>,
        now_ms: u64,
    ) -> Result<StreamId, StreamError> {
        let last = self.last_id();

        let id = match requested {
            IdSpec::Explicit(id) => id,
            IdSpec::WildcardSeq(ms) => match last {
                Some(last) if last.ms == ms => last.next_seq()?,
                Some(last) if last.ms > ms => return Err(StreamError::NotIncreasing),
                _ if ms == 0 => StreamId::new(0, 1),
                _ => StreamId::new(ms, 0),
            },
            IdSpec::Auto => match last {
                // Clock went backwards or several appends share a millisecond.
                Some(last) if last.ms >= now_ms => last.next_seq()?,
                _ => StreamId::new(now_ms, 0),
            },
        };

        if id == StreamId::MIN {
            return Err(StreamError::ZeroId);
        }

        if last.is_some_and(|last| id <= last) {
            return Err(StreamError::NotIncreasing);
        }

        self.entries.push(StreamEntry { id, fields });

        Ok(id)
    }

    /// Entries with ids between `lower` and `upper`. `upper` is always
    /// inclusive.
    pub fn range(&self, lower: StreamId, upper: StreamId, lower_inclusive: bool) -> &[StreamEntry] {
        let start = self.entries.partition_point(|entry| {
            if lower_inclusive {
                entry.id < lower
            } else {
                entry.id <= lower
            }
        });
        let end = self.entries.partition_point(|entry| entry.id <= upper);

        if start >= end {
            return &[];
        }

        &self.entries[start..end]
    }

    pub fn entries(&self) -> &[StreamEntry] {
        &self.entries
    }
}
