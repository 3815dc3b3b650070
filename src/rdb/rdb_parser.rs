use jiff::Timestamp;

use crate::{
    key_value_store::Value,
    rdb::{
        encoding::ByteReader,
        opcode::{
            is_value_type, read_value, DATABASE_OPCODE, END_OF_FILE_OPCODE,
            EXPIRATION_MILLISECONDS_OPCODE, EXPIRATION_SECONDS_OPCODE, METADATA_OPCODE,
            RESIZE_DB_OPCODE,
        },
        RdbError,
    },
};

const MAGIC_STRING: &[u8] = b"REDIS";

/// Everything read from a snapshot.
#[derive(Debug, Default, PartialEq)]
pub struct Snapshot {
    pub version: u32,
    pub metadata: Vec<(String, String)>,
    pub entries: Vec<(String, Value)>,
    pub checksum: Option<[u8; 8]>,
}

pub struct RdbParser<'a> {
    reader: ByteReader<'a>,
}

impl<'a> RdbParser<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            reader: ByteReader::new(bytes),
        }
    }

    /// Decodes a complete snapshot.
    ///
    /// # Returns
    ///
    /// * `Ok(Snapshot)` - Header data and the `(key, value)` pairs, expiries in epoch milliseconds
    /// * `Err(RdbError)` - Truncated data, an unsupported encoding, or not a snapshot at all
    pub fn parse(mut self) -> Result<Snapshot, RdbError> {
        let mut snapshot = Snapshot {
            version: self.parse_header()?,
            ..Snapshot::default()
        };

        while !self.reader.is_empty() {
            let opcode = self.reader.read_byte()?;

            match opcode {
                METADATA_OPCODE => {
                    let key = self.reader.read_string()?;
                    let value = self.reader.read_string()?;
                    snapshot.metadata.push((key, value));
                }
                DATABASE_OPCODE => {
                    self.reader.read_length()?;
                }
                RESIZE_DB_OPCODE => {
                    self.reader.read_length()?;
                    self.reader.read_length()?;
                }
                EXPIRATION_SECONDS_OPCODE => {
                    let seconds = u32::from_le_bytes(self.reader.read_array()?) as i64;
                    let expiration = Timestamp::from_second(seconds)
                        .map_err(|e| RdbError::InvalidExpiration(e.to_string()))?
                        .as_millisecond();

                    let value_type = self.reader.read_byte()?;
                    snapshot
                        .entries
                        .push(self.parse_entry(value_type, Some(expiration))?);
                }
                EXPIRATION_MILLISECONDS_OPCODE => {
                    let milliseconds = u64::from_le_bytes(self.reader.read_array()?);
                    let expiration = i64::try_from(milliseconds)
                        .map_err(|e| RdbError::InvalidExpiration(e.to_string()))
                        .and_then(|ms| {
                            Timestamp::from_millisecond(ms)
                                .map_err(|e| RdbError::InvalidExpiration(e.to_string()))
                        })?
                        .as_millisecond();

                    let value_type = self.reader.read_byte()?;
                    snapshot
                        .entries
                        .push(self.parse_entry(value_type, Some(expiration))?);
                }
                END_OF_FILE_OPCODE => {
                    // Older versions end without a checksum.
                    snapshot.checksum = self.reader.read_array().ok();
                    break;
                }
                value_type if is_value_type(value_type) => {
                    snapshot.entries.push(self.parse_entry(value_type, None)?);
                }
                other => return Err(RdbError::UnknownOpcode(other)),
            }
        }

        Ok(snapshot)
    }

    fn parse_header(&mut self) -> Result<u32, RdbError> {
        if self.reader.read_slice(MAGIC_STRING.len())? != MAGIC_STRING {
            return Err(RdbError::InvalidMagicString);
        }

        let version = String::from_utf8_lossy(self.reader.read_slice(4)?).to_string();

        match version.parse::<u32>() {
            Ok(number) if (1..=12).contains(&number) => Ok(number),
            _ => Err(RdbError::UnsupportedVersion(version)),
        }
    }

    fn parse_entry(
        &mut self,
        value_type: u8,
        expiration: Option<i64>,
    ) -> Result<(String, Value), RdbError> {
        let key = self.reader.read_string()?;
        let data = read_value(&mut self.reader, value_type)?;

        Ok((key, Value::with_expiration(data, expiration)))
    }
}
