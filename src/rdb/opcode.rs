use std::collections::VecDeque;

use crate::{
    key_value_store::{DataType, SortedSet},
    rdb::{
        encoding::{write_length, write_string, ByteReader},
        RdbError,
    },
};

pub const METADATA_OPCODE: u8 = 0xFA;
pub const RESIZE_DB_OPCODE: u8 = 0xFB;
pub const DATABASE_OPCODE: u8 = 0xFE;
pub const EXPIRATION_SECONDS_OPCODE: u8 = 0xFD;
pub const EXPIRATION_MILLISECONDS_OPCODE: u8 = 0xFC;
pub const END_OF_FILE_OPCODE: u8 = 0xFF;

pub const STRING_VALUE_TYPE: u8 = 0x00;
pub const LIST_VALUE_TYPE: u8 = 0x01;
pub const SORTED_SET_2_VALUE_TYPE: u8 = 0x05;

pub fn is_value_type(byte: u8) -> bool {
    matches!(
        byte,
        STRING_VALUE_TYPE | LIST_VALUE_TYPE | SORTED_SET_2_VALUE_TYPE
    )
}

pub fn read_value(reader: &mut ByteReader<'_>, value_type: u8) -> Result<DataType, RdbError> {
    match value_type {
        STRING_VALUE_TYPE => Ok(DataType::String(reader.read_string()?)),
        LIST_VALUE_TYPE => {
            let length = reader.read_length()?;
            let mut list = VecDeque::with_capacity(length.min(1024));

            for _ in 0..length {
                list.push_back(reader.read_string()?);
            }

            Ok(DataType::List(list))
        }
        SORTED_SET_2_VALUE_TYPE => {
            let length = reader.read_length()?;
            let mut set = SortedSet::default();

            for _ in 0..length {
                let member = reader.read_string()?;
                let score = f64::from_le_bytes(reader.read_array()?);

                if score.is_nan() {
                    return Err(RdbError::InvalidScore(member));
                }

                set.add(&member, score);
            }

            Ok(DataType::SortedSet(set))
        }
        other => Err(RdbError::UnknownOpcode(other)),
    }
}

/// Appends the type byte and payload of `data`. Returns `false` for values
/// that have no snapshot representation.
pub fn write_value(out: &mut Vec<u8>, key: &str, data: &DataType) -> bool {
    match data {
        DataType::String(value) => {
            out.push(STRING_VALUE_TYPE);
            write_string(out, key);
            write_string(out, value);
        }
        DataType::List(list) => {
            out.push(LIST_VALUE_TYPE);
            write_string(out, key);
            write_length(out, list.len());

            for item in list {
                write_string(out, item);
            }
        }
        DataType::SortedSet(set) => {
            out.push(SORTED_SET_2_VALUE_TYPE);
            write_string(out, key);
            write_length(out, set.len());

            for (member, score) in set.iter() {
                write_string(out, member);
                out.extend_from_slice(&score.to_le_bytes());
            }
        }
        DataType::Stream(_) => return false,
    }

    true
}
