use crate::rdb::RdbError;

/// Cursor over a snapshot buffer.
pub struct ByteReader<'a> {
    bytes: &'a [u8],
    cursor: usize,
}

/// Decoded length prefix. The `0b11` prefix announces a special string
/// encoding instead of a length.
#[derive(Debug, PartialEq)]
enum LengthEncoding {
    Length(usize),
    Int8,
    Int16,
    Int32,
    LzfCompressed,
}

impl<'a> ByteReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, cursor: 0 }
    }

    pub fn is_empty(&self) -> bool {
        self.cursor >= self.bytes.len()
    }

    pub fn read_slice(&mut self, len: usize) -> Result<&'a [u8], RdbError> {
        let end = self.cursor.checked_add(len).ok_or(RdbError::UnexpectedEof)?;
        let slice = self.bytes.get(self.cursor..end).ok_or(RdbError::UnexpectedEof)?;
        self.cursor = end;

        Ok(slice)
    }

    pub fn read_byte(&mut self) -> Result<u8, RdbError> {
        Ok(self.read_slice(1)?[0])
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], RdbError> {
        self.read_slice(N)?
            .try_into()
            .map_err(|_| RdbError::UnexpectedEof)
    }

    fn read_length_encoding(&mut self) -> Result<LengthEncoding, RdbError> {
        let byte = self.read_byte()?;

        // The two most significant bits select the format.
        match byte >> 6 {
            0b00 => Ok(LengthEncoding::Length((byte & 0b0011_1111) as usize)),
            0b01 => {
                let low = self.read_byte()? as usize;
                let high = (byte & 0b0011_1111) as usize;

                Ok(LengthEncoding::Length((high << 8) | low))
            }
            0b10 => match byte {
                0x80 => Ok(LengthEncoding::Length(
                    u32::from_be_bytes(self.read_array()?) as usize,
                )),
                0x81 => Ok(LengthEncoding::Length(
                    u64::from_be_bytes(self.read_array()?) as usize,
                )),
                other => Err(RdbError::InvalidLengthEncoding(other)),
            },
            _ => match byte & 0b0011_1111 {
                0 => Ok(LengthEncoding::Int8),
                1 => Ok(LengthEncoding::Int16),
                2 => Ok(LengthEncoding::Int32),
                3 => Ok(LengthEncoding::LzfCompressed),
                _ => Err(RdbError::InvalidLengthEncoding(byte)),
            },
        }
    }

    pub fn read_length(&mut self) -> Result<usize, RdbError> {
        match self.read_length_encoding()? {
            LengthEncoding::Length(length) => Ok(length),
            _ => Err(RdbError::InvalidLengthEncoding(
                self.bytes[self.cursor.saturating_sub(1)],
            )),
        }
    }

    /// Reads a string value. Integer encoded strings are returned in their
    /// decimal form.
    pub fn read_string(&mut self) -> Result<String, RdbError> {
        match self.read_length_encoding()? {
            LengthEncoding::Length(length) => String::from_utf8(self.read_slice(length)?.to_vec())
                .map_err(|_| RdbError::InvalidUtf8),
            LengthEncoding::Int8 => Ok(i8::from_le_bytes(self.read_array()?).to_string()),
            LengthEncoding::Int16 => Ok(i16::from_le_bytes(self.read_array()?).to_string()),
            LengthEncoding::Int32 => Ok(i32::from_le_bytes(self.read_array()?).to_string()),
            LengthEncoding::LzfCompressed => Err(RdbError::UnsupportedStringEncoding),
        }
    }
}

pub fn write_length(out: &mut Vec<u8>, length: usize) {
    if length < 1 << 6 {
        out.push(length as u8);
    } else if length < 1 << 14 {
        out.push(0b0100_0000 | (length >> 8) as u8);
        out.push((length & 0xFF) as u8);
    } else if let Ok(length) = u32::try_from(length) {
        out.push(0x80);
        out.extend_from_slice(&length.to_be_bytes());
    } else {
        out.push(0x81);
        out.extend_from_slice(&(length as u64).to_be_bytes());
    }
}

pub fn write_string(out: &mut Vec<u8>, value: &str) {
    write_length(out, value.len());
    out.extend_from_slice(value.as_bytes());
}
