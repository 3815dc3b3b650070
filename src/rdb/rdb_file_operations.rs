use std::path::Path;

use tracing::{debug, info};

use crate::{
    key_value_store::Value,
    rdb::{
        encoding::{write_length, write_string},
        opcode::{
            write_value, DATABASE_OPCODE, END_OF_FILE_OPCODE, EXPIRATION_MILLISECONDS_OPCODE,
            METADATA_OPCODE, RESIZE_DB_OPCODE,
        },
        RdbError, RdbParser, Snapshot,
    },
};

const HEADER: &[u8] = b"REDIS0011";

/// Reads and decodes the snapshot at `dir/filename`.
///
/// # Returns
///
/// * `Ok(Some(Snapshot))` - The file exists and was decoded
/// * `Ok(None)` - There is no file at that path
/// * `Err(RdbError)` - The file could not be read or decoded
pub async fn load_rdb_file(dir: &str, filename: &str) -> Result<Option<Snapshot>, RdbError> {
    let path = Path::new(dir).join(filename);

    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no snapshot file to load");
            return Ok(None);
        }
        Err(e) => return Err(e.into()),
    };

    let snapshot = RdbParser::new(&bytes).parse()?;
    info!(path = %path.display(), keys = snapshot.entries.len(), "snapshot file decoded");

    Ok(Some(snapshot))
}

/// Encodes `entries` in snapshot format. Stream values are skipped and the
/// checksum trailer is left zeroed, which readers treat as "not computed".
pub fn encode_snapshot(entries: &[(String, Value)]) -> Vec<u8> {
    let mut out = Vec::with_capacity(64);
    out.extend_from_slice(HEADER);

    out.push(METADATA_OPCODE);
    write_string(&mut out, "redis-ver");
    write_string(&mut out, "7.2.0");

    let mut body = Vec::new();
    let mut written = 0;
    let mut expiring = 0;

    for (key, value) in entries {
        let mut entry = Vec::new();

        if let Some(expiration) = value.expiration {
            entry.push(EXPIRATION_MILLISECONDS_OPCODE);
            entry.extend_from_slice(&(expiration.max(0) as u64).to_le_bytes());
        }

        if write_value(&mut entry, key, &value.data) {
            written += 1;
            expiring += usize::from(value.expiration.is_some());
            body.extend_from_slice(&entry);
        }
    }

    if written > 0 {
        out.push(DATABASE_OPCODE);
        write_length(&mut out, 0);
        out.push(RESIZE_DB_OPCODE);
        write_length(&mut out, written);
        write_length(&mut out, expiring);
        out.extend_from_slice(&body);
    }

    out.push(END_OF_FILE_OPCODE);
    out.extend_from_slice(&[0; 8]);

    out
}
