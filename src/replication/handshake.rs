use bytes::{Buf, BytesMut};
use regex::Regex;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info};

use crate::{
    replication::ReplicationError,
    resp::{decode_snapshot_payload, RespValue},
};

/// What the master announced at the end of the handshake.
#[derive(Debug, PartialEq)]
pub struct HandshakeOutcome {
    pub replication_id: String,
    pub offset: u64,
    pub snapshot: Vec<u8>,
}

pub fn is_valid_replication_id(replication_id: &str) -> bool {
    Regex::new(r"^[a-zA-Z0-9]{40}$")
        .map(|re| re.is_match(replication_id))
        .unwrap_or(false)
}

/// Runs the replica side of the replication handshake on `stream`:
///
/// - `PING`, expecting `+PONG`
/// - `REPLCONF listening-port <port>`, expecting `+OK`
/// - `REPLCONF capa psync2`, expecting `+OK`
/// - `PSYNC ? -1`, expecting `+FULLRESYNC <id> <offset>` and a snapshot
///
/// Bytes received after the snapshot are left in `buffer`; they are the
/// first propagated commands.
pub async fn perform_handshake<S>(
    stream: &mut S,
    buffer: &mut BytesMut,
    listening_port: u16,
) -> Result<HandshakeOutcome, ReplicationError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let port = listening_port.to_string();

    let steps: [(&'static str, Vec<&str>, &str); 3] = [
        ("PING", vec!["PING"], "PONG"),
        ("REPLCONF listening-port", vec!["REPLCONF", "listening-port", &port], "OK"),
        ("REPLCONF capa", vec!["REPLCONF", "capa", "psync2"], "OK"),
    ];

    for (step, command, expected) in steps {
        let reply = send_command(stream, buffer, step, command).await?;

        if reply.as_str() != Some(expected) || !matches!(reply, RespValue::SimpleString(_)) {
            return Err(ReplicationError::UnexpectedReply {
                step,
                reply: reply.encode(),
            });
        }

        debug!(step, "handshake step acknowledged");
    }

    let reply = send_command(stream, buffer, "PSYNC", vec!["PSYNC", "?", "-1"]).await?;
    let (replication_id, offset) = parse_fullresync(&reply)?;

    let snapshot = loop {
        if let Some((snapshot, consumed)) = decode_snapshot_payload(buffer)? {
            buffer.advance(consumed);
            break snapshot;
        }

        if stream.read_buf(buffer).await? == 0 {
            return Err(ReplicationError::ConnectionClosed("snapshot transfer"));
        }
    };

    info!(
        replication_id = %replication_id,
        offset,
        snapshot_bytes = snapshot.len(),
        "handshake with master completed"
    );

    Ok(HandshakeOutcome {
        replication_id,
        offset,
        snapshot,
    })
}

fn parse_fullresync(reply: &RespValue) -> Result<(String, u64), ReplicationError> {
    let unexpected = || ReplicationError::UnexpectedReply {
        step: "PSYNC",
        reply: reply.encode(),
    };

    let RespValue::SimpleString(line) = reply else {
        return Err(unexpected());
    };

    let parts: Vec<&str> = line.split_whitespace().collect();

    let ["FULLRESYNC", replication_id, offset] = parts.as_slice() else {
        return Err(unexpected());
    };

    if !is_valid_replication_id(replication_id) {
        return Err(ReplicationError::InvalidReplicationId(replication_id.to_string()));
    }

    let offset = offset.parse::<u64>().map_err(|_| unexpected())?;

    Ok((replication_id.to_string(), offset))
}

async fn send_command<S>(
    stream: &mut S,
    buffer: &mut BytesMut,
    step: &'static str,
    command: Vec<&str>,
) -> Result<RespValue, ReplicationError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    stream
        .write_all(RespValue::array_of_bulk_strings(command).encode().as_bytes())
        .await?;
    stream.flush().await?;

    loop {
        if let Some((reply, consumed)) = RespValue::decode(buffer)? {
            buffer.advance(consumed);
            return Ok(reply);
        }

        if stream.read_buf(buffer).await? == 0 {
            return Err(ReplicationError::ConnectionClosed(step));
        }
    }
}
