//! Per-connection loops.
//!
//! A client connection reads frames, runs them through its own
//! [`CommandDispatcher`] and writes the replies back. The same connection
//! may turn into a replica link after `PSYNC`, in which case the write half
//! is shared with the replication coordinator. Propagation itself happens in
//! the dispatcher, under the write-order lock.
//!
//! On a replica, the link to the master is served by
//! [`handle_master_connection`].

use std::sync::Arc;

use anyhow::{bail, Context};
use bytes::BytesMut;
use tokio::{
    io::{split, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt},
    sync::Mutex,
    task::JoinSet,
};
use tracing::{debug, info, warn};

use crate::{
    commands::{CommandDispatcher, DispatchOutcome},
    pubsub::Subscription,
    rdb::RdbParser,
    replication::{perform_handshake, SharedWriter},
    resp::RespValue,
    state::State,
};

const READ_BUFFER_CAPACITY: usize = 4096;

/// Serves one client until it disconnects or sends a malformed frame.
pub async fn handle_client_connection<S>(stream: S, address: String, state: State)
where
    S: AsyncRead + AsyncWrite + Send + Unpin + 'static,
{
    let (mut reader, writer) = split(stream);
    let writer: SharedWriter = Arc::new(Mutex::new(Box::new(writer)));

    let mut buffer = BytesMut::with_capacity(READ_BUFFER_CAPACITY);
    let mut dispatcher = CommandDispatcher::new(state.clone());
    let mut forwarders = JoinSet::new();
    let mut is_replica_link = false;

    debug!(client = %address, "client connected");

    'connection: loop {
        match reader.read_buf(&mut buffer).await {
            Ok(0) => break,
            Ok(_) => (),
            Err(e) => {
                debug!(client = %address, error = %e, "read failed");
                break;
            }
        }

        let frames: Vec<_> = RespValue::frames(&mut buffer).collect();

        for frame in frames {
            let (input, size) = match frame {
                Ok(frame) => frame,
                Err(e) => {
                    warn!(client = %address, error = %e, "protocol error, closing connection");
                    let _ = write_value(&writer, &e.as_resp()).await;
                    break 'connection;
                }
            };

            let outcome = dispatcher.dispatch(input, size).await;
            is_replica_link |= outcome.keep_connection_open();
            let quit = outcome.close_connection;

            if let Err(e) =
                apply_outcome(&state, &address, &writer, &mut forwarders, outcome).await
            {
                debug!(client = %address, error = %e, "closing connection");
                break 'connection;
            }

            if quit {
                break 'connection;
            }
        }
    }

    forwarders.shutdown().await;
    dispatcher.close().await;

    if is_replica_link {
        state.replication.detach_replica(&address).await;
    }

    debug!(client = %address, "client disconnected");
}

async fn apply_outcome(
    state: &State,
    address: &str,
    writer: &SharedWriter,
    forwarders: &mut JoinSet<()>,
    outcome: DispatchOutcome,
) -> anyhow::Result<()> {
    for reply in &outcome.replies {
        write_value(writer, reply).await?;
    }

    for subscription in outcome.subscriptions {
        forwarders.spawn(forward_messages(subscription, Arc::clone(writer)));
    }

    if let Some(offset) = outcome.acknowledged_offset {
        state.replication.record_acknowledgment(address, offset).await;
    }

    if outcome.promote_to_replica {
        state
            .replication
            .attach_replica(address, Arc::clone(writer), &state.store)
            .await?;
    }

    Ok(())
}

/// Writes every message of a channel subscription to the subscriber until
/// either side goes away.
async fn forward_messages(mut subscription: Subscription, writer: SharedWriter) {
    while let Some(message) = subscription.recv().await {
        if write_value(&writer, &message).await.is_err() {
            break;
        }
    }

    subscription.close();
}

async fn write_value(writer: &SharedWriter, value: &RespValue) -> tokio::io::Result<()> {
    let mut writer_guard = writer.lock().await;
    writer_guard.write_all(value.encode().as_bytes()).await?;
    writer_guard.flush().await?;

    Ok(())
}

/// Runs the replica side of replication over `stream`: handshake, snapshot
/// load, then every propagated command is applied in order.
///
/// Only `REPLCONF GETACK` is answered, with the offset reached before it.
/// The replication offset grows by the size of each applied frame.
pub async fn handle_master_connection<S>(mut stream: S, state: State) -> anyhow::Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut buffer = BytesMut::with_capacity(READ_BUFFER_CAPACITY);

    let handshake = perform_handshake(&mut stream, &mut buffer, state.config.port)
        .await
        .context("replication handshake failed")?;

    match RdbParser::new(&handshake.snapshot).parse() {
        Ok(snapshot) => {
            let loaded = state.store.load(snapshot.entries).await;
            info!(keys = loaded, "snapshot from master loaded");
        }
        Err(e) => warn!(error = %e, "snapshot from master could not be decoded, starting empty"),
    }

    state
        .replication
        .follow_master(handshake.replication_id, handshake.offset)
        .await;

    let mut dispatcher = CommandDispatcher::for_master_link(state.clone());

    loop {
        let frames: Vec<_> = RespValue::frames(&mut buffer).collect();

        for frame in frames {
            let (input, size) = frame.context("malformed frame from master")?;
            let answers = is_getack(&input);

            let outcome = dispatcher.dispatch(input, size).await;
            state.replication.offset().advance(size);

            if answers {
                for reply in &outcome.replies {
                    stream.write_all(reply.encode().as_bytes()).await?;
                }
                stream.flush().await?;
            }
        }

        if stream.read_buf(&mut buffer).await? == 0 {
            break;
        }
    }

    dispatcher.close().await;

    if !buffer.is_empty() {
        bail!("master closed the link mid-frame");
    }

    info!("master closed the replication link");

    Ok(())
}

fn is_getack(input: &RespValue) -> bool {
    let RespValue::Array(elements) = input else {
        return false;
    };

    matches!(
        (
            elements.first().and_then(RespValue::as_str),
            elements.get(1).and_then(RespValue::as_str),
        ),
        (Some(command), Some(option))
            if command.eq_ignore_ascii_case("REPLCONF") && option.eq_ignore_ascii_case("GETACK")
    )
}
