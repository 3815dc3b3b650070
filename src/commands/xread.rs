use std::time::Duration;

use tokio::{sync::mpsc, task::JoinSet, time::Instant};

use crate::{
    commands::{
        command_error::CommandError, command_handler::CommandResult,
        stream_utils::entries_to_resp,
    },
    key_value_store::{KeyValueStore, StreamId},
    pubsub::stream_topic,
    resp::RespValue,
    state::State,
};

/// Start position requested for one stream.
#[derive(Debug, Clone, PartialEq)]
enum ReadFrom {
    /// Entries after this id.
    After(StreamId),
    /// `$`: entries added after the call started.
    Latest,
}

/// Represents the parsed arguments for the XREAD command.
///
/// Format: `XREAD [COUNT n] [BLOCK milliseconds] STREAMS key1 key2 ... id1 id2 ...`
#[derive(Debug, PartialEq)]
pub struct XreadArguments {
    count: Option<usize>,
    /// `Some(0)` blocks until data arrives.
    block_ms: Option<u64>,
    streams: Vec<(String, ReadFrom)>,
}

impl XreadArguments {
    /// Parses XREAD arguments.
    ///
    /// # Returns
    ///
    /// * `Ok(XreadArguments)` - Successfully parsed arguments
    /// * `Err(CommandError::SyntaxError)` - If `STREAMS` is missing or an option is unknown
    /// * `Err(CommandError::WrongNumberOfArguments)` - If keys and ids are unbalanced
    /// * `Err(CommandError::InvalidTimeout)` - If the block duration is not a non-negative integer
    /// * `Err(CommandError::Stream)` - If an id is malformed
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        let mut count = None;
        let mut block_ms = None;
        let mut index = 0;

        loop {
            let Some(option) = arguments.get(index) else {
                return Err(CommandError::SyntaxError);
            };

            match option.to_uppercase().as_str() {
                "STREAMS" => {
                    index += 1;
                    break;
                }
                "BLOCK" => {
                    let duration = arguments.get(index + 1).ok_or(CommandError::SyntaxError)?;
                    block_ms = Some(
                        duration
                            .parse::<u64>()
                            .map_err(|_| CommandError::InvalidTimeout)?,
                    );
                    index += 2;
                }
                "COUNT" => {
                    let value = arguments.get(index + 1).ok_or(CommandError::SyntaxError)?;
                    count = Some(
                        value
                            .parse::<usize>()
                            .map_err(|_| CommandError::NotAnInteger)?,
                    );
                    index += 2;
                }
                _ => return Err(CommandError::SyntaxError),
            }
        }

        let rest = &arguments[index..];

        if rest.is_empty() || rest.len() % 2 != 0 {
            return Err(CommandError::wrong_arity("xread"));
        }

        let (keys, ids) = rest.split_at(rest.len() / 2);

        let streams = keys
            .iter()
            .zip(ids)
            .map(|(key, id)| -> Result<(String, ReadFrom), CommandError> {
                let from = match id.as_str() {
                    "$" => ReadFrom::Latest,
                    id => ReadFrom::After(StreamId::parse_bound(id, false)?),
                };

                Ok((key.clone(), from))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            count,
            block_ms,
            streams,
        })
    }
}

/// Handles the Redis XREAD command.
///
/// Returns, for every stream holding entries newer than its requested id,
/// `[key, entries]`. Without `BLOCK` an empty result is a null bulk string.
/// With `BLOCK` the caller subscribes to the streams before reading them and
/// waits for an `XADD` wake-up until the timeout (0 waits forever).
pub async fn xread(state: &State, arguments: Vec<String>) -> Result<CommandResult, CommandError> {
    read(state, XreadArguments::parse(arguments)?).await
}

/// XREAD as run inside a transaction: `BLOCK` is ignored and an empty
/// result is a null bulk string.
pub async fn xread_without_blocking(
    state: &State,
    arguments: Vec<String>,
) -> Result<CommandResult, CommandError> {
    let mut xread_arguments = XreadArguments::parse(arguments)?;
    xread_arguments.block_ms = None;

    read(state, xread_arguments).await
}

async fn read(
    state: &State,
    xread_arguments: XreadArguments,
) -> Result<CommandResult, CommandError> {
    let mut subscriptions = Vec::new();

    if xread_arguments.block_ms.is_some() {
        for (key, _) in &xread_arguments.streams {
            subscriptions.push(state.broker.subscribe(&stream_topic(key), false).await?);
        }
    }

    let bounds = resolve_bounds(&state.store, &xread_arguments.streams).await?;

    let reply = read_streams(&state.store, &bounds, xread_arguments.count).await?;

    let Some(block_ms) = xread_arguments.block_ms else {
        return Ok(CommandResult::Response(
            reply.unwrap_or(RespValue::NullBulkString),
        ));
    };

    if let Some(reply) = reply {
        return Ok(CommandResult::Response(reply));
    }

    // One watcher per stream forwards wake-ups into a single channel.
    let (wake, mut woken) = mpsc::channel::<()>(1);
    let mut watchers = JoinSet::new();

    for mut subscription in subscriptions {
        let wake = wake.clone();

        watchers.spawn(async move {
            while subscription.recv().await.is_some() {
                if wake.send(()).await.is_err() {
                    break;
                }
            }
        });
    }

    drop(wake);

    let deadline = (block_ms > 0).then(|| Instant::now() + Duration::from_millis(block_ms));

    loop {
        let woke = match deadline {
            None => woken.recv().await,
            Some(deadline) => tokio::time::timeout_at(deadline, woken.recv())
                .await
                .ok()
                .flatten(),
        };

        if woke.is_none() {
            return Ok(CommandResult::Response(RespValue::NullBulkString));
        }

        if let Some(reply) = read_streams(&state.store, &bounds, xread_arguments.count).await? {
            return Ok(CommandResult::Response(reply));
        }
    }
}

/// Replaces `$` with the top id of each stream at call time.
async fn resolve_bounds(
    store: &KeyValueStore,
    streams: &[(String, ReadFrom)],
) -> Result<Vec<(String, StreamId)>, CommandError> {
    let mut keyspace = store.lock().await;
    let mut bounds = Vec::with_capacity(streams.len());

    for (key, from) in streams {
        let after = match from {
            ReadFrom::After(id) => *id,
            ReadFrom::Latest => keyspace
                .stream(key)?
                .and_then(|stream| stream.last_id())
                .unwrap_or(StreamId::MIN),
        };

        bounds.push((key.clone(), after));
    }

    Ok(bounds)
}

/// Reads the entries after each bound, or `None` when no stream has any.
async fn read_streams(
    store: &KeyValueStore,
    bounds: &[(String, StreamId)],
    count: Option<usize>,
) -> Result<Option<RespValue>, CommandError> {
    let mut keyspace = store.lock().await;
    let mut result = Vec::new();

    for (key, after) in bounds {
        let Some(stream) = keyspace.stream(key)? else {
            continue;
        };

        let entries = stream.range(*after, StreamId::MAX, false);
        let entries = match count {
            Some(count) => &entries[..count.min(entries.len())],
            None => entries,
        };

        if entries.is_empty() {
            continue;
        }

        result.push(RespValue::Array(vec![
            RespValue::BulkString(key.clone()),
            entries_to_resp(entries),
        ]));
    }

    if result.is_empty() {
        return Ok(None);
    }

    Ok(Some(RespValue::Array(result)))
}
