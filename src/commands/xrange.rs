use crate::{
    commands::{
        command_error::CommandError, command_handler::CommandResult,
        stream_utils::entries_to_resp,
    },
    key_value_store::{KeyValueStore, StreamId},
    resp::RespValue,
};

pub struct XrangeArguments {
    key: String,
    start: StreamId,
    end: StreamId,
    count: Option<usize>,
}

impl XrangeArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        let count = match arguments.len() {
            3 => None,
            5 if arguments[3].eq_ignore_ascii_case("count") => Some(
                arguments[4]
                    .parse::<usize>()
                    .map_err(|_| CommandError::NotAnInteger)?,
            ),
            5 => return Err(CommandError::SyntaxError),
            _ => return Err(CommandError::wrong_arity("xrange")),
        };

        Ok(Self {
            key: arguments[0].clone(),
            start: StreamId::parse_bound(&arguments[1], false)?,
            end: StreamId::parse_bound(&arguments[2], true)?,
            count,
        })
    }
}

/// Handles the Redis XRANGE command. Both bounds are inclusive and accept
/// `-`, `+` and bare millisecond timestamps.
pub async fn xrange(
    store: &KeyValueStore,
    arguments: Vec<String>,
) -> Result<CommandResult, CommandError> {
    let xrange_arguments = XrangeArguments::parse(arguments)?;

    let mut keyspace = store.lock().await;

    let Some(stream) = keyspace.stream(&xrange_arguments.key)? else {
        return Ok(CommandResult::Response(RespValue::Array(Vec::new())));
    };

    let entries = stream.range(xrange_arguments.start, xrange_arguments.end, true);
    let entries = match xrange_arguments.count {
        Some(count) => &entries[..count.min(entries.len())],
        None => entries,
    };

    Ok(CommandResult::Response(entries_to_resp(entries)))
}
