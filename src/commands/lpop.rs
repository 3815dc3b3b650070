use crate::{
    commands::{command_error::CommandError, command_handler::CommandResult},
    key_value_store::KeyValueStore,
    resp::RespValue,
};

pub struct LpopArguments {
    key: String,
    count: Option<usize>,
}

impl LpopArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        match arguments.as_slice() {
            [key] => Ok(Self {
                key: key.clone(),
                count: None,
            }),
            [key, count] => Ok(Self {
                key: key.clone(),
                count: Some(count.parse::<usize>().map_err(|_| CommandError::NotAnInteger)?),
            }),
            _ => Err(CommandError::wrong_arity("lpop")),
        }
    }
}

/// Handles the Redis LPOP command.
///
/// Without a count the popped element is returned as a bulk string; with a
/// count, up to that many elements are returned as an array. A missing key
/// yields a null bulk string either way. The key is removed once its list
/// is empty.
pub async fn lpop(
    store: &KeyValueStore,
    arguments: Vec<String>,
) -> Result<CommandResult, CommandError> {
    let lpop_arguments = LpopArguments::parse(arguments)?;

    let mut keyspace = store.lock().await;

    let Some(list) = keyspace.list_mut(&lpop_arguments.key, false)? else {
        return Ok(CommandResult::Response(RespValue::NullBulkString));
    };

    let reply = match lpop_arguments.count {
        None => list
            .pop_front()
            .map_or(RespValue::NullBulkString, RespValue::BulkString),
        Some(count) => {
            let count = count.min(list.len());
            RespValue::array_of_bulk_strings(list.drain(..count))
        }
    };

    if list.is_empty() {
        keyspace.remove(&lpop_arguments.key);
    }

    Ok(CommandResult::Response(reply))
}
