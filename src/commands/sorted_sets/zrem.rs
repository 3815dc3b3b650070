use crate::{
    commands::{command_error::CommandError, command_handler::CommandResult},
    key_value_store::KeyValueStore,
    resp::RespValue,
};

pub struct ZremArguments {
    key: String,
    members: Vec<String>,
}

impl ZremArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        let mut arguments = arguments.into_iter();

        let Some(key) = arguments.next() else {
            return Err(CommandError::wrong_arity("zrem"));
        };

        let members: Vec<String> = arguments.collect();

        if members.is_empty() {
            return Err(CommandError::wrong_arity("zrem"));
        }

        Ok(Self { key, members })
    }
}

/// Handles the Redis ZREM command. The key is deleted once its set is
/// empty.
pub async fn zrem(
    store: &KeyValueStore,
    arguments: Vec<String>,
) -> Result<CommandResult, CommandError> {
    let zrem_arguments = ZremArguments::parse(arguments)?;

    let mut keyspace = store.lock().await;

    let Some(set) = keyspace.sorted_set_mut(&zrem_arguments.key, false)? else {
        return Ok(CommandResult::Response(RespValue::Integer(0)));
    };

    let removed = zrem_arguments
        .members
        .iter()
        .filter(|member| set.remove(member))
        .count();

    if set.is_empty() {
        keyspace.remove(&zrem_arguments.key);
    }

    Ok(CommandResult::Response(RespValue::Integer(removed as i64)))
}
