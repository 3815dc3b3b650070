use crate::{
    commands::{command_error::CommandError, command_handler::CommandResult},
    key_value_store::KeyValueStore,
    resp::RespValue,
};

pub struct ZrankArguments {
    key: String,
    member: String,
}

impl ZrankArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        let [key, member]: [String; 2] = arguments
            .try_into()
            .map_err(|_| CommandError::wrong_arity("zrank"))?;

        Ok(Self { key, member })
    }
}

pub async fn zrank(
    store: &KeyValueStore,
    arguments: Vec<String>,
) -> Result<CommandResult, CommandError> {
    let zrank_arguments = ZrankArguments::parse(arguments)?;

    let mut keyspace = store.lock().await;

    let rank = keyspace
        .sorted_set(&zrank_arguments.key)?
        .and_then(|set| set.rank(&zrank_arguments.member));

    Ok(CommandResult::Response(match rank {
        Some(rank) => RespValue::Integer(rank as i64),
        None => RespValue::NullBulkString,
    }))
}
