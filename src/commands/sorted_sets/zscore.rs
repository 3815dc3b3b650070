use crate::{
    commands::{command_error::CommandError, command_handler::CommandResult},
    key_value_store::KeyValueStore,
    resp::RespValue,
};

use super::format_score;

pub struct ZscoreArguments {
    key: String,
    member: String,
}

impl ZscoreArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        let [key, member]: [String; 2] = arguments
            .try_into()
            .map_err(|_| CommandError::wrong_arity("zscore"))?;

        Ok(Self { key, member })
    }
}

pub async fn zscore(
    store: &KeyValueStore,
    arguments: Vec<String>,
) -> Result<CommandResult, CommandError> {
    let zscore_arguments = ZscoreArguments::parse(arguments)?;

    let mut keyspace = store.lock().await;

    let score = keyspace
        .sorted_set(&zscore_arguments.key)?
        .and_then(|set| set.score(&zscore_arguments.member));

    Ok(CommandResult::Response(match score {
        Some(score) => RespValue::BulkString(format_score(score)),
        None => RespValue::NullBulkString,
    }))
}
