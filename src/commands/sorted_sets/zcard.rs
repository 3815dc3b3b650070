use crate::{
    commands::{command_error::CommandError, command_handler::CommandResult},
    key_value_store::KeyValueStore,
    resp::RespValue,
};

pub struct ZcardArguments {
    key: String,
}

impl ZcardArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        let [key]: [String; 1] = arguments
            .try_into()
            .map_err(|_| CommandError::wrong_arity("zcard"))?;

        Ok(Self { key })
    }
}

pub async fn zcard(
    store: &KeyValueStore,
    arguments: Vec<String>,
) -> Result<CommandResult, CommandError> {
    let zcard_arguments = ZcardArguments::parse(arguments)?;

    let mut keyspace = store.lock().await;
    let size = keyspace
        .sorted_set(&zcard_arguments.key)?
        .map_or(0, |set| set.len());

    Ok(CommandResult::Response(RespValue::Integer(size as i64)))
}
