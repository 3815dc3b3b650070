use crate::{
    commands::{command_error::CommandError, command_handler::CommandResult},
    key_value_store::KeyValueStore,
    resp::RespValue,
};

pub struct TypeArguments {
    key: String,
}

impl TypeArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        let [key]: [String; 1] = arguments
            .try_into()
            .map_err(|_| CommandError::wrong_arity("type"))?;

        Ok(Self { key })
    }
}

/// Handles the Redis TYPE command: `string`, `list`, `zset`, `stream` or
/// `none` for a missing key.
pub async fn type_command(
    store: &KeyValueStore,
    arguments: Vec<String>,
) -> Result<CommandResult, CommandError> {
    let type_arguments = TypeArguments::parse(arguments)?;

    let mut keyspace = store.lock().await;
    let type_name = keyspace
        .get(&type_arguments.key)
        .map_or("none", |value| value.data.type_name());

    Ok(CommandResult::Response(RespValue::SimpleString(
        type_name.to_string(),
    )))
}
