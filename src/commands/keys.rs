use crate::{
    commands::{command_error::CommandError, command_handler::CommandResult},
    key_value_store::KeyValueStore,
    resp::RespValue,
};

pub struct KeysArguments {
    pattern: String,
}

impl KeysArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        let [pattern]: [String; 1] = arguments
            .try_into()
            .map_err(|_| CommandError::wrong_arity("keys"))?;

        Ok(Self { pattern })
    }
}

/// Handles the Redis KEYS command. Only `*` is treated as a wildcard; any
/// other pattern matches the key of the same name.
pub async fn keys(
    store: &KeyValueStore,
    arguments: Vec<String>,
) -> Result<CommandResult, CommandError> {
    let keys_arguments = KeysArguments::parse(arguments)?;

    let mut keys = store.keys(&keys_arguments.pattern).await;
    keys.sort();

    Ok(CommandResult::Response(RespValue::array_of_bulk_strings(keys)))
}
