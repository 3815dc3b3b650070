use crate::{
    commands::{command_error::CommandError, command_handler::CommandResult},
    key_value_store::KeyValueStore,
    resp::RespValue,
};

pub struct GetArguments {
    key: String,
}

impl GetArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        let [key]: [String; 1] = arguments
            .try_into()
            .map_err(|_| CommandError::wrong_arity("get"))?;

        Ok(Self { key })
    }
}

/// Handles the Redis GET command.
///
/// Expired keys are evicted by the store on access, so they read as missing.
///
/// # Returns
///
/// * `Ok(CommandResult)` - Bulk string with the value, or a null bulk string for a missing key
/// * `Err(CommandError::WrongNumberOfArguments)` - If the number of arguments is not exactly 1
/// * `Err(CommandError::Store)` - If the key holds a non-string value
pub async fn get(
    store: &KeyValueStore,
    arguments: Vec<String>,
) -> Result<CommandResult, CommandError> {
    let get_arguments = GetArguments::parse(arguments)?;

    let mut keyspace = store.lock().await;

    let reply = match keyspace.string(&get_arguments.key)? {
        Some(value) => RespValue::BulkString(value.clone()),
        None => RespValue::NullBulkString,
    };

    Ok(CommandResult::Response(reply))
}
