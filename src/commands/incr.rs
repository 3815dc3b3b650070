use crate::{
    commands::{command_error::CommandError, command_handler::CommandResult},
    key_value_store::{DataType, KeyValueStore, StoreError, Value},
    resp::RespValue,
};

pub struct IncrArguments {
    key: String,
}

impl IncrArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        let [key]: [String; 1] = arguments
            .try_into()
            .map_err(|_| CommandError::wrong_arity("incr"))?;

        Ok(Self { key })
    }
}

/// Handles the Redis INCR command.
///
/// A missing key is treated as `0`. The key keeps its expiry.
pub async fn incr(
    store: &KeyValueStore,
    arguments: Vec<String>,
) -> Result<CommandResult, CommandError> {
    let incr_arguments = IncrArguments::parse(arguments)?;

    let mut keyspace = store.lock().await;

    let Some(value) = keyspace.get_mut(&incr_arguments.key) else {
        keyspace.insert(incr_arguments.key, Value::new(DataType::String("1".to_string())));
        return Ok(CommandResult::Response(RespValue::Integer(1)));
    };

    let DataType::String(current) = &mut value.data else {
        return Err(StoreError::WrongType.into());
    };

    let incremented = current
        .parse::<i64>()
        .ok()
        .and_then(|number| number.checked_add(1))
        .ok_or(CommandError::NotAnInteger)?;

    *current = incremented.to_string();

    Ok(CommandResult::Response(RespValue::Integer(incremented)))
}
