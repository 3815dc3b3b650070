use crate::{
    commands::{command_error::CommandError, command_handler::CommandResult},
    key_value_store::KeyValueStore,
    resp::RespValue,
};

pub struct LlenArguments {
    key: String,
}

impl LlenArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        let [key]: [String; 1] = arguments
            .try_into()
            .map_err(|_| CommandError::wrong_arity("llen"))?;

        Ok(Self { key })
    }
}

pub async fn llen(
    store: &KeyValueStore,
    arguments: Vec<String>,
) -> Result<CommandResult, CommandError> {
    let llen_arguments = LlenArguments::parse(arguments)?;

    let mut keyspace = store.lock().await;
    let length = keyspace.list(&llen_arguments.key)?.map_or(0, |list| list.len());

    Ok(CommandResult::Response(RespValue::Integer(length as i64)))
}
