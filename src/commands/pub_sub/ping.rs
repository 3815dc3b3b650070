use crate::{
    commands::{command_error::CommandError, command_handler::CommandResult},
    resp::RespValue,
};

pub struct SubscribePingArguments {
    message: Option<String>,
}

impl SubscribePingArguments {
    pub fn parse(mut arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() > 1 {
            return Err(CommandError::wrong_arity("ping"));
        }

        Ok(Self {
            message: arguments.pop(),
        })
    }
}

/// PING while subscribed replies with a `["pong", message]` push instead of
/// a simple string.
pub fn subscribe_ping(arguments: Vec<String>) -> Result<CommandResult, CommandError> {
    let ping_arguments = SubscribePingArguments::parse(arguments)?;

    Ok(CommandResult::Response(RespValue::array_of_bulk_strings([
        "pong".to_string(),
        ping_arguments.message.unwrap_or_default(),
    ])))
}
