use crate::{
    commands::{command_error::CommandError, command_handler::CommandResult},
    resp::RespValue,
};

pub struct EchoArguments {
    message: String,
}

impl EchoArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        let [message]: [String; 1] = arguments
            .try_into()
            .map_err(|_| CommandError::wrong_arity("echo"))?;

        Ok(Self { message })
    }
}

/// Handles the Redis ECHO command.
///
/// # Examples
///
/// ```ignore
/// // ECHO "hello world"
/// let result = echo(vec!["hello world".to_string()]);
/// // Returns: CommandResult::Response(BulkString("hello world"))
/// ```
pub fn echo(arguments: Vec<String>) -> Result<CommandResult, CommandError> {
    let echo_arguments = EchoArguments::parse(arguments)?;

    Ok(CommandResult::Response(RespValue::BulkString(
        echo_arguments.message,
    )))
}
