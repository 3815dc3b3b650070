use crate::{
    commands::{command_error::CommandError, command_handler::CommandResult},
    pubsub::{channel_topic, Broker},
    resp::RespValue,
};

pub struct PublishArguments {
    channel: String,
    message: String,
}

impl PublishArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        let [channel, message]: [String; 2] = arguments
            .try_into()
            .map_err(|_| CommandError::wrong_arity("publish"))?;

        Ok(Self { channel, message })
    }
}

/// Handles the Redis PUBLISH command.
///
/// Subscribers receive the ready-made `["message", channel, payload]` push.
/// The reply is the number of subscribers the message was handed to.
pub async fn publish(
    broker: &Broker,
    arguments: Vec<String>,
) -> Result<CommandResult, CommandError> {
    let publish_arguments = PublishArguments::parse(arguments)?;

    let message = RespValue::array_of_bulk_strings([
        "message".to_string(),
        publish_arguments.channel.clone(),
        publish_arguments.message,
    ]);

    let delivered = broker
        .publish(&channel_topic(&publish_arguments.channel), message)
        .await;

    Ok(CommandResult::Response(RespValue::Integer(delivered as i64)))
}
