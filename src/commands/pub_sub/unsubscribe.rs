use crate::{
    commands::{command_error::CommandError, transactions::Transaction},
    pubsub::{channel_topic, Broker},
    resp::RespValue,
};

pub struct UnsubscribeArguments {
    channels: Vec<String>,
}

impl UnsubscribeArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        Ok(Self {
            channels: arguments,
        })
    }
}

/// Handles the Redis UNSUBSCRIBE command. Without arguments every channel
/// of the connection is dropped.
///
/// # Returns
///
/// One `["unsubscribe", channel, remaining]` reply per channel. When there is
/// nothing to unsubscribe from, a single reply with a null channel and a
/// zero count.
pub async fn unsubscribe(
    broker: &Broker,
    transaction: &mut Transaction,
    arguments: Vec<String>,
) -> Result<Vec<RespValue>, CommandError> {
    let unsubscribe_arguments = UnsubscribeArguments::parse(arguments)?;

    let channels = if unsubscribe_arguments.channels.is_empty() {
        transaction.subscribed_channels()
    } else {
        unsubscribe_arguments.channels
    };

    if channels.is_empty() {
        return Ok(vec![RespValue::Array(vec![
            RespValue::bulk("unsubscribe"),
            RespValue::NullBulkString,
            RespValue::Integer(0),
        ])]);
    }

    let mut replies = Vec::with_capacity(channels.len());

    for channel in channels {
        if let Some(id) = transaction.remove_subscription(&channel) {
            broker.unsubscribe(&channel_topic(&channel), id).await;
        }

        replies.push(RespValue::Array(vec![
            RespValue::bulk("unsubscribe"),
            RespValue::BulkString(channel),
            RespValue::Integer(transaction.subscription_count() as i64),
        ]));
    }

    Ok(replies)
}
