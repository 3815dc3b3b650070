use tracing::debug;

use crate::{
    commands::{command_error::CommandError, transactions::Transaction},
    pubsub::{channel_topic, Broker, Subscription},
    resp::RespValue,
};

pub struct SubscribeArguments {
    channels: Vec<String>,
}

impl SubscribeArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.is_empty() {
            return Err(CommandError::wrong_arity("subscribe"));
        }

        Ok(Self {
            channels: arguments,
        })
    }
}

#[derive(Debug)]
pub struct SubscribeOutcome {
    /// One `["subscribe", channel, count]` confirmation per requested channel.
    pub replies: Vec<RespValue>,
    /// New subscriptions whose messages must be forwarded to the client.
    pub subscriptions: Vec<Subscription>,
}

/// Handles the Redis SUBSCRIBE command.
///
/// Channels the connection already listens to are confirmed again without a
/// second subscription.
pub async fn subscribe(
    broker: &Broker,
    transaction: &mut Transaction,
    arguments: Vec<String>,
) -> Result<SubscribeOutcome, CommandError> {
    let subscribe_arguments = SubscribeArguments::parse(arguments)?;

    let mut replies = Vec::with_capacity(subscribe_arguments.channels.len());
    let mut subscriptions = Vec::new();

    for channel in subscribe_arguments.channels {
        if transaction.subscription_id(&channel).is_none() {
            let subscription = broker.subscribe(&channel_topic(&channel), false).await?;
            transaction.add_subscription(channel.clone(), subscription.id());
            subscriptions.push(subscription);

            debug!(channel = %channel, "subscribed");
        }

        replies.push(RespValue::Array(vec![
            RespValue::bulk("subscribe"),
            RespValue::BulkString(channel),
            RespValue::Integer(transaction.subscription_count() as i64),
        ]));
    }

    Ok(SubscribeOutcome {
        replies,
        subscriptions,
    })
}
