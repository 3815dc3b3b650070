mod ping;
mod publish;
mod subscribe;
mod unsubscribe;

pub use ping::{subscribe_ping, SubscribePingArguments};
pub use publish::{publish, PublishArguments};
pub use subscribe::{subscribe, SubscribeArguments, SubscribeOutcome};
pub use unsubscribe::{unsubscribe, UnsubscribeArguments};

/// Commands a connection may still run once it has subscribed to a channel.
const SUBSCRIPTION_MODE_COMMANDS: [&str; 9] = [
    "SUBSCRIBE",
    "UNSUBSCRIBE",
    "PSUBSCRIBE",
    "PUNSUBSCRIBE",
    "SSUBSCRIBE",
    "SUNSUBSCRIBE",
    "PING",
    "QUIT",
    "RESET",
];

pub fn is_allowed_in_subscription_mode(name: &str) -> bool {
    SUBSCRIPTION_MODE_COMMANDS
        .iter()
        .any(|allowed| allowed.eq_ignore_ascii_case(name))
}
