use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use crate::{
    commands::{command_error::CommandError, command_handler::CommandResult},
    key_value_store::KeyValueStore,
    pubsub::{list_topic, Subscription},
    resp::RespValue,
    state::State,
};

pub struct BlpopArguments {
    key: String,
    /// `None` blocks until an element arrives.
    timeout: Option<Duration>,
}

impl BlpopArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        let [key, timeout]: [String; 2] = arguments
            .try_into()
            .map_err(|_| CommandError::wrong_arity("blpop"))?;

        let seconds = timeout
            .parse::<f64>()
            .map_err(|_| CommandError::InvalidTimeout)?;

        let timeout = match Duration::try_from_secs_f64(seconds) {
            Ok(duration) if duration.is_zero() => None,
            Ok(duration) => Some(duration),
            Err(_) => return Err(CommandError::InvalidTimeout),
        };

        Ok(Self { key, timeout })
    }
}

/// A BLPOP call in progress.
///
/// The caller subscribes to the list's first-only topic before looking at
/// the list, so a push landing between the check and the wait still wakes
/// it. Waiters are served oldest first. The dispatcher alternates
/// [`BlockingPop::try_pop`] and [`BlockingPop::wait`] so that the pop itself
/// runs under the write-order lock while the wait does not.
pub struct BlockingPop {
    key: String,
    topic: String,
    subscription: Subscription,
    deadline: Option<Instant>,
}

impl BlockingPop {
    pub async fn start(state: &State, arguments: Vec<String>) -> Result<Self, CommandError> {
        let blpop_arguments = BlpopArguments::parse(arguments)?;
        let topic = list_topic(&blpop_arguments.key);
        let subscription = state.broker.subscribe(&topic, true).await?;

        Ok(Self {
            key: blpop_arguments.key,
            topic,
            subscription,
            deadline: blpop_arguments
                .timeout
                .map(|timeout| Instant::now() + timeout),
        })
    }

    /// Pops the head of the list if there is one, replying `[key, element]`.
    pub async fn try_pop(&self, state: &State) -> Result<Option<RespValue>, CommandError> {
        let Some(value) = pop_front(&state.store, &self.key).await? else {
            return Ok(None);
        };

        // Wake-ups for the remaining elements may have been delivered to this
        // waiter; hand one on to the next waiter.
        let remaining = state
            .store
            .lock()
            .await
            .list(&self.key)?
            .map_or(0, |list| list.len());

        if remaining > 0 {
            state
                .broker
                .publish(&self.topic, RespValue::BulkString(self.key.clone()))
                .await;
        }

        Ok(Some(RespValue::array_of_bulk_strings([
            self.key.clone(),
            value,
        ])))
    }

    /// Waits for a push. Returns `false` once the timeout elapsed or the
    /// broker dropped the subscription.
    pub async fn wait(&mut self) -> bool {
        let timeout_ms = match self.deadline {
            None => 0,
            Some(deadline) => {
                let remaining = deadline.saturating_duration_since(Instant::now());

                if remaining.is_zero() {
                    debug!(key = %self.key, "BLPOP timed out");
                    return false;
                }

                remaining.as_millis().max(1) as i64
            }
        };

        self.subscription.recv_timeout(timeout_ms).await.is_some()
    }
}

/// Runs BLPOP once without blocking, as inside a transaction: replies
/// `[key, element]`, or a null bulk string when the list is empty.
pub async fn blpop(state: &State, arguments: Vec<String>) -> Result<CommandResult, CommandError> {
    let blpop_arguments = BlpopArguments::parse(arguments)?;

    let reply = match pop_front(&state.store, &blpop_arguments.key).await? {
        Some(value) => RespValue::array_of_bulk_strings([blpop_arguments.key, value]),
        None => RespValue::NullBulkString,
    };

    Ok(CommandResult::Response(reply))
}

async fn pop_front(store: &KeyValueStore, key: &str) -> Result<Option<String>, CommandError> {
    let mut keyspace = store.lock().await;

    let Some(list) = keyspace.list_mut(key, false)? else {
        return Ok(None);
    };

    let value = list.pop_front();

    if list.is_empty() {
        keyspace.remove(key);
    }

    Ok(value)
}
