mod discard;
mod exec;
mod multi;

use std::collections::BTreeMap;

pub use discard::{discard, DiscardArguments};
pub use exec::{exec, run_transaction_commands, ExecArguments, TransactionOutcome};
pub use multi::{multi, MultiArguments};

use crate::commands::CommandHandler;

/// Per-connection command state: the queue filled between `MULTI` and
/// `EXEC`, and the channels the connection is subscribed to.
///
/// The connection is in a transaction while a queue exists, and in
/// subscription mode while the subscription map is non-empty. The two are
/// independent.
#[derive(Debug, Default)]
pub struct Transaction {
    queued: Option<Vec<CommandHandler>>,
    /// channel -> subscription id
    subscriptions: BTreeMap<String, u64>,
}

impl Transaction {
    pub fn is_active(&self) -> bool {
        self.queued.is_some()
    }

    pub fn is_subscribed(&self) -> bool {
        !self.subscriptions.is_empty()
    }

    /// Starts a new queue, dropping any commands queued so far.
    pub fn begin(&mut self) {
        self.queued = Some(Vec::new());
    }

    pub fn queue(&mut self, command: CommandHandler) -> bool {
        match &mut self.queued {
            Some(queued) => {
                queued.push(command);
                true
            }
            None => false,
        }
    }

    pub fn take_queued(&mut self) -> Option<Vec<CommandHandler>> {
        self.queued.take()
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn subscription_id(&self, channel: &str) -> Option<u64> {
        self.subscriptions.get(channel).copied()
    }

    pub fn subscribed_channels(&self) -> Vec<String> {
        self.subscriptions.keys().cloned().collect()
    }

    pub fn add_subscription(&mut self, channel: String, id: u64) {
        self.subscriptions.insert(channel, id);
    }

    pub fn remove_subscription(&mut self, channel: &str) -> Option<u64> {
        self.subscriptions.remove(channel)
    }
}
