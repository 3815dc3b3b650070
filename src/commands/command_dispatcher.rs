use tokio::sync::MutexGuard;
use tracing::{debug, warn};

use crate::{
    commands::{
        blpop::BlockingPop,
        command_handler::{CommandHandler, CommandKind, CommandResult},
        pub_sub::{is_allowed_in_subscription_mode, subscribe, subscribe_ping, unsubscribe},
        transactions::{discard, exec, multi, run_transaction_commands, Transaction},
        CommandError,
    },
    pubsub::{channel_topic, Subscription},
    resp::RespValue,
    state::State,
};

/// What a connection has to do after one command was dispatched.
#[derive(Debug, Default)]
pub struct DispatchOutcome {
    /// Replies to write back, in order.
    pub replies: Vec<RespValue>,
    /// Write commands already forwarded to the replicas, in order.
    pub propagate: Vec<RespValue>,
    /// Set by PSYNC: the connection turns into a replica link and receives
    /// `FULLRESYNC` and the snapshot.
    pub promote_to_replica: bool,
    /// Set by `REPLCONF ACK <offset>`.
    pub acknowledged_offset: Option<u64>,
    /// New channel subscriptions whose pushes must be forwarded.
    pub subscriptions: Vec<Subscription>,
    /// True the first time the connection subscribes to a channel.
    pub entered_subscription_mode: bool,
    /// Set by QUIT: close once the replies are written.
    pub close_connection: bool,
}

impl DispatchOutcome {
    fn reply(value: RespValue) -> Self {
        Self {
            replies: vec![value],
            ..Default::default()
        }
    }

    fn error(error: CommandError) -> Self {
        Self::reply(error.as_resp())
    }

    pub fn keep_connection_open(&self) -> bool {
        self.promote_to_replica
    }

    pub fn is_replica_acknowledgment(&self) -> bool {
        self.acknowledged_offset.is_some()
    }
}

/// Routes the commands of one connection.
///
/// Owns the connection's transaction queue and channel subscriptions, and
/// decides which commands run, which are queued and which are refused. On a
/// master, writes are propagated here, under the write-order lock.
#[derive(Debug)]
pub struct CommandDispatcher {
    state: State,
    from_master: bool,
    transaction: Transaction,
}

impl CommandDispatcher {
    /// Dispatcher for a client connection.
    pub fn new(state: State) -> Self {
        Self {
            state,
            from_master: false,
            transaction: Transaction::default(),
        }
    }

    /// Dispatcher for the replication link of a replica. Writes are accepted
    /// and nothing is propagated further.
    pub fn for_master_link(state: State) -> Self {
        Self {
            state,
            from_master: true,
            transaction: Transaction::default(),
        }
    }

    pub fn is_subscribed(&self) -> bool {
        self.transaction.is_subscribed()
    }

    pub fn in_transaction(&self) -> bool {
        self.transaction.is_active()
    }

    /// Dispatches one decoded frame. Command errors are turned into error
    /// replies; they never end the connection.
    pub async fn dispatch(&mut self, input: RespValue, size: usize) -> DispatchOutcome {
        let handler = match CommandHandler::new(input, size) {
            Ok(handler) => handler,
            Err(e) => return DispatchOutcome::error(e),
        };

        match self.route(handler).await {
            Ok(outcome) => outcome,
            Err(e) => DispatchOutcome::error(e),
        }
    }

    async fn route(&mut self, handler: CommandHandler) -> Result<DispatchOutcome, CommandError> {
        if self.transaction.is_subscribed() && !is_allowed_in_subscription_mode(&handler.name) {
            return Err(CommandError::SubscriptionMode(handler.name.to_lowercase()));
        }

        if !self.from_master && self.state.is_replica() && handler.kind.is_write() {
            return Err(CommandError::ReadOnlyReplica);
        }

        let arguments = handler.arguments.clone();

        match handler.kind {
            CommandKind::Multi => {
                let reply = multi(&mut self.transaction, arguments)?;
                Ok(DispatchOutcome::reply(reply))
            }
            CommandKind::Discard => {
                let reply = discard(&mut self.transaction, arguments)?;
                Ok(DispatchOutcome::reply(reply))
            }
            CommandKind::Exec => {
                let commands = exec(&mut self.transaction, arguments)?;
                debug!(commands = commands.len(), "executing transaction");

                let writes = commands.iter().any(|command| command.kind.is_write());
                let _order = self.order_writes(writes).await;

                let outcome = run_transaction_commands(&self.state, commands).await;
                let reply = outcome.reply.unwrap_or_else(|e| e.as_resp());
                let propagate = self.propagation(outcome.propagate);
                self.forward(&propagate).await;

                Ok(DispatchOutcome {
                    replies: vec![reply],
                    propagate,
                    ..Default::default()
                })
            }
            CommandKind::Subscribe => {
                let first = !self.transaction.is_subscribed();
                let outcome =
                    subscribe(&self.state.broker, &mut self.transaction, arguments).await?;

                Ok(DispatchOutcome {
                    replies: outcome.replies,
                    entered_subscription_mode: first && self.transaction.is_subscribed(),
                    subscriptions: outcome.subscriptions,
                    ..Default::default()
                })
            }
            CommandKind::Unsubscribe => {
                let replies =
                    unsubscribe(&self.state.broker, &mut self.transaction, arguments).await?;

                Ok(DispatchOutcome {
                    replies,
                    ..Default::default()
                })
            }
            CommandKind::Quit => Ok(DispatchOutcome {
                replies: vec![RespValue::ok()],
                close_connection: true,
                ..Default::default()
            }),
            CommandKind::Reset => {
                handler.validate_command_arguments()?;
                self.close().await;

                Ok(DispatchOutcome::reply(RespValue::SimpleString(
                    "RESET".to_string(),
                )))
            }
            _ if self.transaction.is_active() => {
                if matches!(handler.kind, CommandKind::Psync | CommandKind::Replconf) {
                    return Err(CommandError::NotAllowedInTransaction);
                }

                handler.validate_command_arguments()?;
                self.transaction.queue(handler);

                Ok(DispatchOutcome::reply(RespValue::SimpleString(
                    "QUEUED".to_string(),
                )))
            }
            CommandKind::Ping if self.transaction.is_subscribed() => {
                let result = subscribe_ping(arguments)?;
                Ok(self.outcome(&handler, result))
            }
            CommandKind::Blpop => self.blocking_pop(&handler).await,
            _ => {
                let _order = self.order_writes(handler.kind.is_write()).await;

                let result = handler.handle_command(&self.state).await?;
                let outcome = self.outcome(&handler, result);
                self.forward(&outcome.propagate).await;

                Ok(outcome)
            }
        }
    }

    /// Waits for an element without holding the write-order lock; each pop
    /// attempt takes it so the pop and its propagation stay together.
    async fn blocking_pop(
        &self,
        handler: &CommandHandler,
    ) -> Result<DispatchOutcome, CommandError> {
        let mut pop = BlockingPop::start(&self.state, handler.arguments.clone()).await?;
        let mut expired = false;

        loop {
            {
                let _order = self.order_writes(true).await;

                if let Some(reply) = pop.try_pop(&self.state).await? {
                    let outcome = self.outcome(handler, CommandResult::Response(reply));
                    self.forward(&outcome.propagate).await;

                    return Ok(outcome);
                }
            }

            if expired {
                return Ok(DispatchOutcome::reply(RespValue::NullBulkString));
            }

            // One last attempt after the timeout.
            expired = !pop.wait().await;
        }
    }

    fn outcome(&self, handler: &CommandHandler, result: CommandResult) -> DispatchOutcome {
        let propagate = self.propagation(handler.propagation(&result).into_iter().collect());

        match result {
            CommandResult::Response(reply) => DispatchOutcome {
                replies: vec![reply],
                propagate,
                ..Default::default()
            },
            CommandResult::Sync => DispatchOutcome {
                promote_to_replica: true,
                ..Default::default()
            },
            CommandResult::Acknowledgment(offset) => DispatchOutcome {
                acknowledged_offset: Some(offset),
                ..Default::default()
            },
        }
    }

    /// Only a master forwards writes, and only those of its clients.
    fn propagates(&self) -> bool {
        !self.from_master && self.state.replication.is_master()
    }

    fn propagation(&self, commands: Vec<RespValue>) -> Vec<RespValue> {
        if !self.propagates() {
            return Vec::new();
        }

        commands
    }

    async fn order_writes(&self, writes: bool) -> Option<MutexGuard<'_, ()>> {
        if !writes || !self.propagates() {
            return None;
        }

        Some(self.state.replication.order_writes().await)
    }

    async fn forward(&self, commands: &[RespValue]) {
        for command in commands {
            if let Err(e) = self.state.replication.propagate(command).await {
                warn!(error = %e, "propagation failed");
            }
        }
    }

    /// Drops every channel subscription of the connection.
    pub async fn close(&mut self) {
        for channel in self.transaction.subscribed_channels() {
            if let Some(id) = self.transaction.remove_subscription(&channel) {
                self.state.broker.unsubscribe(&channel_topic(&channel), id).await;
            }
        }

        self.transaction.take_queued();
    }
}
