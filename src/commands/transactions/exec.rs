use crate::{
    commands::{transactions::Transaction, CommandError, CommandHandler},
    resp::RespValue,
    state::State,
};

pub struct ExecArguments;

impl ExecArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if !arguments.is_empty() {
            return Err(CommandError::wrong_arity("exec"));
        }

        Ok(Self)
    }
}

/// Result of running a queued batch.
#[derive(Debug)]
pub struct TransactionOutcome {
    /// The array of replies, or the error that stopped the batch.
    pub reply: Result<RespValue, CommandError>,
    /// Write commands applied before the batch stopped, in order.
    pub propagate: Vec<RespValue>,
}

/// Handles EXEC: ends the transaction and hands back the queued commands.
pub fn exec(
    transaction: &mut Transaction,
    arguments: Vec<String>,
) -> Result<Vec<CommandHandler>, CommandError> {
    ExecArguments::parse(arguments)?;

    transaction
        .take_queued()
        .ok_or(CommandError::ExecWithoutMulti)
}

/// Runs the queued commands in order. The first failing command aborts the
/// rest of the batch and its error becomes the reply; effects of the
/// commands that ran before it are kept.
pub async fn run_transaction_commands(
    state: &State,
    commands: Vec<CommandHandler>,
) -> TransactionOutcome {
    let mut replies = Vec::with_capacity(commands.len());
    let mut propagate = Vec::new();

    for command in commands {
        match command.handle_queued_command(state).await {
            Ok(result) => {
                if let Some(propagated) = command.propagation(&result) {
                    propagate.push(propagated);
                }

                replies.push(result.into_reply().unwrap_or(RespValue::NullBulkString));
            }
            Err(e) => {
                return TransactionOutcome {
                    reply: Err(e),
                    propagate,
                };
            }
        }
    }

    TransactionOutcome {
        reply: Ok(RespValue::Array(replies)),
        propagate,
    }
}
