use thiserror::Error;

use crate::{
    key_value_store::{StoreError, StreamError},
    pubsub::BrokerError,
    resp::RespValue,
};

/// Errors reported back to the client as a RESP error. None of them closes
/// the connection.
#[derive(Error, Debug, PartialEq, Clone)]
pub enum CommandError {
    #[error("ERR Protocol error: expected an array of bulk strings")]
    InvalidCommand,
    #[error("ERR unknown command '{0}'")]
    UnknownCommand(String),
    #[error("ERR wrong number of arguments for '{0}' command")]
    WrongNumberOfArguments(String),
    #[error("ERR unknown subcommand '{0}'")]
    UnknownSubcommand(String),
    #[error("ERR syntax error")]
    SyntaxError,
    #[error("ERR value is not an integer or out of range")]
    NotAnInteger,
    #[error("ERR value is not a valid float")]
    NotAFloat,
    #[error("ERR timeout is not a float or out of range")]
    InvalidTimeout,
    #[error("ERR invalid expire time in '{0}' command")]
    InvalidExpireTime(String),
    #[error("{0}")]
    Store(#[from] StoreError),
    #[error("{0}")]
    Stream(#[from] StreamError),
    #[error("ERR EXEC without MULTI")]
    ExecWithoutMulti,
    #[error("ERR DISCARD without MULTI")]
    DiscardWithoutMulti,
    #[error("ERR Command not allowed inside a transaction")]
    NotAllowedInTransaction,
    #[error(
        "ERR Can't execute '{0}': only {allowed} are allowed in this context",
        allowed = "(P|S)SUBSCRIBE / (P|S)UNSUBSCRIBE / PING / QUIT / RESET"
    )]
    SubscriptionMode(String),
    #[error("READONLY You can't write against a read only replica.")]
    ReadOnlyReplica,
    #[error("ERR Unrecognized REPLCONF option: {0}")]
    InvalidReplconf(String),
    #[error("ERR WAIT cannot be used with replica instances")]
    WaitOnReplica,
    #[error("ERR PSYNC is only served by a master")]
    PsyncOnReplica,
    #[error("ERR {0}")]
    Replication(String),
    #[error("ERR server is shutting down")]
    BrokerClosed,
}

impl CommandError {
    pub fn wrong_arity(name: &str) -> Self {
        CommandError::WrongNumberOfArguments(name.to_lowercase())
    }

    pub fn as_resp(&self) -> RespValue {
        RespValue::Error(self.to_string())
    }
}

impl From<BrokerError> for CommandError {
    fn from(_: BrokerError) -> Self {
        CommandError::BrokerClosed
    }
}
