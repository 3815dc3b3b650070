use tracing::warn;

use crate::{
    commands::{command_error::CommandError, command_handler::CommandResult},
    resp::RespValue,
    state::State,
};

pub struct WaitArguments {
    pub number_of_replicas: usize,
    /// 0 waits without a bound
    pub timeout_ms: u64,
}

impl WaitArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        let [number_of_replicas, timeout_ms]: [String; 2] = arguments
            .try_into()
            .map_err(|_| CommandError::wrong_arity("wait"))?;

        let number_of_replicas = number_of_replicas
            .parse::<usize>()
            .map_err(|_| CommandError::NotAnInteger)?;

        let timeout_ms = timeout_ms
            .parse::<u64>()
            .map_err(|_| CommandError::InvalidTimeout)?;

        Ok(Self {
            number_of_replicas,
            timeout_ms,
        })
    }
}

/// Handles the Redis WAIT command: blocks until enough replicas have
/// acknowledged every write propagated so far, or the timeout elapses, and
/// replies with the number of replicas that did.
pub async fn wait(state: &State, arguments: Vec<String>) -> Result<CommandResult, CommandError> {
    let wait_arguments = WaitArguments::parse(arguments)?;

    if !state.replication.is_master() {
        return Err(CommandError::WaitOnReplica);
    }

    let count = state
        .replication
        .wait(wait_arguments.number_of_replicas, wait_arguments.timeout_ms)
        .await
        .map_err(|e| {
            warn!(error = %e, "WAIT failed");
            CommandError::Replication(e.to_string())
        })?;

    Ok(CommandResult::Response(RespValue::Integer(count as i64)))
}
