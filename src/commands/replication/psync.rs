//! PSYNC command implementation for Redis replication synchronization.
//!
//! Only full resynchronisation is offered: whatever id and offset the
//! replica sends, it receives `+FULLRESYNC` and a snapshot of the keyspace.

use tracing::debug;

use crate::{
    commands::{command_error::CommandError, command_handler::CommandResult},
    state::State,
};

/// Represents the parsed arguments for the PSYNC command.
pub struct PsyncArguments {
    /// The replication ID the replica last followed, `?` on first sync
    replication_id: String,
    /// The replica's offset, `-1` on first sync
    offset: i64,
}

impl PsyncArguments {
    /// Parses and validates arguments for the PSYNC command.
    ///
    /// # Arguments
    ///
    /// * `arguments` - Vector containing [replication_id, offset]
    ///
    /// # Returns
    ///
    /// * `Ok(PsyncArguments)` - Successfully parsed arguments
    /// * `Err(CommandError::WrongNumberOfArguments)` - If not exactly 2 arguments
    /// * `Err(CommandError::NotAnInteger)` - If offset is not a valid integer
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        let [replication_id, offset]: [String; 2] = arguments
            .try_into()
            .map_err(|_| CommandError::wrong_arity("psync"))?;

        let offset = offset
            .parse::<i64>()
            .map_err(|_| CommandError::NotAnInteger)?;

        Ok(Self {
            replication_id,
            offset,
        })
    }
}

/// Handles the Redis PSYNC command.
///
/// The reply itself (`+FULLRESYNC <id> <offset>` and the snapshot payload)
/// is written by [`ReplicationCoordinator::attach_replica`][attach], which
/// takes the snapshot and registers the replica under the write-order lock.
///
/// [attach]: crate::replication::ReplicationCoordinator::attach_replica
///
/// # Returns
///
/// * `Ok(CommandResult::Sync)` - The connection must be attached as a replica
/// * `Err(CommandError::PsyncOnReplica)` - When this server is itself a replica
pub async fn psync(state: &State, arguments: Vec<String>) -> Result<CommandResult, CommandError> {
    let psync_arguments = PsyncArguments::parse(arguments)?;

    if !state.replication.is_master() {
        return Err(CommandError::PsyncOnReplica);
    }

    debug!(
        replication_id = %psync_arguments.replication_id,
        offset = psync_arguments.offset,
        "full resync requested"
    );

    Ok(CommandResult::Sync)
}
