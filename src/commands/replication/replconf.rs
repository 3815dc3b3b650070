//! REPLCONF command implementation for Redis replication configuration.
//!
//! During the handshake a replica announces its listening port and
//! capabilities. Afterwards the master asks for the replica's offset with
//! `GETACK *` and the replica answers with `ACK <offset>`.

use crate::{
    commands::{command_error::CommandError, command_handler::CommandResult},
    resp::RespValue,
    state::State,
};

#[derive(Debug, PartialEq)]
enum ReplconfConfiguration {
    ListeningPort(u16),
    Capabilities,
    GetAck,
    Ack(u64),
}

#[derive(Debug, PartialEq)]
pub struct ReplconfArguments {
    configuration: ReplconfConfiguration,
}

impl ReplconfArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() < 2 || arguments.len() % 2 != 0 {
            return Err(CommandError::wrong_arity("replconf"));
        }

        let option = arguments[0].to_lowercase();
        let value = &arguments[1];

        let configuration = match option.as_str() {
            "listening-port" => ReplconfConfiguration::ListeningPort(
                value
                    .parse::<u16>()
                    .map_err(|_| CommandError::NotAnInteger)?,
            ),
            // Several `capa` pairs may be sent at once.
            "capa" => ReplconfConfiguration::Capabilities,
            "getack" if value == "*" => ReplconfConfiguration::GetAck,
            "ack" => ReplconfConfiguration::Ack(
                value
                    .parse::<u64>()
                    .map_err(|_| CommandError::NotAnInteger)?,
            ),
            _ => return Err(CommandError::InvalidReplconf(arguments[0].clone())),
        };

        Ok(Self { configuration })
    }
}

/// Handles the Redis REPLCONF command.
///
/// # Returns
///
/// * `CommandResult::Response(+OK)` - For `listening-port` and `capa`
/// * `CommandResult::Response([REPLCONF, ACK, offset])` - For `GETACK *`, with the
///   number of replication bytes processed before this command
/// * `CommandResult::Acknowledgment(offset)` - For `ACK <offset>`, which gets no reply
pub async fn replconf(
    state: &State,
    arguments: Vec<String>,
) -> Result<CommandResult, CommandError> {
    let replconf_arguments = ReplconfArguments::parse(arguments)?;

    match replconf_arguments.configuration {
        ReplconfConfiguration::ListeningPort(_) | ReplconfConfiguration::Capabilities => {
            Ok(CommandResult::Response(RespValue::ok()))
        }
        ReplconfConfiguration::GetAck => Ok(CommandResult::Response(
            RespValue::array_of_bulk_strings([
                "REPLCONF".to_string(),
                "ACK".to_string(),
                state.replication.offset().get().to_string(),
            ]),
        )),
        ReplconfConfiguration::Ack(offset) => Ok(CommandResult::Acknowledgment(offset)),
    }
}
