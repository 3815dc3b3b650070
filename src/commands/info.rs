use crate::{
    commands::{command_error::CommandError, command_handler::CommandResult},
    resp::RespValue,
    state::State,
};

pub struct InfoArguments {
    replication: bool,
}

impl InfoArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        match arguments.as_slice() {
            [] => Ok(Self { replication: true }),
            [section] => Ok(Self {
                replication: ["replication", "all", "default", "everything"]
                    .contains(&section.to_lowercase().as_str()),
            }),
            _ => Err(CommandError::SyntaxError),
        }
    }
}

/// Handles the Redis INFO command. Replication is the only section served;
/// other section names get an empty reply.
pub async fn info(state: &State, arguments: Vec<String>) -> Result<CommandResult, CommandError> {
    let info_arguments = InfoArguments::parse(arguments)?;

    if !info_arguments.replication {
        return Ok(CommandResult::Response(RespValue::BulkString(String::new())));
    }

    let replication = [
        "# Replication".to_string(),
        format!("role:{}", state.replication.role().as_str()),
        format!("connected_slaves:{}", state.replication.replica_count().await),
        format!("master_replid:{}", state.replication.replication_id().await),
        format!("master_repl_offset:{}", state.replication.offset().get()),
    ];

    Ok(CommandResult::Response(RespValue::BulkString(
        replication.join("\r\n"),
    )))
}
