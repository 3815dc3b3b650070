use crate::{
    commands::{command_error::CommandError, command_handler::CommandResult},
    resp::RespValue,
    state::State,
};

const PARAMETERS: [&str; 6] = [
    "dir",
    "dbfilename",
    "port",
    "role",
    "master_replid",
    "master_repl_offset",
];

pub struct ConfigGetArguments {
    parameters: Vec<String>,
}

impl ConfigGetArguments {
    /// Parses `CONFIG GET <parameter> [parameter ...]`. The arguments start
    /// with the subcommand; `GET` is the only one served.
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        let mut arguments = arguments.into_iter();

        let Some(subcommand) = arguments.next() else {
            return Err(CommandError::wrong_arity("config"));
        };

        if !subcommand.eq_ignore_ascii_case("get") {
            return Err(CommandError::UnknownSubcommand(subcommand));
        }

        let parameters: Vec<String> = arguments.map(|p| p.to_lowercase()).collect();

        if parameters.is_empty() {
            return Err(CommandError::wrong_arity("config|get"));
        }

        Ok(Self { parameters })
    }
}

/// Handles `CONFIG GET`, answering a flat `[name, value, ...]` array.
/// Unknown parameter names are left out of the reply.
pub async fn config_get(
    state: &State,
    arguments: Vec<String>,
) -> Result<CommandResult, CommandError> {
    let config_get_arguments = ConfigGetArguments::parse(arguments)?;

    let mut reply = Vec::new();

    for parameter in PARAMETERS {
        if !config_get_arguments
            .parameters
            .iter()
            .any(|requested| requested == parameter || requested == "*")
        {
            continue;
        }

        let value = match parameter {
            "dir" => state.config.dir.clone(),
            "dbfilename" => state.config.dbfilename.clone(),
            "port" => state.config.port.to_string(),
            "role" => state.replication.role().as_str().to_string(),
            "master_replid" => state.replication.replication_id().await,
            _ => state.replication.offset().get().to_string(),
        };

        reply.push(parameter.to_string());
        reply.push(value);
    }

    Ok(CommandResult::Response(RespValue::array_of_bulk_strings(reply)))
}
