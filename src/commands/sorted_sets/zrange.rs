use crate::{
    commands::{command_error::CommandError, command_handler::CommandResult},
    key_value_store::KeyValueStore,
    resp::RespValue,
};

use super::format_score;

pub struct ZrangeArguments {
    key: String,
    start: i64,
    stop: i64,
    with_scores: bool,
}

impl ZrangeArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        let with_scores = match arguments.len() {
            3 => false,
            4 if arguments[3].eq_ignore_ascii_case("withscores") => true,
            4 => return Err(CommandError::SyntaxError),
            _ => return Err(CommandError::wrong_arity("zrange")),
        };

        let start = arguments[1]
            .parse::<i64>()
            .map_err(|_| CommandError::NotAnInteger)?;
        let stop = arguments[2]
            .parse::<i64>()
            .map_err(|_| CommandError::NotAnInteger)?;

        Ok(Self {
            key: arguments[0].clone(),
            start,
            stop,
            with_scores,
        })
    }
}

/// Handles the Redis ZRANGE command (rank ranges only).
pub async fn zrange(
    store: &KeyValueStore,
    arguments: Vec<String>,
) -> Result<CommandResult, CommandError> {
    let zrange_arguments = ZrangeArguments::parse(arguments)?;

    let mut keyspace = store.lock().await;

    let Some(set) = keyspace.sorted_set(&zrange_arguments.key)? else {
        return Ok(CommandResult::Response(RespValue::Array(Vec::new())));
    };

    let mut reply = Vec::new();

    for (member, score) in set.range(zrange_arguments.start, zrange_arguments.stop) {
        reply.push(member.to_string());

        if zrange_arguments.with_scores {
            reply.push(format_score(score));
        }
    }

    Ok(CommandResult::Response(RespValue::array_of_bulk_strings(reply)))
}
