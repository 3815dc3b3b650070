use crate::{
    commands::{command_error::CommandError, command_handler::CommandResult},
    key_value_store::{AddOutcome, KeyValueStore},
    resp::RespValue,
};

use super::parse_score;

pub struct ZaddArguments {
    key: String,
    members: Vec<(f64, String)>,
}

impl ZaddArguments {
    /// Parses `ZADD key score member [score member ...]`.
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() < 3 || arguments.len() % 2 == 0 {
            return Err(CommandError::wrong_arity("zadd"));
        }

        let members = arguments[1..]
            .chunks_exact(2)
            .map(|pair| parse_score(&pair[0]).map(|score| (score, pair[1].clone())))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            key: arguments[0].clone(),
            members,
        })
    }
}

/// Handles the Redis ZADD command. Replies with the number of members that
/// were not in the set before; re-scored members are not counted.
pub async fn zadd(
    store: &KeyValueStore,
    arguments: Vec<String>,
) -> Result<CommandResult, CommandError> {
    let zadd_arguments = ZaddArguments::parse(arguments)?;

    let mut keyspace = store.lock().await;

    let Some(set) = keyspace.sorted_set_mut(&zadd_arguments.key, true)? else {
        return Ok(CommandResult::Response(RespValue::Integer(0)));
    };

    let inserted = zadd_arguments
        .members
        .iter()
        .filter(|(score, member)| set.add(member, *score) == AddOutcome::Inserted)
        .count();

    Ok(CommandResult::Response(RespValue::Integer(inserted as i64)))
}
