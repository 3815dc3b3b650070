use std::collections::VecDeque;

use crate::{
    commands::{command_error::CommandError, command_handler::CommandResult},
    pubsub::list_topic,
    resp::RespValue,
    state::State,
};

pub struct PushArrayOperations {
    key: String,
    values: Vec<String>,
}

impl PushArrayOperations {
    pub fn parse(arguments: Vec<String>, should_prepend: bool) -> Result<Self, CommandError> {
        if arguments.len() < 2 {
            return Err(CommandError::wrong_arity(if should_prepend {
                "lpush"
            } else {
                "rpush"
            }));
        }

        let mut arguments = arguments.into_iter();
        let key = arguments.next().unwrap_or_default();

        Ok(Self {
            key,
            values: arguments.collect(),
        })
    }
}

pub async fn rpush(state: &State, arguments: Vec<String>) -> Result<CommandResult, CommandError> {
    push_array_operations(state, arguments, false).await
}

pub async fn lpush(state: &State, arguments: Vec<String>) -> Result<CommandResult, CommandError> {
    push_array_operations(state, arguments, true).await
}

/// Pushes the values and wakes one blocked `BLPOP` per pushed value.
async fn push_array_operations(
    state: &State,
    arguments: Vec<String>,
    should_prepend: bool,
) -> Result<CommandResult, CommandError> {
    let push_array_arguments = PushArrayOperations::parse(arguments, should_prepend)?;
    let pushed = push_array_arguments.values.len();

    let list_length = {
        let mut keyspace = state.store.lock().await;

        let Some(list) = keyspace.list_mut(&push_array_arguments.key, true)? else {
            return Ok(CommandResult::Response(RespValue::Integer(0)));
        };

        add_values_to_list(list, push_array_arguments.values, should_prepend);
        list.len()
    };

    let topic = list_topic(&push_array_arguments.key);

    for _ in 0..pushed {
        state
            .broker
            .publish(&topic, RespValue::BulkString(push_array_arguments.key.clone()))
            .await;
    }

    Ok(CommandResult::Response(RespValue::Integer(list_length as i64)))
}

fn add_values_to_list(list: &mut VecDeque<String>, values: Vec<String>, should_prepend: bool) {
    for value in values {
        if should_prepend {
            list.push_front(value);
        } else {
            list.push_back(value);
        }
    }
}
