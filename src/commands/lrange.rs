use crate::{
    commands::{command_error::CommandError, command_handler::CommandResult},
    key_value_store::KeyValueStore,
    resp::RespValue,
};

pub struct LrangeArguments {
    /// The key name to retrieve from the store
    key: String,
    /// The starting index for the range (can be negative to count from the end)
    start_index: i64,
    /// The ending index for the range, inclusive (can be negative to count from the end)
    end_index: i64,
}

impl LrangeArguments {
    /// Parses and validates the arguments for the LRANGE command.
    ///
    /// # Arguments
    ///
    /// * `arguments` - A vector of command arguments: [key, start_index, end_index]
    ///
    /// # Returns
    ///
    /// * `Ok(LrangeArguments)` - If the arguments are valid
    /// * `Err(CommandError::WrongNumberOfArguments)` - If the number of arguments is not exactly 3
    /// * `Err(CommandError::NotAnInteger)` - If start or end index is not a valid integer
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        let [key, start, end]: [String; 3] = arguments
            .try_into()
            .map_err(|_| CommandError::wrong_arity("lrange"))?;

        let Ok(start_index) = start.parse::<i64>() else {
            return Err(CommandError::NotAnInteger);
        };

        let Ok(end_index) = end.parse::<i64>() else {
            return Err(CommandError::NotAnInteger);
        };

        Ok(Self {
            key,
            start_index,
            end_index,
        })
    }
}

/// Handles the Redis LRANGE command. Out of range indexes are clamped, and
/// a start past the end yields an empty array.
pub async fn lrange(
    store: &KeyValueStore,
    arguments: Vec<String>,
) -> Result<CommandResult, CommandError> {
    let lrange_arguments = LrangeArguments::parse(arguments)?;

    let mut keyspace = store.lock().await;

    let Some(list) = keyspace.list(&lrange_arguments.key)? else {
        return Ok(CommandResult::Response(RespValue::Array(Vec::new())));
    };

    let Some((start, end)) = normalize_range(
        lrange_arguments.start_index,
        lrange_arguments.end_index,
        list.len(),
    ) else {
        return Ok(CommandResult::Response(RespValue::Array(Vec::new())));
    };

    Ok(CommandResult::Response(RespValue::array_of_bulk_strings(
        list.range(start..=end).cloned(),
    )))
}

/// Resolves an inclusive `[start, end]` index pair against a collection of
/// `len` elements, or `None` when the range selects nothing.
pub fn normalize_range(start: i64, end: i64, len: usize) -> Option<(usize, usize)> {
    let len = len as i64;

    let start = if start < 0 { (len + start).max(0) } else { start };
    let end = if end < 0 { len + end } else { end.min(len - 1) };

    if len == 0 || start > end || start >= len || end < 0 {
        return None;
    }

    Some((start as usize, end as usize))
}
