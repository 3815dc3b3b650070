use crate::{
    commands::{command_error::CommandError, command_handler::CommandResult},
    key_value_store::{now_ms, DataType, KeyValueStore},
    resp::RespValue,
};

/// Represents the parsed arguments for SET command
#[derive(Debug, PartialEq)]
pub struct SetArguments {
    /// The key name to store the value under
    key: String,
    /// The value to be stored under the given key
    value: String,
    /// Time to live in milliseconds
    ttl_ms: Option<i64>,
}

impl SetArguments {
    /// Parses command arguments into a SetArguments structure.
    ///
    /// # Arguments
    ///
    /// * `arguments` - A vector of strings representing the command arguments:
    ///   - Format 1: `[key, value]` - For permanent storage
    ///   - Format 2: `[key, value, "PX", milliseconds]` - Expiring after milliseconds
    ///   - Format 3: `[key, value, "EX", seconds]` - Expiring after seconds
    ///
    /// # Returns
    ///
    /// * `Ok(SetArguments)` - Successfully parsed arguments
    /// * `Err(CommandError::WrongNumberOfArguments)` - If there are fewer than 2 arguments
    /// * `Err(CommandError::SyntaxError)` - If the option is neither `PX` nor `EX`
    /// * `Err(CommandError::NotAnInteger)` - If the expiration time is not an integer
    /// * `Err(CommandError::InvalidExpireTime)` - If the expiration time is not positive
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() < 2 {
            return Err(CommandError::wrong_arity("set"));
        }

        let mut arguments = arguments.into_iter();
        let (Some(key), Some(value)) = (arguments.next(), arguments.next()) else {
            return Err(CommandError::wrong_arity("set"));
        };

        let options: Vec<String> = arguments.collect();

        let ttl_ms = match options.as_slice() {
            [] => None,
            [unit, amount] => {
                let amount = amount
                    .parse::<i64>()
                    .map_err(|_| CommandError::NotAnInteger)?;

                let multiplier = match unit.to_uppercase().as_str() {
                    "PX" => 1,
                    "EX" => 1000,
                    _ => return Err(CommandError::SyntaxError),
                };

                if amount <= 0 {
                    return Err(CommandError::InvalidExpireTime("set".to_string()));
                }

                Some(
                    amount
                        .checked_mul(multiplier)
                        .ok_or_else(|| CommandError::InvalidExpireTime("set".to_string()))?,
                )
            }
            _ => return Err(CommandError::SyntaxError),
        };

        Ok(Self { key, value, ttl_ms })
    }
}

/// Handles the Redis SET command.
///
/// Stores a string under the key, replacing any previous value of any type
/// and its expiry.
///
/// # Examples
///
/// ```ignore
/// // SET mykey "hello" PX 1000  (expires in 1 second)
/// let result = set(&store, vec![
///     "mykey".to_string(),
///     "hello".to_string(),
///     "PX".to_string(),
///     "1000".to_string()
/// ]).await;
/// // Returns: CommandResult::Response(SimpleString("OK"))
/// ```
pub async fn set(
    store: &KeyValueStore,
    arguments: Vec<String>,
) -> Result<CommandResult, CommandError> {
    let set_arguments = SetArguments::parse(arguments)?;

    let expiration = set_arguments
        .ttl_ms
        .map(|ttl| now_ms().saturating_add(ttl));

    store
        .set(
            &set_arguments.key,
            DataType::String(set_arguments.value),
            expiration,
        )
        .await;

    Ok(CommandResult::Response(RespValue::ok()))
}
