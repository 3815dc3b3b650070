use crate::{
    commands::{command_error::CommandError, command_handler::CommandResult},
    key_value_store::{now_ms, IdSpec, StreamError},
    pubsub::stream_topic,
    resp::RespValue,
    state::State,
};

pub struct XaddArguments {
    key: String,
    id: IdSpec,
    fields: Vec<(String, String)>,
}

impl XaddArguments {
    /// Parses `XADD key id field value [field value ...]`.
    ///
    /// # Returns
    ///
    /// * `Ok(XaddArguments)` - Successfully parsed arguments
    /// * `Err(CommandError::WrongNumberOfArguments)` - If fields are missing or unpaired
    /// * `Err(CommandError::Stream)` - If the id is neither `*`, `ms-*` nor `ms-seq`
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() < 4 || arguments.len() % 2 != 0 {
            return Err(CommandError::wrong_arity("xadd"));
        }

        let id = arguments[1].parse::<IdSpec>()?;

        let fields = arguments[2..]
            .chunks_exact(2)
            .map(|pair| (pair[0].clone(), pair[1].clone()))
            .collect();

        Ok(Self {
            key: arguments[0].clone(),
            id,
            fields,
        })
    }
}

/// Handles the Redis XADD command and wakes the `XREAD BLOCK` callers
/// waiting on the stream.
pub async fn xadd(state: &State, arguments: Vec<String>) -> Result<CommandResult, CommandError> {
    let xadd_arguments = XaddArguments::parse(arguments)?;
    let now = u64::try_from(now_ms()).unwrap_or_default();

    let id = {
        let mut keyspace = state.store.lock().await;
        let existed = keyspace.contains_key(&xadd_arguments.key);

        let Some(stream) = keyspace.stream_mut(&xadd_arguments.key, true)? else {
            return Err(StreamError::InvalidId.into());
        };

        match stream.append(xadd_arguments.id, xadd_arguments.fields, now) {
            Ok(id) => id,
            Err(e) => {
                if !existed {
                    keyspace.remove(&xadd_arguments.key);
                }

                return Err(e.into());
            }
        }
    };

    state
        .broker
        .publish(
            &stream_topic(&xadd_arguments.key),
            RespValue::BulkString(id.to_string()),
        )
        .await;

    Ok(CommandResult::Response(RespValue::BulkString(id.to_string())))
}
