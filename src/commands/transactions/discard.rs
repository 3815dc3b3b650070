use crate::{
    commands::{transactions::Transaction, CommandError},
    resp::RespValue,
};

pub struct DiscardArguments;

impl DiscardArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if !arguments.is_empty() {
            return Err(CommandError::wrong_arity("discard"));
        }

        Ok(Self)
    }
}

pub fn discard(
    transaction: &mut Transaction,
    arguments: Vec<String>,
) -> Result<RespValue, CommandError> {
    DiscardArguments::parse(arguments)?;

    let Some(_) = transaction.take_queued() else {
        return Err(CommandError::DiscardWithoutMulti);
    };

    Ok(RespValue::ok())
}
