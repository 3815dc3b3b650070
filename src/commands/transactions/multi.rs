use crate::{
    commands::{transactions::Transaction, CommandError},
    resp::RespValue,
};

pub struct MultiArguments;

impl MultiArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if !arguments.is_empty() {
            return Err(CommandError::wrong_arity("multi"));
        }

        Ok(Self)
    }
}

/// Handles MULTI. A transaction already in progress is replaced.
pub fn multi(
    transaction: &mut Transaction,
    arguments: Vec<String>,
) -> Result<RespValue, CommandError> {
    MultiArguments::parse(arguments)?;

    transaction.begin();

    Ok(RespValue::ok())
}
