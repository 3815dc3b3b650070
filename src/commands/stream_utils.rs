use crate::{key_value_store::StreamEntry, resp::RespValue};

/// Converts stream entries to the RESP shape used by XRANGE and XREAD:
/// `[[id, [field, value, ...]], ...]`.
pub fn entries_to_resp(entries: &[StreamEntry]) -> RespValue {
    RespValue::Array(
        entries
            .iter()
            .map(|entry| {
                RespValue::Array(vec![
                    RespValue::BulkString(entry.id.to_string()),
                    RespValue::array_of_bulk_strings(
                        entry
                            .fields
                            .iter()
                            .flat_map(|(field, value)| [field.clone(), value.clone()]),
                    ),
                ])
            })
            .collect(),
    )
}
