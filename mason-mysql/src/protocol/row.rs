use crate::error::Error;
use crate::protocol::buf::BufExt;
use crate::protocol::types::ColumnType;
use crate::value::{decode_text_value, Value};

/// Decodes one text-protocol row packet: one length-coded string per
/// column, in column order. The LCB NULL sentinel on any field becomes
/// `Value::Null` directly, bypassing the column's type conversion.
pub(crate) fn decode(mut buf: &[u8], column_types: &[ColumnType]) -> Result<Vec<Value>, Error> {
    let mut row = Vec::with_capacity(column_types.len());

    for &ty in column_types {
        match buf.get_bytes_lenenc()? {
            None => row.push(Value::Null),
            Some(bytes) => row.push(decode_text_value(bytes, ty)?),
        }
    }

    Ok(row)
}
