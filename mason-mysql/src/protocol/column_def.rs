use crate::error::Error;
use crate::protocol::buf::BufExt;
use crate::protocol::types::ColumnType;
use crate::protocol::Dialect;
use crate::session::ColumnMeta;

/// Decodes one field-definition packet's payload, in the shape dictated by
/// the negotiated dialect.
///
/// V40: five length-coded strings `table, field, length_bytes, type_byte, flags`.
/// V41: six length-coded strings followed by a fixed 13-byte trailer
/// (length-of-fixed-fields lenenc byte + charset:16 + length:32 + type:8 +
/// flags:16 + decimals:8).
pub(crate) fn decode(mut buf: &[u8], dialect: Dialect) -> Result<ColumnMeta, Error> {
    match dialect {
        Dialect::V40 => {
            let table = buf.get_str_lenenc()?.unwrap_or("").to_owned();
            let field = buf.get_str_lenenc()?.unwrap_or("").to_owned();

            let length_bytes = buf
                .get_bytes_lenenc()?
                .ok_or_else(|| crate::error::protocol_err!("missing field length"))?;
            let length = read_le_uint(length_bytes);

            let type_bytes = buf
                .get_bytes_lenenc()?
                .ok_or_else(|| crate::error::protocol_err!("missing field type"))?;
            let ty = ColumnType::from_tag(*type_bytes.first().unwrap_or(&0))?;

            let _flags = buf.get_bytes_lenenc()?;

            Ok(ColumnMeta {
                table,
                field,
                length,
                ty,
            })
        }

        Dialect::V41 => {
            let _catalog = buf.get_str_lenenc()?;
            let _database = buf.get_str_lenenc()?;
            let table = buf.get_str_lenenc()?.unwrap_or("").to_owned();
            let _org_table = buf.get_str_lenenc()?;
            let field = buf.get_str_lenenc()?.unwrap_or("").to_owned();
            let _org_field = buf.get_str_lenenc()?;

            let fixed_fields_len = buf
                .get_uint_lenenc()?
                .ok_or_else(|| crate::error::protocol_err!("missing length-of-fixed-fields marker"))?;
            if fixed_fields_len != 0x0c {
                return Err(crate::error::protocol_err!(
                    "expected length-of-fixed-fields == 12; received {}",
                    fixed_fields_len
                ));
            }

            let _charset = buf.get_u16_le()?;
            let length = buf.get_u32_le()? as u64;
            let ty = ColumnType::from_tag(buf.get_u8()?)?;
            let _flags = buf.get_u16_le()?;
            let _decimals = buf.get_u8()?;

            Ok(ColumnMeta {
                table,
                field,
                length,
                ty,
            })
        }
    }
}

fn read_le_uint(bytes: &[u8]) -> u64 {
    let mut value = 0u64;
    for (i, &b) in bytes.iter().enumerate().take(8) {
        value |= u64::from(b) << (8 * i);
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_decodes_a_v41_column_def() {
        let mut buf = Vec::new();
        use crate::protocol::buf::BufMutExt;
        buf.put_str_lenenc("def"); // catalog
        buf.put_str_lenenc("testdb"); // database
        buf.put_str_lenenc("t"); // table
        buf.put_str_lenenc("t"); // org_table
        buf.put_str_lenenc("a"); // field
        buf.put_str_lenenc("a"); // org_field
        buf.put_uint_lenenc(Some(0x0c));
        buf.put_u16_le(33); // charset
        buf.put_u32_le(11); // length
        buf.put_u8(ColumnType::Long.tag());
        buf.put_u16_le(0); // flags
        buf.put_u8(0); // decimals

        let meta = decode(&buf, Dialect::V41).unwrap();

        assert_eq!(meta.table, "t");
        assert_eq!(meta.field, "a");
        assert_eq!(meta.length, 11);
        assert_eq!(meta.ty, ColumnType::Long);
    }

    #[test]
    fn it_rejects_a_bad_fixed_fields_marker() {
        let mut buf = Vec::new();
        use crate::protocol::buf::BufMutExt;
        buf.put_str_lenenc("def");
        buf.put_str_lenenc("testdb");
        buf.put_str_lenenc("t");
        buf.put_str_lenenc("t");
        buf.put_str_lenenc("a");
        buf.put_str_lenenc("a");
        buf.put_uint_lenenc(Some(5));

        assert!(decode(&buf, Dialect::V41).is_err());
    }

    #[test]
    fn it_decodes_a_v40_column_def() {
        let mut buf = Vec::new();
        use crate::protocol::buf::BufMutExt;
        buf.put_str_lenenc("t");
        buf.put_str_lenenc("a");
        buf.put_bytes_lenenc(&3u32.to_le_bytes()[0..3]);
        buf.put_bytes_lenenc(&[ColumnType::Long.tag()]);
        buf.put_bytes_lenenc(&[0, 0]);

        let meta = decode(&buf, Dialect::V40).unwrap();

        assert_eq!(meta.table, "t");
        assert_eq!(meta.field, "a");
        assert_eq!(meta.length, 3);
        assert_eq!(meta.ty, ColumnType::Long);
    }
}
