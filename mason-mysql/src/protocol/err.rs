use crate::error::{protocol_err, Error};
use crate::protocol::buf::BufExt;
use crate::protocol::Dialect;

/// https://dev.mysql.com/doc/dev/mysql-server/8.0.12/page_protocol_basic_err_packet.html
/// https://mariadb.com/kb/en/err_packet/
#[derive(Debug)]
pub(crate) struct ErrPacket {
    pub(crate) code: u16,
    pub(crate) sql_state: Option<String>,
    pub(crate) message: String,
}

impl ErrPacket {
    pub(crate) fn decode(mut buf: &[u8], dialect: Dialect) -> Result<Self, Error> {
        let header = buf.get_u8()?;
        if header != 0xFF {
            return Err(protocol_err!("expected 0xFF; received 0x{:X}", header));
        }

        let code = buf.get_u16_le()?;

        let sql_state = if dialect == Dialect::V41 {
            let marker = buf.get_u8()?;
            if marker != b'#' {
                return Err(protocol_err!("expected '#' sql-state marker; received 0x{:X}", marker));
            }
            Some(buf.get_str(5)?.to_owned())
        } else {
            None
        };

        let message = buf.get_str_eof()?.to_owned();

        Ok(Self {
            code,
            sql_state,
            message,
        })
    }
}
