use crate::error::{protocol_err, Error};
use crate::protocol::buf::BufExt;
use crate::status::Status;

/// https://dev.mysql.com/doc/dev/mysql-server/8.0.12/page_protocol_basic_ok_packet.html
/// https://mariadb.com/kb/en/ok_packet/
#[derive(Debug)]
pub(crate) struct OkPacket {
    pub(crate) affected_rows: u64,
    pub(crate) last_insert_id: u64,
    pub(crate) status: Status,
    pub(crate) warnings: u16,
}

impl OkPacket {
    pub(crate) fn decode(mut buf: &[u8]) -> Result<Self, Error> {
        let header = buf.get_u8()?;
        if header != 0x00 && header != 0xFE {
            return Err(protocol_err!("expected 0x00 or 0xFE; received 0x{:X}", header));
        }

        let affected_rows = buf.get_uint_lenenc()?.unwrap_or(0);
        let last_insert_id = buf.get_uint_lenenc()?.unwrap_or(0);
        let status = Status::from_bits_truncate(buf.get_u16_le()?);
        let warnings = buf.get_u16_le()?;

        Ok(Self {
            affected_rows,
            last_insert_id,
            status,
            warnings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OK_HANDSHAKE: &[u8] = b"\x00\x00\x00\x02\x00\x00\x00";

    #[test]
    fn it_decodes_an_ok_packet() {
        let p = OkPacket::decode(OK_HANDSHAKE).unwrap();

        assert_eq!(p.affected_rows, 0);
        assert_eq!(p.last_insert_id, 0);
        assert_eq!(p.warnings, 0);
        assert!(p.status.contains(Status::SERVER_STATUS_AUTOCOMMIT));
    }

    #[test]
    fn it_decodes_affected_rows_and_insert_id() {
        // affected_rows = 3 (direct LCB), last_insert_id = 300 (0xFC marker + u16), status = 2, warnings = 0
        let buf: &[u8] = b"\x00\x03\xFC\x2C\x01\x02\x00\x00\x00";
        let p = OkPacket::decode(buf).unwrap();

        assert_eq!(p.affected_rows, 3);
        assert_eq!(p.last_insert_id, 300);
    }

    #[test]
    fn it_rejects_bad_header() {
        assert!(OkPacket::decode(b"\x01\x00\x00\x00\x00\x00\x00").is_err());
    }
}
