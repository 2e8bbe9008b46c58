use crate::error::{protocol_err, Error};
use crate::protocol::buf::BufExt;
use crate::status::Status;

/// `0xFE` followed by fewer than 8 bytes of trailing payload: warning count
/// and server status. A row packet may also start with `0xFE` (as the LCB
/// marker for an NULL-ish length-prefixed value of exactly 254), so callers
/// must check the remaining payload length *before* parsing this, not after.
#[derive(Debug)]
pub(crate) struct EofPacket {
    pub(crate) warnings: u16,
    pub(crate) status: Status,
}

/// A packet's leading byte is `0xFE` and its total length is small enough
/// that it cannot be row data — the sole disambiguator the protocol offers.
pub(crate) fn looks_like_eof(packet: &[u8]) -> bool {
    packet.first() == Some(&0xFE) && packet.len() < 9
}

impl EofPacket {
    pub(crate) fn decode(mut buf: &[u8]) -> Result<Self, Error> {
        let header = buf.get_u8()?;
        if header != 0xFE {
            return Err(protocol_err!("expected 0xFE; received 0x{:X}", header));
        }

        let warnings = buf.get_u16_le()?;
        let status = Status::from_bits_truncate(buf.get_u16_le()?);

        Ok(Self { warnings, status })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_decodes_an_eof_packet() {
        let buf: &[u8] = b"\xFE\x00\x00\x02\x00";
        let p = EofPacket::decode(buf).unwrap();

        assert_eq!(p.warnings, 0);
        assert!(p.status.contains(Status::SERVER_STATUS_AUTOCOMMIT));
    }

    #[test]
    fn it_recognizes_eof_by_length() {
        assert!(looks_like_eof(b"\xFE\x00\x00\x02\x00"));
        assert!(!looks_like_eof(b"\xFE\x00\x00\x02\x00\x00\x00\x00\x00"));
    }

    #[test]
    fn it_rejects_bad_header() {
        assert!(EofPacket::decode(b"\x00\x00\x00\x00\x00").is_err());
    }
}
