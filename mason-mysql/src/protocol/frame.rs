use crate::error::{protocol_err, Error};
use byteorder::{ByteOrder, LittleEndian};

pub(crate) const HEADER_LEN: usize = 4;
pub(crate) const MAX_PAYLOAD_LEN: usize = 0xFF_FFFF;

/// Splits a 4-byte packet header into its length and sequence number.
pub(crate) fn decode_header(header: &[u8; HEADER_LEN]) -> (usize, u8) {
    let len = LittleEndian::read_u24(&header[0..3]) as usize;
    (len, header[3])
}

/// Writes `len[3] | seq[1]` into `header`.
pub(crate) fn encode_header(payload_len: usize, seq: u8) -> Result<[u8; HEADER_LEN], Error> {
    if payload_len > MAX_PAYLOAD_LEN {
        return Err(protocol_err!(
            "payload of {} bytes exceeds the single-frame limit of {} bytes",
            payload_len,
            MAX_PAYLOAD_LEN
        ));
    }

    let mut header = [0u8; HEADER_LEN];
    LittleEndian::write_u24(&mut header[0..3], payload_len as u32);
    header[3] = seq;
    Ok(header)
}
