use crate::error::{protocol_err, Error};
use crate::protocol::buf::BufExt;

/// `AuthSwitchRequest`: the server asks the client to re-scramble the
/// password against a different plugin and seed. Leading byte `0xFE` in
/// this position is never confused with the row-streaming EOF sentinel —
/// an auth switch can only occur before the session is authenticated, and
/// the two contexts never overlap.
///
/// Promoted from the unused scaffolding in
/// `mason-mariadb::protocol::packets::auth_switch_request` (which only had
/// a `Serialize` impl, server -> client direction, never wired up) into a
/// real decode path.
///
/// https://dev.mysql.com/doc/dev/mysql-server/8.0.12/page_protocol_connection_phase_packets_protocol_auth_switch_request.html
#[derive(Debug)]
pub(crate) struct AuthSwitchRequest {
    pub(crate) plugin_name: String,
    pub(crate) plugin_data: Vec<u8>,
}

impl AuthSwitchRequest {
    pub(crate) fn decode(mut buf: &[u8]) -> Result<Self, Error> {
        let header = buf.get_u8()?;
        if header != 0xFE {
            return Err(protocol_err!("expected AuthSwitchRequest (0xFE); received 0x{:X}", header));
        }

        let plugin_name = buf.get_str_nul()?.to_owned();
        let mut plugin_data = buf.get_bytes_eof().to_vec();

        // The seed is (optionally) nul-terminated, matching the initial
        // handshake's own auth-plugin-data trailer; strip it so the scramble
        // functions see only the nonce, not an extra trailing byte.
        if plugin_data.last() == Some(&0x00) {
            plugin_data.pop();
        }

        Ok(Self { plugin_name, plugin_data })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_decodes_an_auth_switch_request_and_strips_the_nul_terminator() {
        let mut buf = Vec::new();
        buf.push(0xFE);
        buf.extend_from_slice(b"caching_sha2_password\x00");
        buf.extend_from_slice(b"0123456789012345678\x00");

        let switch = AuthSwitchRequest::decode(&buf).unwrap();
        assert_eq!(switch.plugin_name, "caching_sha2_password");
        assert_eq!(switch.plugin_data, b"0123456789012345678");
    }

    #[test]
    fn it_rejects_bad_header() {
        assert!(AuthSwitchRequest::decode(b"\x00").is_err());
    }
}
