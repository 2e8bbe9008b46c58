use crate::capabilities::Capabilities;
use crate::protocol::buf::BufMutExt;

const MAX_PACKET_SIZE: u32 = 0xFF_FFFF;
const COLLATION_UTF8_GENERAL_CI: u8 = 33;

/// The client's response to the server greeting: offered capabilities,
/// username, scrambled auth response, and (optionally) the database to
/// select and the auth plugin in use.
///
/// https://dev.mysql.com/doc/dev/mysql-server/8.0.12/page_protocol_connection_phase_packets_protocol_handshake_response.html
#[derive(Debug)]
pub(crate) struct HandshakeResponsePacket<'a> {
    pub(crate) capabilities: Capabilities,
    pub(crate) username: &'a str,
    pub(crate) auth_response: &'a [u8],
    pub(crate) database: Option<&'a str>,
    pub(crate) auth_plugin_name: Option<&'a str>,
}

impl<'a> HandshakeResponsePacket<'a> {
    pub(crate) fn encode(&self, buf: &mut Vec<u8>) {
        buf.put_u32_le(self.capabilities.bits());
        buf.put_u32_le(MAX_PACKET_SIZE);
        buf.put_u8(COLLATION_UTF8_GENERAL_CI);
        buf.put_bytes(&[0u8; 23]);

        buf.put_str_nul(self.username);

        if self.capabilities.contains(Capabilities::PLUGIN_AUTH_LENENC_DATA) {
            buf.put_bytes_lenenc(self.auth_response);
        } else if self.capabilities.contains(Capabilities::SECURE_CONNECTION) {
            buf.put_u8(self.auth_response.len() as u8);
            buf.put_bytes(self.auth_response);
        } else {
            buf.put_u8(0);
        }

        if self.capabilities.contains(Capabilities::CONNECT_WITH_DB) {
            if let Some(database) = self.database {
                buf.put_str_nul(database);
            }
        }

        if self.capabilities.contains(Capabilities::PLUGIN_AUTH) {
            if let Some(name) = self.auth_plugin_name {
                buf.put_str_nul(name);
            }
        }
    }
}
