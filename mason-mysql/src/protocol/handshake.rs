use crate::capabilities::Capabilities;
use crate::error::{protocol_err, Error};
use crate::protocol::buf::BufExt;
use crate::protocol::Dialect;

/// The server's initial greeting, sent unsolicited at `seq=0` when the
/// socket connects.
///
/// https://dev.mysql.com/doc/dev/mysql-server/8.0.12/page_protocol_connection_phase_packets_protocol_handshake_v10.html
/// https://mariadb.com/kb/en/connection/#initial-handshake-packet
#[derive(Debug)]
pub(crate) struct InitialHandshakePacket {
    pub(crate) protocol_version: u8,
    pub(crate) server_version: String,
    pub(crate) connection_id: u32,
    pub(crate) capabilities: Capabilities,
    pub(crate) status: u16,
    pub(crate) auth_plugin_data: Vec<u8>,
    pub(crate) auth_plugin_name: Option<String>,
}

impl InitialHandshakePacket {
    pub(crate) fn decode(mut buf: &[u8]) -> Result<Self, Error> {
        let protocol_version = buf.get_u8()?;
        let server_version = buf.get_str_nul()?.to_owned();
        let connection_id = buf.get_u32_le()?;

        let mut auth_plugin_data = buf.get_bytes(8)?.to_vec();
        buf.advance(1)?; // reserved filler byte

        let capabilities_lo = buf.get_u16_le()?;
        let _collation = buf.get_u8()?;
        let status = buf.get_u16_le()?;
        let capabilities_hi = buf.get_u16_le()?;

        let capabilities_bits = u32::from(capabilities_lo) | (u32::from(capabilities_hi) << 16);
        let capabilities = Capabilities::from_bits_truncate(capabilities_bits);

        let plugin_data_len = if capabilities.contains(Capabilities::PLUGIN_AUTH) {
            buf.get_u8()?
        } else {
            buf.advance(1)?;
            0
        };

        buf.advance(10)?; // reserved filler

        if capabilities.contains(Capabilities::SECURE_CONNECTION) {
            let len = std::cmp::max(13, plugin_data_len.saturating_sub(8)) as usize;
            let rest = buf.get_bytes(len)?;
            // the trailing byte of this span is a nul terminator shared with
            // the preceding fixed-length salt, not scramble material.
            auth_plugin_data.extend_from_slice(&rest[..rest.len().saturating_sub(1)]);
        }

        let auth_plugin_name = if capabilities.contains(Capabilities::PLUGIN_AUTH) {
            Some(buf.get_str_nul()?.to_owned())
        } else {
            None
        };

        Ok(Self {
            protocol_version,
            server_version,
            connection_id,
            capabilities,
            status,
            auth_plugin_data,
            auth_plugin_name,
        })
    }

    pub(crate) fn dialect(&self) -> Dialect {
        Dialect::from_version_string(&self.server_version)
    }
}
