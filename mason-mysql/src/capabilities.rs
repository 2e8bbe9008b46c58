// https://dev.mysql.com/doc/dev/mysql-server/8.0.12/group__group__cs__capabilities__flags.html
// https://mariadb.com/kb/en/connection/#capabilities
bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Capabilities: u32 {
        const LONG_PASSWORD = 1;
        const FOUND_ROWS = 2;
        const LONG_FLAG = 4;
        const CONNECT_WITH_DB = 8;
        const NO_SCHEMA = 16;
        const COMPRESS = 32;
        const ODBC = 64;
        const LOCAL_FILES = 128;
        const IGNORE_SPACE = 256;
        const PROTOCOL_41 = 512;
        const INTERACTIVE = 1024;
        const SSL = 2048;
        const IGNORE_SIGPIPE = 4096;
        const TRANSACTIONS = 8192;
        const RESERVED = 16384;
        const SECURE_CONNECTION = 32768;
        const MULTI_STATEMENTS = 65536;
        const MULTI_RESULTS = 131_072;
        const PS_MULTI_RESULTS = 262_144;
        const PLUGIN_AUTH = 524_288;
        const CONNECT_ATTRS = 1_048_576;
        const PLUGIN_AUTH_LENENC_DATA = 2_097_152;
        const CAN_HANDLE_EXPIRED_PASSWORDS = 4_194_304;
        const SESSION_TRACK = 8_388_608;
        const DEPRECATE_EOF = 16_777_216;
        const MYSQL = 1 << 31;
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Capabilities::PROTOCOL_41
            | Capabilities::SECURE_CONNECTION
            | Capabilities::PLUGIN_AUTH
            | Capabilities::PLUGIN_AUTH_LENENC_DATA
            | Capabilities::TRANSACTIONS
            | Capabilities::FOUND_ROWS
            | Capabilities::MULTI_RESULTS
            | Capabilities::MULTI_STATEMENTS
    }
}
