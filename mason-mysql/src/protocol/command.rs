use crate::protocol::buf::BufMutExt;

const COM_QUIT: u8 = 0x01;
const COM_INIT_DB: u8 = 0x02;
const COM_QUERY: u8 = 0x03;
const COM_PING: u8 = 0x0e;

/// `COM_QUERY`: opcode followed by the raw query text. Every SQL-level
/// operation this client issues — plain queries, `PREPARE`, `SET`,
/// `EXECUTE`, `BEGIN`/`COMMIT`/`ROLLBACK` — goes out through this one
/// command, since only the text protocol is in scope. `USE <database>`
/// goes through `COM_INIT_DB` instead (see `com_init_db` below).
pub(crate) fn com_query(query: &str) -> Vec<u8> {
    let mut buf = Vec::with_capacity(1 + query.len());
    buf.put_u8(COM_QUERY);
    buf.put_str_eof(query);
    buf
}

pub(crate) fn com_ping() -> Vec<u8> {
    vec![COM_PING]
}

pub(crate) fn com_quit() -> Vec<u8> {
    vec![COM_QUIT]
}

pub(crate) fn com_init_db(schema: &str) -> Vec<u8> {
    let mut buf = Vec::with_capacity(1 + schema.len());
    buf.put_u8(COM_INIT_DB);
    buf.put_str_eof(schema);
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_encodes_com_query() {
        assert_eq!(com_query("SELECT 1"), b"\x03SELECT 1");
    }

    #[test]
    fn it_encodes_com_ping() {
        assert_eq!(com_ping(), vec![0x0e]);
    }

    #[test]
    fn it_encodes_com_quit() {
        assert_eq!(com_quit(), vec![0x01]);
    }

    #[test]
    fn it_encodes_com_init_db() {
        assert_eq!(com_init_db("test"), b"\x02test");
    }
}
