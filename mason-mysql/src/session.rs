use std::collections::HashSet;
use std::time::Duration;

use tokio::io::{AsyncWriteExt, WriteHalf};
use tokio::net::TcpStream;
use tokio::sync::mpsc;

use crate::capabilities::Capabilities;
use crate::error::{protocol_err, Error};
use crate::protocol::buf::BufExt;
use crate::protocol::types::ColumnType;
use crate::protocol::eof::{looks_like_eof, EofPacket};
use crate::protocol::err::ErrPacket;
use crate::protocol::ok::OkPacket;
use crate::protocol::{column_def, command, frame, row, Dialect};
use crate::receiver::{Frame, Incoming};
use crate::status::Status;
use crate::value::{encode_literal, Value};

/// One column's shape, as reported by a field-definition packet.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnMeta {
    pub table: String,
    pub field: String,
    pub length: u64,
    pub ty: ColumnType,
}

/// The outcome of a query or prepared execution.
#[derive(Debug, Clone, PartialEq)]
pub enum MySqlResult {
    Updated { affected_rows: u64, insert_id: u64 },
    Data { fields: Vec<ColumnMeta>, rows: Vec<Vec<Value>> },
}

/// The request/response state machine for one connection: owns the socket's
/// write half, the sequence counter, the negotiated dialect, and the
/// transaction and prepared-statement bookkeeping. All reads arrive through
/// `incoming`, fed by the Receiver task running in parallel.
pub struct Session {
    writer: WriteHalf<TcpStream>,
    incoming: mpsc::UnboundedReceiver<Incoming>,
    pub(crate) dialect: Dialect,
    pub(crate) capabilities: Capabilities,
    pub(crate) server_status: Status,
    prepared_names: HashSet<String>,
    transaction_depth: u8,
    default_timeout: Option<Duration>,
}

impl Session {
    pub(crate) fn new(
        writer: WriteHalf<TcpStream>,
        incoming: mpsc::UnboundedReceiver<Incoming>,
        dialect: Dialect,
        capabilities: Capabilities,
        default_timeout: Option<Duration>,
    ) -> Self {
        Self {
            writer,
            incoming,
            dialect,
            capabilities,
            server_status: Status::empty(),
            prepared_names: HashSet::new(),
            transaction_depth: 0,
            default_timeout,
        }
    }

    pub fn transaction_depth(&self) -> u8 {
        self.transaction_depth
    }

    /// Writes one frame (header + payload) to the socket. Every top-level
    /// command resets the sequence counter to 0 before the first send, per
    /// the source's (and this spec's) unconditional `seq=0` convention.
    async fn send_frame(&mut self, payload: &[u8], seq: u8) -> Result<(), Error> {
        let header = frame::encode_header(payload.len(), seq)?;
        self.writer.write_all(&header).await?;
        self.writer.write_all(payload).await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Blocks for the next frame off the Receiver's channel, verifying its
    /// sequence number matches what the protocol's request/response
    /// discipline requires.
    ///
    /// If `default_timeout` is set, the wait is bounded by
    /// `tokio::time::timeout`; elapsing surfaces `Error::Timeout` to the
    /// caller without disturbing the channel itself — a frame that arrives
    /// after the caller has given up is simply picked up by the next call.
    async fn recv_frame(&mut self, expected_seq: u8) -> Result<Frame, Error> {
        let incoming = match self.default_timeout {
            Some(duration) => tokio::time::timeout(duration, self.incoming.recv())
                .await
                .map_err(|_| Error::Timeout)?,
            None => self.incoming.recv().await,
        };

        match incoming {
            Some(Incoming::Frame(frame)) => {
                if frame.seq != expected_seq {
                    return Err(protocol_err!(
                        "sequence mismatch: expected {}, received {}",
                        expected_seq,
                        frame.seq
                    ));
                }
                Ok(frame)
            }
            Some(Incoming::Closed(reason)) => {
                tracing::warn!(%reason, "connection closed while awaiting a response");
                Err(Error::SocketClosed)
            }
            None => Err(Error::SocketClosed),
        }
    }

    /// `COM_QUERY`: send `query`, then decode whatever comes back (OK, ERR,
    /// or a result set) into a `MySqlResult`.
    pub async fn fetch(&mut self, query: &str) -> Result<MySqlResult, Error> {
        tracing::debug!(query, "fetch");
        self.command(command::com_query(query)).await
    }

    /// `COM_INIT_DB`: selects `schema` as the connection's default database.
    /// Used by `Connection::establish` for the post-handshake `USE`
    /// equivalent instead of routing it through `fetch` as a text query.
    pub(crate) async fn init_db(&mut self, schema: &str) -> Result<MySqlResult, Error> {
        tracing::debug!(schema, "init_db");
        self.command(command::com_init_db(schema)).await
    }

    /// `COM_PING`: round-trips an OK packet with no server-side effect,
    /// useful for checking a connection is still alive.
    pub async fn ping(&mut self) -> Result<MySqlResult, Error> {
        tracing::debug!("ping");
        self.command(command::com_ping()).await
    }

    /// `COM_QUIT`: tells the server this connection is closing. The server
    /// closes the socket in response rather than sending a packet back, so
    /// this sends the command and does not wait on a reply.
    pub async fn quit(&mut self) -> Result<(), Error> {
        tracing::debug!("quit");
        self.send_frame(&command::com_quit(), 0).await
    }

    /// Sends a single command payload at `seq=0` and decodes whatever comes
    /// back (OK, ERR, or a result set); the shared send/decode path behind
    /// `fetch`, `init_db`, and `ping`.
    async fn command(&mut self, payload: Vec<u8>) -> Result<MySqlResult, Error> {
        self.send_frame(&payload, 0).await?;

        let response = self.recv_frame(1).await?;
        self.decode_query_response(response.payload, 1).await
    }

    /// Issues `queries` one after another on the same sequence-0 exchange
    /// discipline; stops at the first server error and returns it, otherwise
    /// returns the final query's result.
    pub async fn fetch_all<'a>(
        &mut self,
        queries: impl IntoIterator<Item = &'a str>,
    ) -> Result<MySqlResult, Error> {
        let mut last = None;
        for query in queries {
            last = Some(self.fetch(query).await?);
        }
        last.ok_or_else(|| protocol_err!("fetch_all called with an empty query list"))
    }

    /// `PREPARE`/`SET`/`EXECUTE` dance for a named prepared statement.
    /// `statement` is assumed pre-escaped by the external statement
    /// registry; this layer only assembles the surrounding SQL.
    pub async fn execute(
        &mut self,
        name: &str,
        statement: &str,
        params: &[Value],
    ) -> Result<MySqlResult, Error> {
        if !self.prepared_names.contains(name) {
            let prepare_sql = format!("PREPARE {} FROM '{}'", name, statement);
            match self.fetch(&prepare_sql).await? {
                MySqlResult::Updated { .. } => {
                    self.prepared_names.insert(name.to_owned());
                }
                MySqlResult::Data { .. } => {
                    return Err(protocol_err!("PREPARE `{}` did not return an OK packet", name));
                }
            }
        }

        for (i, value) in params.iter().enumerate() {
            let literal = encode_literal(value)?;
            let set_sql = format!("SET @{} = {}", i + 1, literal);
            self.fetch(&set_sql).await?;
        }

        let execute_sql = if params.is_empty() {
            format!("EXECUTE {}", name)
        } else {
            let using = (1..=params.len()).map(|i| format!("@{}", i)).collect::<Vec<_>>().join(", ");
            format!("EXECUTE {} USING {}", name, using)
        };

        self.fetch(&execute_sql).await
    }

    pub async fn begin(&mut self) -> Result<MySqlResult, Error> {
        let result = self.fetch("BEGIN").await?;
        self.transaction_depth = 1;
        Ok(result)
    }

    pub async fn commit(&mut self) -> Result<MySqlResult, Error> {
        let result = self.fetch("COMMIT").await?;
        self.transaction_depth = 0;
        Ok(result)
    }

    pub async fn rollback(&mut self) -> Result<MySqlResult, Error> {
        let result = self.fetch("ROLLBACK").await?;
        self.transaction_depth = 0;
        Ok(result)
    }

    /// Raw access used only by the Authenticator during the handshake, which
    /// runs before `Session` takes ownership of sequencing discipline for
    /// query traffic proper.
    pub(crate) async fn send_raw(&mut self, payload: &[u8], seq: u8) -> Result<(), Error> {
        self.send_frame(payload, seq).await
    }

    pub(crate) async fn recv_raw(&mut self, expected_seq: u8) -> Result<Frame, Error> {
        self.recv_frame(expected_seq).await
    }

    async fn decode_query_response(&mut self, payload: Vec<u8>, next_seq: u8) -> Result<MySqlResult, Error> {
        match payload.first().copied() {
            Some(0x00) => {
                let ok = OkPacket::decode(&payload)?;
                self.server_status = ok.status;
                Ok(MySqlResult::Updated {
                    affected_rows: ok.affected_rows,
                    insert_id: ok.last_insert_id,
                })
            }

            Some(0xFF) => {
                let err = ErrPacket::decode(&payload, self.dialect)?;
                Err(Error::ServerError {
                    code: err.code,
                    sql_state: err.sql_state,
                    message: err.message,
                })
            }

            // The header packet itself was already read at `next_seq`; the
            // first field packet comes one sequence number after that.
            Some(_) => self.decode_result_set(&payload, next_seq.wrapping_add(1)).await,

            None => Err(protocol_err!("empty response packet")),
        }
    }

    /// Header packet (column count) -> N field packets -> EOF -> M row
    /// packets -> EOF/ERR, per the strict result-set sequence this protocol
    /// guarantees.
    async fn decode_result_set(&mut self, header_payload: &[u8], mut seq: u8) -> Result<MySqlResult, Error> {
        let mut buf: &[u8] = header_payload;
        let column_count = buf
            .get_uint_lenenc()?
            .ok_or_else(|| protocol_err!("result set header LCB decoded to NULL"))?;

        if column_count == 0 {
            // An empty-result-set header is, per spec, equivalent to an
            // OK-less "nothing happened" response; normalize it the same way.
            return Ok(MySqlResult::Updated { affected_rows: 0, insert_id: 0 });
        }

        let mut fields = Vec::with_capacity(column_count as usize);
        for _ in 0..column_count {
            let frame = self.recv_frame(seq).await?;
            seq = seq.wrapping_add(1);
            fields.push(column_def::decode(&frame.payload, self.dialect)?);
        }

        let eof_frame = self.recv_frame(seq).await?;
        seq = seq.wrapping_add(1);
        if !looks_like_eof(&eof_frame.payload) {
            return Err(protocol_err!("expected EOF after field packets"));
        }
        let eof = EofPacket::decode(&eof_frame.payload)?;
        self.server_status = eof.status;

        let column_types: Vec<ColumnType> = fields.iter().map(|f| f.ty).collect();
        let mut rows = Vec::new();

        loop {
            let row_frame = self.recv_frame(seq).await?;
            seq = seq.wrapping_add(1);

            match row_frame.payload.first().copied() {
                Some(0xFF) => {
                    let err = ErrPacket::decode(&row_frame.payload, self.dialect)?;
                    return Err(Error::ServerError {
                        code: err.code,
                        sql_state: err.sql_state,
                        message: err.message,
                    });
                }
                Some(0xFE) if looks_like_eof(&row_frame.payload) => {
                    let eof = EofPacket::decode(&row_frame.payload)?;
                    self.server_status = eof.status;
                    break;
                }
                _ => {
                    rows.push(row::decode(&row_frame.payload, &column_types)?);
                }
            }
        }

        Ok(MySqlResult::Data { fields, rows })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::buf::BufMutExt;

    #[test]
    fn column_meta_carries_type_for_row_decoding() {
        let meta = ColumnMeta {
            table: "t".to_owned(),
            field: "a".to_owned(),
            length: 11,
            ty: ColumnType::Long,
        };
        assert_eq!(meta.ty, ColumnType::Long);
    }

    fn v41_field_packet(ty: ColumnType) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.put_str_lenenc("def");
        buf.put_str_lenenc("testdb");
        buf.put_str_lenenc("t");
        buf.put_str_lenenc("t");
        buf.put_str_lenenc("a");
        buf.put_str_lenenc("a");
        buf.put_uint_lenenc(Some(0x0c));
        buf.put_u16_le(33);
        buf.put_u32_le(11);
        buf.put_u8(ty.tag());
        buf.put_u16_le(0);
        buf.put_u8(0);
        buf
    }

    fn eof_packet() -> Vec<u8> {
        let mut buf = Vec::new();
        buf.put_u8(0xFE);
        buf.put_u16_le(0);
        buf.put_u16_le(2); // SERVER_STATUS_AUTOCOMMIT
        buf
    }

    /// Regression test for the off-by-one that fed the result-set header's
    /// own sequence number back in as the expected sequence for the first
    /// field packet: a real server sends the header at seq N and the first
    /// field packet at N+1, so `fetch()` must hand `decode_result_set` the
    /// seq *after* the header, not the header's own.
    #[tokio::test]
    async fn fetch_decodes_a_result_set_without_a_sequence_mismatch() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let client = tokio::net::TcpStream::connect(addr).await.unwrap();
        let (_server, _) = listener.accept().await.unwrap();

        let (_read_half, write_half) = tokio::io::split(client);
        let (tx, rx) = mpsc::unbounded_channel();

        let mut session = Session::new(write_half, rx, Dialect::V41, Capabilities::empty(), None);

        let mut header = Vec::new();
        header.put_uint_lenenc(Some(1));

        let mut row = Vec::new();
        row.put_str_lenenc("1");

        // `fetch()` sends the query at seq=0 and expects the header at
        // seq=1; the field packet, EOF, row, and trailing EOF follow at
        // 2, 3, 4, 5.
        tx.send(Incoming::Frame(Frame { seq: 1, payload: header })).unwrap();
        tx.send(Incoming::Frame(Frame {
            seq: 2,
            payload: v41_field_packet(ColumnType::Long),
        }))
        .unwrap();
        tx.send(Incoming::Frame(Frame { seq: 3, payload: eof_packet() })).unwrap();
        tx.send(Incoming::Frame(Frame { seq: 4, payload: row })).unwrap();
        tx.send(Incoming::Frame(Frame { seq: 5, payload: eof_packet() })).unwrap();

        let result = session.fetch("SELECT 1").await.unwrap();

        match result {
            MySqlResult::Data { fields, rows } => {
                assert_eq!(fields.len(), 1);
                assert_eq!(fields[0].ty, ColumnType::Long);
                assert_eq!(rows, vec![vec![Value::Int(1)]]);
            }
            other => panic!("expected a result set, got {:?}", other),
        }
    }
}
