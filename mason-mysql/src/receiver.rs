use tokio::io::{AsyncReadExt, ReadHalf};
use tokio::net::TcpStream;
use tokio::sync::mpsc;

use crate::protocol::frame::{decode_header, HEADER_LEN};

/// One fully-framed server packet: its payload with the 4-byte header
/// stripped off, and the sequence number the header carried.
#[derive(Debug)]
pub(crate) struct Frame {
    pub(crate) seq: u8,
    pub(crate) payload: Vec<u8>,
}

/// What the Receiver hands back to the Session over the channel.
#[derive(Debug)]
pub(crate) enum Incoming {
    Frame(Frame),
    /// Socket closed or errored; delivered exactly once, then the task exits.
    Closed(String),
}

/// Owns the read half of the socket. Reads, reassembles, and forwards
/// frames to the Session; never writes and never interprets a payload.
///
/// Grounded on `mason-mariadb::connection::receiver`'s adaptive-growth read
/// loop: the buffer is extended in small increments rather than pre-sized to
/// some guessed packet length, so a chatty connection doesn't pay for a huge
/// zeroed allocation up front.
pub(crate) async fn run(mut reader: ReadHalf<TcpStream>, sender: mpsc::UnboundedSender<Incoming>) {
    let mut buf: Vec<u8> = Vec::with_capacity(1024);
    let mut filled = 0usize;

    loop {
        if filled == buf.len() {
            buf.resize(buf.len() + 4096, 0);
        }

        let n = match reader.read(&mut buf[filled..]).await {
            Ok(0) => {
                let _ = sender.send(Incoming::Closed("end of stream".to_owned()));
                return;
            }
            Ok(n) => n,
            Err(e) => {
                let _ = sender.send(Incoming::Closed(e.to_string()));
                return;
            }
        };

        filled += n;

        loop {
            if filled < HEADER_LEN {
                break;
            }

            let mut header = [0u8; HEADER_LEN];
            header.copy_from_slice(&buf[..HEADER_LEN]);
            let (len, seq) = decode_header(&header);

            if filled < HEADER_LEN + len {
                break;
            }

            let payload = buf[HEADER_LEN..HEADER_LEN + len].to_vec();
            let consumed = HEADER_LEN + len;
            buf.drain(..consumed);
            filled -= consumed;

            if sender.send(Incoming::Frame(Frame { seq, payload })).is_err() {
                // Session dropped its receiver half; nothing left to do.
                return;
            }
        }
    }
}
