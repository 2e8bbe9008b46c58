use std::io;

/// Everything that can go wrong while driving a single MySQL connection.
///
/// Server errors (`ServerError`) are per-statement and do not poison the
/// connection; every other variant means the session is no longer usable.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to connect to {host}:{port}: {source}")]
    ConnectFailed {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },

    #[error("login failed: {0}")]
    LoginFailed(String),

    #[error("failed changing database to `{database}`: {source}")]
    FailedChangingDatabase { database: String, source: Box<Error> },

    #[error("server error {code}{}: {message}", sql_state.as_deref().map(|s| format!(" ({s})")).unwrap_or_default())]
    ServerError {
        code: u16,
        sql_state: Option<String>,
        message: String,
    },

    #[error("protocol error: {0}")]
    ProtocolError(String),

    #[error("connection closed by peer")]
    SocketClosed,

    #[error("value cannot be encoded as a SQL literal: {0}")]
    UnrecognizedValue(String),

    #[error("operation timed out")]
    Timeout,

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Error {
    pub(crate) fn protocol(message: impl Into<String>) -> Self {
        Error::ProtocolError(message.into())
    }
}

/// Builds a `ProtocolError` with a formatted message, mirroring the lazily
/// formatted `protocol_err!` helper this crate's error design is grounded on.
macro_rules! protocol_err {
    ($($arg:tt)*) => {
        $crate::error::Error::protocol(format!($($arg)*))
    };
}

pub(crate) use protocol_err;
