use tokio::io::split;
use tokio::net::TcpStream;
use tokio::sync::mpsc;

use crate::auth::{self, AuthPlugin};
use crate::capabilities::Capabilities;
use crate::error::{protocol_err, Error};
use crate::options::MySqlConnectOptions;
use crate::protocol::auth_switch::AuthSwitchRequest;
use crate::protocol::handshake::InitialHandshakePacket;
use crate::protocol::handshake_response::HandshakeResponsePacket;
use crate::protocol::Dialect;
use crate::receiver;
use crate::session::{MySqlResult, Session};
use crate::transaction::{self, Outcome};
use crate::value::Value;

/// A single MySQL connection: the public façade over the Session state
/// machine, the Receiver task, and the Authenticator handshake. Connection
/// pooling, multi-host configuration, and prepared-statement registries
/// live outside this crate's scope (§1) and consume these operations.
pub struct Connection {
    session: Session,
}

impl Connection {
    /// Runs §4.6.6's connection initialization sequence: TCP connect,
    /// receive greeting, handshake/authenticate, `USE <database>`,
    /// `SET NAMES '<encoding>'`.
    pub(crate) async fn establish(options: &MySqlConnectOptions<'_>) -> Result<Self, Error> {
        let stream = TcpStream::connect((options.host_str(), options.port_num()))
            .await
            .map_err(|source| Error::ConnectFailed {
                host: options.host_str().to_owned(),
                port: options.port_num(),
                source,
            })?;

        let (read_half, write_half) = split(stream);
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(receiver::run(read_half, tx));

        let mut session =
            Session::new(write_half, rx, Dialect::V40, Capabilities::empty(), options.timeout);

        let greeting_frame = session.recv_raw(0).await?;
        let greeting = InitialHandshakePacket::decode(&greeting_frame.payload)?;

        session.dialect = greeting.dialect();
        session.capabilities = Capabilities::default() & greeting.capabilities;

        tracing::info!(
            version = %greeting.server_version,
            dialect = ?session.dialect,
            "received server greeting"
        );

        authenticate(&mut session, &greeting, options)
            .await
            .map_err(|e| Error::LoginFailed(e.to_string()))?;

        let mut conn = Self { session };

        if let Some(database) = options.database_str() {
            conn.session
                .init_db(database)
                .await
                .map_err(|source| Error::FailedChangingDatabase {
                    database: database.to_owned(),
                    source: Box::new(source),
                })?;
        }

        if let Some(encoding) = options.encoding {
            conn.session.fetch(&format!("SET NAMES '{}'", encoding)).await?;
        }

        Ok(conn)
    }

    /// Issues a single text query and decodes whatever comes back.
    pub async fn fetch(&mut self, query: &str) -> Result<MySqlResult, Error> {
        self.session.fetch(query).await
    }

    /// Issues `queries` sequentially, stopping (and returning) at the first
    /// server error; otherwise returns the final query's result.
    pub async fn fetch_all<'a>(&mut self, queries: impl IntoIterator<Item = &'a str>) -> Result<MySqlResult, Error> {
        self.session.fetch_all(queries).await
    }

    /// `PREPARE`/`SET`/`EXECUTE` a named statement with positional parameters.
    pub async fn execute(&mut self, name: &str, statement: &str, params: &[Value]) -> Result<MySqlResult, Error> {
        self.session.execute(name, statement, params).await
    }

    pub async fn begin(&mut self) -> Result<MySqlResult, Error> {
        self.session.begin().await
    }

    pub async fn commit(&mut self) -> Result<MySqlResult, Error> {
        self.session.commit().await
    }

    pub async fn rollback(&mut self) -> Result<MySqlResult, Error> {
        self.session.rollback().await
    }

    pub fn transaction_depth(&self) -> u8 {
        self.session.transaction_depth()
    }

    /// Round-trips `COM_PING` to check the connection is still alive.
    pub async fn ping(&mut self) -> Result<MySqlResult, Error> {
        self.session.ping().await
    }

    /// Sends `COM_QUIT` and consumes the connection; the server closes the
    /// socket in response rather than sending a reply packet.
    pub async fn close(mut self) -> Result<(), Error> {
        self.session.quit().await
    }

    /// Runs `action` inside `BEGIN` / `COMMIT` / `ROLLBACK`, per §4.6.4.
    pub async fn transaction<V, F>(&mut self, action: F) -> Outcome<V>
    where
        F: for<'c> FnOnce(&'c mut Session) -> futures_core::future::BoxFuture<'c, Result<V, Error>>,
    {
        transaction::transaction(&mut self.session, action).await
    }
}

/// Runs the handshake/challenge-response exchange, including any
/// `AuthSwitchRequest` rounds, against the already-connected `session`.
async fn authenticate(
    session: &mut Session,
    greeting: &InitialHandshakePacket,
    options: &MySqlConnectOptions<'_>,
) -> Result<(), Error> {
    let password = options.password_str();

    let mut plugin = match &greeting.auth_plugin_name {
        Some(name) if session.capabilities.contains(Capabilities::PLUGIN_AUTH) => {
            Some(AuthPlugin::from_name(name)?)
        }
        _ => None,
    };

    let secure = auth::secure_connection(session.capabilities);

    let mut scramble = if let Some(p) = plugin {
        p.scramble(password, &greeting.auth_plugin_data)
    } else if secure {
        AuthPlugin::MySqlNativePassword.scramble(password, &greeting.auth_plugin_data)
    } else {
        auth::scramble_323(password, &greeting.auth_plugin_data[..8.min(greeting.auth_plugin_data.len())])
    };

    let response = HandshakeResponsePacket {
        capabilities: session.capabilities,
        username: options.user_str(),
        auth_response: &scramble,
        database: None,
        auth_plugin_name: plugin.map(AuthPlugin::name),
    };

    let mut payload = Vec::new();
    response.encode(&mut payload);
    session.send_raw(&payload, 1).await?;

    let mut seq = 2u8;
    loop {
        let frame = session.recv_raw(seq).await?;
        match frame.payload.first().copied() {
            Some(0x00) => return Ok(()),

            Some(0xFF) => {
                let err = crate::protocol::err::ErrPacket::decode(&frame.payload, session.dialect)?;
                return Err(Error::ServerError {
                    code: err.code,
                    sql_state: err.sql_state,
                    message: err.message,
                });
            }

            Some(0xFE) => {
                let switch = AuthSwitchRequest::decode(&frame.payload)?;
                let new_plugin = AuthPlugin::from_name(&switch.plugin_name)?;
                scramble = new_plugin.scramble(password, &switch.plugin_data);
                plugin = Some(new_plugin);

                seq = seq.wrapping_add(1);
                session.send_raw(&scramble, seq).await?;
                seq = seq.wrapping_add(1);
            }

            _ => {
                let prefix = &frame.payload[..frame.payload.len().min(8)];
                return Err(protocol_err!(
                    "unrecognized packet during authentication, starts with {}",
                    hex::encode(prefix)
                ));
            }
        }
    }
}
