use std::env;
use std::time::Duration;

use mason_core::connection::ConnectOptions;

use crate::connection::Connection;
use crate::error::Error;

const DEFAULT_MYSQL_PORT: u16 = 3306;

/// Configuration for a single MySQL connection.
///
/// Wraps `mason-core::connection::ConnectOptions` — the teacher's
/// Postgres-flavored builder, which defaults to port 5432 — constructing it
/// directly rather than through its `Default` impl so this crate's default
/// is MySQL's 3306 instead, and adds the one field §6 Configuration names
/// that the shared builder doesn't carry: `encoding`.
///
/// Unlike the pooled, URI-parsing `MySqlConnectOptions` of the modern
/// `sqlx-mysql` driver, this type only carries the handful of fields §6
/// names — connection pooling and URI parsing are out of scope (§1).
#[derive(Debug, Clone)]
pub struct MySqlConnectOptions<'a> {
    pub(crate) inner: ConnectOptions<'a>,
    pub(crate) encoding: Option<&'a str>,
    pub(crate) timeout: Option<Duration>,
}

impl<'a> Default for MySqlConnectOptions<'a> {
    fn default() -> Self {
        Self {
            inner: ConnectOptions {
                host: "localhost",
                port: DEFAULT_MYSQL_PORT,
                user: Some("root"),
                database: None,
                password: None,
            },
            encoding: None,
            timeout: None,
        }
    }
}

impl<'a> MySqlConnectOptions<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn host(mut self, host: &'a str) -> Self {
        self.inner.host = host;
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.inner.port = port;
        self
    }

    pub fn user(mut self, user: &'a str) -> Self {
        self.inner = self.inner.user(user);
        self
    }

    pub fn password(mut self, password: &'a str) -> Self {
        self.inner = self.inner.password(password);
        self
    }

    pub fn database(mut self, database: &'a str) -> Self {
        self.inner = self.inner.database(database);
        self
    }

    /// If set, the client issues `SET NAMES '<encoding>'` once connected.
    pub fn encoding(mut self, encoding: &'a str) -> Self {
        self.encoding = Some(encoding);
        self
    }

    /// Bounds how long any single request will wait for a server response
    /// before surfacing `Error::Timeout`. The socket itself is left open on
    /// elapse — see `Session::recv_frame` — but a caller that times out and
    /// then issues another request should treat the connection as
    /// best-effort until a fresh response lines back up with the sequence
    /// counter; a server error or reconnect is the robust recovery.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub(crate) fn host_str(&self) -> &'a str {
        self.inner.host
    }

    pub(crate) fn port_num(&self) -> u16 {
        self.inner.port
    }

    pub(crate) fn user_str(&self) -> &'a str {
        self.inner.user.unwrap_or("root")
    }

    pub(crate) fn password_str(&self) -> &'a str {
        self.inner.password.unwrap_or("")
    }

    pub(crate) fn database_str(&self) -> Option<&'a str> {
        self.inner.database
    }

    /// Reads `MYSQL_HOST`, `MYSQL_PORT`, `MYSQL_USER`, `MYSQL_PASSWORD`,
    /// `MYSQL_DATABASE` from the environment (optionally loaded from a
    /// `.env` file via `dotenvy`). Intended for integration tests, not as a
    /// general configuration-file loader.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();

        let mut options = Self::default();

        if let Ok(host) = env::var("MYSQL_HOST") {
            options.inner.host = Box::leak(host.into_boxed_str());
        }
        if let Ok(port) = env::var("MYSQL_PORT") {
            if let Ok(port) = port.parse() {
                options.inner.port = port;
            }
        }
        if let Ok(user) = env::var("MYSQL_USER") {
            options.inner.user = Some(Box::leak(user.into_boxed_str()));
        }
        if let Ok(password) = env::var("MYSQL_PASSWORD") {
            options.inner.password = Some(Box::leak(password.into_boxed_str()));
        }
        if let Ok(database) = env::var("MYSQL_DATABASE") {
            options.inner.database = Some(Box::leak(database.into_boxed_str()));
        }

        options
    }

    /// Runs §4.6.6's connection initialization sequence: TCP connect,
    /// greeting, handshake, `USE <database>`, `SET NAMES`.
    pub async fn connect(&self) -> Result<Connection, Error> {
        Connection::establish(self).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_defaults_to_mysql_port() {
        let options = MySqlConnectOptions::new();
        assert_eq!(options.port_num(), DEFAULT_MYSQL_PORT);
        assert_eq!(options.user_str(), "root");
        assert!(options.database_str().is_none());
    }

    #[test]
    fn it_chains_builder_setters() {
        let options = MySqlConnectOptions::new()
            .host("db.internal")
            .port(3307)
            .user("app")
            .password("secret")
            .database("app_prod")
            .encoding("utf8mb4")
            .timeout(Duration::from_secs(5));

        assert_eq!(options.host_str(), "db.internal");
        assert_eq!(options.port_num(), 3307);
        assert_eq!(options.user_str(), "app");
        assert_eq!(options.password_str(), "secret");
        assert_eq!(options.timeout, Some(Duration::from_secs(5)));
        assert_eq!(options.database_str(), Some("app_prod"));
        assert_eq!(options.encoding, Some("utf8mb4"));
    }
}
