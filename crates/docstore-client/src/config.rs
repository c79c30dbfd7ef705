//! Connection configuration.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use docstore_common::constants::{
    DEFAULT_APPLICATION_NAME, DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_HOST, DEFAULT_PORT,
    SQLITE_MEMORY_PATH,
};
use docstore_engine::PgConnectOptions;

use crate::error::{ClientError, ClientResult};

/// Which engine backs a connection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Backend {
    /// A PostgreSQL server reached over TCP.
    #[default]
    Postgres,
    /// An embedded SQLite database file, or `:memory:`.
    Sqlite {
        /// Database file path.
        path: PathBuf,
    },
}

/// Connection configuration.
#[derive(Clone)]
pub struct ConnectionConfig {
    /// Server host.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Database name.
    pub database: Option<String>,
    /// Username for authentication.
    pub username: Option<String>,
    /// Password for authentication.
    pub password: Option<String>,
    /// Application name for identification.
    pub application_name: Option<String>,
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// Engine backend.
    pub backend: Backend,
    /// Whether column maps are cached between operations.
    pub cache_columns: bool,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            database: None,
            username: None,
            password: None,
            application_name: Some(DEFAULT_APPLICATION_NAME.to_string()),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            backend: Backend::Postgres,
            cache_columns: true,
        }
    }
}

impl ConnectionConfig {
    /// Creates a new PostgreSQL configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a configuration for an SQLite database file.
    pub fn sqlite(path: impl Into<PathBuf>) -> Self {
        Self::default().backend(Backend::Sqlite { path: path.into() })
    }

    /// Creates a configuration for a private in-memory SQLite database.
    pub fn sqlite_memory() -> Self {
        Self::sqlite(SQLITE_MEMORY_PATH)
    }

    /// Sets the host.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Sets the port.
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the database name.
    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    /// Sets the username.
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Sets the password.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Sets the application name.
    pub fn application_name(mut self, name: impl Into<String>) -> Self {
        self.application_name = Some(name.into());
        self
    }

    /// Sets the connection timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the backend.
    pub fn backend(mut self, backend: Backend) -> Self {
        self.backend = backend;
        self
    }

    /// Enables or disables the column cache.
    pub fn cache_columns(mut self, enabled: bool) -> Self {
        self.cache_columns = enabled;
        self
    }

    /// Returns a printable location that never includes the password.
    pub fn location(&self) -> String {
        match &self.backend {
            Backend::Postgres => {
                let user = self.username.as_deref().map(|u| format!("{u}@")).unwrap_or_default();
                let database = self.database.as_deref().unwrap_or("");
                format!("postgres://{user}{}:{}/{database}", self.host, self.port)
            }
            Backend::Sqlite { path } => format!("sqlite://{}", path.display()),
        }
    }

    /// Checks the configuration for values no engine would accept.
    pub fn validate(&self) -> ClientResult<()> {
        match &self.backend {
            Backend::Postgres => {
                if self.host.trim().is_empty() {
                    return Err(ClientError::InvalidConfig("host must not be empty".into()));
                }
                if self.port == 0 {
                    return Err(ClientError::InvalidConfig("port must not be zero".into()));
                }
                if self.connect_timeout.is_zero() {
                    return Err(ClientError::InvalidConfig(
                        "connect timeout must be positive".into(),
                    ));
                }
            }
            Backend::Sqlite { path } => {
                if path.as_os_str().is_empty() {
                    return Err(ClientError::InvalidConfig(
                        "sqlite path must not be empty".into(),
                    ));
                }
            }
        }
        Ok(())
    }

    pub(crate) fn pg_options(&self) -> PgConnectOptions {
        PgConnectOptions {
            host: self.host.clone(),
            port: self.port,
            user: self.username.clone(),
            password: self.password.clone(),
            dbname: self.database.clone(),
            application_name: self.application_name.clone(),
            connect_timeout: Some(self.connect_timeout),
        }
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("application_name", &self.application_name)
            .field("connect_timeout", &self.connect_timeout)
            .field("backend", &self.backend)
            .field("cache_columns", &self.cache_columns)
            .finish()
    }
}

/// The four credentials accepted by [`crate::open`].
#[derive(Clone, Default)]
pub struct Credentials {
    /// Username.
    pub user: String,
    /// Password.
    pub password: String,
    /// Database name.
    pub database: String,
    /// Server host.
    pub host: String,
}

impl Credentials {
    /// Creates a credential set.
    pub fn new(
        user: impl Into<String>,
        password: impl Into<String>,
        database: impl Into<String>,
        host: impl Into<String>,
    ) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
            database: database.into(),
            host: host.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"***")
            .field("database", &self.database)
            .field("host", &self.host)
            .finish()
    }
}

impl From<Credentials> for ConnectionConfig {
    fn from(credentials: Credentials) -> Self {
        ConnectionConfig::new()
            .host(credentials.host)
            .database(credentials.database)
            .username(credentials.user)
            .password(credentials.password)
    }
}
