//! Connection configuration for the shelter collection.
//!
//! [`ConnectionConfig`] identifies the collection to open (host, port, database, collection)
//! and carries the few client settings the repository controls. Credentials are optional;
//! the default is the unauthenticated variant, and the connection string never embeds them.
//!
//! Configuration can come from [`Default`], the `with_*` setters, JSON via
//! [`ConnectionConfig::from_json`], or the process environment via [`ConnectionConfig::from_env`].

use std::{env, time::Duration};

use serde::{Deserialize, Serialize};

use crate::error::{ShelterError, ShelterResult};

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 27017;
pub const DEFAULT_DATABASE: &str = "aac";
pub const DEFAULT_COLLECTION: &str = "animals";
pub const DEFAULT_SERVER_SELECTION_TIMEOUT: Duration = Duration::from_secs(5);

/// Username/password pair handed to the driver when the server enforces access control.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    /// Database the user is defined in. The driver default (`admin`) is used when absent.
    #[serde(default)]
    pub source: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("source", &self.source)
            .finish()
    }
}

/// Identifies one collection on one server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Server host name (default: `localhost`)
    pub host: String,
    /// Server port (default: 27017)
    pub port: u16,
    /// Database name (default: `aac`)
    pub database: String,
    /// Collection name (default: `animals`)
    pub collection: String,
    /// Optional credentials; `None` connects without authentication
    pub credentials: Option<Credentials>,
    /// How long the driver waits to find a usable server (default: 5s)
    #[serde(with = "duration_millis")]
    pub server_selection_timeout: Duration,
    /// Application name reported in server logs
    pub app_name: Option<String>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            database: DEFAULT_DATABASE.to_string(),
            collection: DEFAULT_COLLECTION.to_string(),
            credentials: None,
            server_selection_timeout: DEFAULT_SERVER_SELECTION_TIMEOUT,
            app_name: Some("aac-crud".to_string()),
        }
    }
}

impl ConnectionConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Self::default()
        }
    }

    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.credentials = Some(Credentials {
            username: username.into(),
            password: password.into(),
            source: None,
        });
        self
    }

    pub fn with_server_selection_timeout(mut self, timeout: Duration) -> Self {
        self.server_selection_timeout = timeout;
        self
    }

    pub fn with_app_name(mut self, app_name: impl Into<String>) -> Self {
        self.app_name = Some(app_name.into());
        self
    }

    /// The connection string, `mongodb://<host>:<port>/`.
    ///
    /// Credentials are never embedded; they are applied to the client options separately.
    pub fn uri(&self) -> String {
        format!("mongodb://{}:{}/", self.host, self.port)
    }

    /// Checks that the names identifying the collection are usable.
    pub fn validate(&self) -> ShelterResult<()> {
        if self.host.trim().is_empty() {
            return Err(ShelterError::validation("Connection host cannot be empty."));
        }
        if self.database.is_empty() || self.database.contains(['/', '\\', '.', ' ', '"', '$', '\0']) {
            return Err(ShelterError::validation(format!(
                "Invalid database name: '{}'",
                self.database
            )));
        }
        if self.collection.is_empty()
            || self.collection.contains(['$', '\0'])
            || self.collection.starts_with("system.")
        {
            return Err(ShelterError::validation(format!(
                "Invalid collection name: '{}'",
                self.collection
            )));
        }
        Ok(())
    }

    /// Parses a configuration from JSON. Missing fields take their defaults.
    ///
    /// `server_selection_timeout` is given in milliseconds.
    pub fn from_json(json: &str) -> ShelterResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Builds a configuration from `AAC_MONGO_*` environment variables, falling back to defaults.
    ///
    /// Recognised variables: `AAC_MONGO_HOST`, `AAC_MONGO_PORT`, `AAC_MONGO_DATABASE`,
    /// `AAC_MONGO_COLLECTION`, `AAC_MONGO_USERNAME` and `AAC_MONGO_PASSWORD`.
    pub fn from_env() -> ShelterResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ShelterResult<Self> {
        let mut config = Self::default();

        if let Some(host) = lookup("AAC_MONGO_HOST") {
            config.host = host;
        }
        if let Some(port) = lookup("AAC_MONGO_PORT") {
            config.port = port
                .parse()
                .map_err(|_| ShelterError::validation(format!("AAC_MONGO_PORT must be a port number, got '{port}'")))?;
        }
        if let Some(database) = lookup("AAC_MONGO_DATABASE") {
            config.database = database;
        }
        if let Some(collection) = lookup("AAC_MONGO_COLLECTION") {
            config.collection = collection;
        }
        match (lookup("AAC_MONGO_USERNAME"), lookup("AAC_MONGO_PASSWORD")) {
            (Some(username), Some(password)) => {
                config = config.with_credentials(username, password);
            }
            (None, None) => {}
            _ => {
                return Err(ShelterError::validation(
                    "AAC_MONGO_USERNAME and AAC_MONGO_PASSWORD must be set together",
                ));
            }
        }

        config.validate()?;
        Ok(config)
    }
}

mod duration_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}
