//! Configuration types for connections and persistence components.
//!
//! All settings structs are immutable once handed to a component: to change
//! them, build a new value and reconfigure. Every field has a default, so a
//! partial settings map deserialized with serde merges over the defaults.
//!
//! The serialized layout matches the recognized configuration keys:
//!
//! ```json
//! {
//!     "collection": "dummies",
//!     "dependencies": { "connection": "connection" },
//!     "connection": { "host": "localhost", "port": 27017, "database": "test" },
//!     "options": { "max_pool_size": 2, "connect_timeout": 5000 }
//! }
//! ```

use serde::{Deserialize, Serialize};

/// Where to connect: an explicit URI, or host/port/database parts.
///
/// An explicit `uri` always wins over the composed parts. The port default
/// (27017) is applied at resolution time, not here, so an unset port stays
/// observable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionTarget {
    /// Full connection URI. Takes precedence over host/port/database.
    pub uri: Option<String>,
    /// Host name of the database server.
    pub host: Option<String>,
    /// Port of the database server.
    pub port: Option<u16>,
    /// Logical database name.
    pub database: Option<String>,
}

/// Driver and layer options with production-safe defaults.
///
/// Timeouts and intervals are millisecond values. Options the backend driver
/// does not expose (socket timeout, TCP keep-alive, reconnect pacing,
/// per-operation debug logging) are still retained here so they stay
/// visible in diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionOptions {
    /// Maximum number of pooled connections.
    pub max_pool_size: u32,
    /// Whether TCP keep-alive is requested.
    pub keep_alive: bool,
    /// Connect timeout in milliseconds.
    pub connect_timeout: u64,
    /// Socket timeout in milliseconds.
    pub socket_timeout: u64,
    /// Whether the driver should reconnect dropped sessions.
    pub auto_reconnect: bool,
    /// Reconnect pacing in milliseconds.
    pub reconnect_interval: u64,
    /// Upper bound for page sizes served by persistence components.
    pub max_page_size: u32,
    /// Replica set name.
    pub replica_set: Option<String>,
    /// Whether to connect over TLS.
    pub ssl: Option<bool>,
    /// Database to authenticate against.
    pub auth_source: Option<String>,
    /// Whether the driver should log individual operations, where it
    /// supports that.
    pub debug: bool,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self {
            max_pool_size: 2,
            keep_alive: true,
            connect_timeout: 5_000,
            socket_timeout: 360_000,
            auto_reconnect: true,
            reconnect_interval: 1_000,
            max_page_size: 100,
            replica_set: None,
            ssl: None,
            auth_source: None,
            debug: true,
        }
    }
}

/// Complete settings for a connection manager.
///
/// # Example
///
/// ```ignore
/// use docbase::config::ConnectionSettings;
///
/// let settings = ConnectionSettings::default()
///     .host("localhost")
///     .port(27017)
///     .database("test");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionSettings {
    /// Connection target (section `connection`).
    pub connection: ConnectionTarget,
    /// Driver and layer options (section `options`).
    pub options: ConnectionOptions,
}

impl ConnectionSettings {
    /// Sets the full connection URI.
    pub fn uri(mut self, uri: impl Into<String>) -> Self {
        self.connection.uri = Some(uri.into());
        self
    }

    /// Sets the host name.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.connection.host = Some(host.into());
        self
    }

    /// Sets the port.
    pub fn port(mut self, port: u16) -> Self {
        self.connection.port = Some(port);
        self
    }

    /// Sets the logical database name.
    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.connection.database = Some(database.into());
        self
    }
}

/// Reference tags a persistence component resolves its collaborators by.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Dependencies {
    /// Tag of the shared connection manager in the reference registry.
    pub connection: String,
}

impl Default for Dependencies {
    fn default() -> Self {
        Self {
            connection: "connection".to_string(),
        }
    }
}

/// Complete configuration for a persistence component.
///
/// The connection settings are carried whole: when the component ends up
/// owning a private connection manager, they are handed through to it
/// unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistenceConfig {
    /// Name of the bound collection.
    pub collection: Option<String>,
    /// Reference tags (section `dependencies`).
    pub dependencies: Dependencies,
    /// Connection settings (sections `connection` and `options`).
    #[serde(flatten)]
    pub settings: ConnectionSettings,
}

impl PersistenceConfig {
    /// Sets the bound collection name.
    pub fn collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = Some(collection.into());
        self
    }

    /// Replaces the connection settings.
    pub fn settings(mut self, settings: ConnectionSettings) -> Self {
        self.settings = settings;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn options_default_to_production_values() {
        let options = ConnectionOptions::default();
        assert_eq!(options.max_pool_size, 2);
        assert!(options.keep_alive);
        assert_eq!(options.connect_timeout, 5_000);
        assert_eq!(options.socket_timeout, 360_000);
        assert!(options.auto_reconnect);
        assert_eq!(options.reconnect_interval, 1_000);
        assert_eq!(options.max_page_size, 100);
        assert_eq!(options.replica_set, None);
        assert_eq!(options.ssl, None);
        assert_eq!(options.auth_source, None);
        assert!(options.debug);
    }

    #[test]
    fn partial_map_merges_over_defaults() {
        let config: PersistenceConfig = serde_json::from_value(json!({
            "collection": "dummies",
            "connection": { "host": "localhost", "database": "test" },
            "options": { "max_pool_size": 5, "max_page_size": 4 }
        }))
        .unwrap();

        assert_eq!(config.collection.as_deref(), Some("dummies"));
        assert_eq!(config.dependencies.connection, "connection");
        assert_eq!(config.settings.connection.host.as_deref(), Some("localhost"));
        assert_eq!(config.settings.connection.port, None);
        assert_eq!(config.settings.options.max_pool_size, 5);
        assert_eq!(config.settings.options.max_page_size, 4);
        // untouched options keep their defaults
        assert_eq!(config.settings.options.connect_timeout, 5_000);
    }

    #[test]
    fn empty_map_is_all_defaults() {
        let config: PersistenceConfig = serde_json::from_value(json!({})).unwrap();
        assert_eq!(config, PersistenceConfig::default());
    }

    #[test]
    fn dependency_tag_is_overridable() {
        let config: PersistenceConfig = serde_json::from_value(json!({
            "dependencies": { "connection": "primary-connection" }
        }))
        .unwrap();
        assert_eq!(config.dependencies.connection, "primary-connection");
    }

    #[test]
    fn chained_setters_fill_the_target() {
        let settings = ConnectionSettings::default()
            .host("db.internal")
            .port(27018)
            .database("orders");
        assert_eq!(settings.connection.host.as_deref(), Some("db.internal"));
        assert_eq!(settings.connection.port, Some(27018));
        assert_eq!(settings.connection.database.as_deref(), Some("orders"));
        assert_eq!(settings.connection.uri, None);
    }
}
