use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub events: EventsConfig,
    #[serde(default)]
    pub websocket: WebSocketConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

// Keys stay single words so the "_" environment separator can address
// them (STORE_POOL, WEBSOCKET_HEARTBEAT); a multi-word key would split
// into extra config levels and become unreachable.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Record store backend: "memory" or "postgres"
    #[serde(default = "default_store_backend")]
    pub backend: String,
    /// Connection string, used by the postgres backend
    #[serde(default = "default_store_url")]
    pub url: String,
    /// Connection pool size for the postgres backend
    #[serde(default = "default_pool")]
    pub pool: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventsConfig {
    /// Broadcast buffer capacity; lagging viewers drop the oldest events
    #[serde(default = "default_event_capacity")]
    pub capacity: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebSocketConfig {
    /// Heartbeat interval in seconds (server sends ping)
    #[serde(default = "default_heartbeat")]
    pub heartbeat: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_store_backend() -> String {
    "memory".to_string()
}

fn default_store_url() -> String {
    "postgres://localhost:5432/waitline".to_string()
}

fn default_pool() -> u32 {
    5
}

fn default_event_capacity() -> usize {
    256
}

fn default_heartbeat() -> u64 {
    30 // 30 seconds
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        // Load .env file if exists
        let _ = dotenvy::dotenv();

        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let builder = Config::builder()
            // Start with default values
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 5000)?
            .set_default("store.backend", "memory")?
            .set_default("store.url", "postgres://localhost:5432/waitline")?
            .set_default("store.pool", 5)?
            .set_default("events.capacity", 256)?
            .set_default("websocket.heartbeat", 30)?
            // Load config file if exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Load from environment variables
            // SERVER_HOST, SERVER_PORT, STORE_BACKEND, STORE_URL,
            // STORE_POOL, EVENTS_CAPACITY, WEBSOCKET_HEARTBEAT
            .add_source(
                Environment::default()
                    .separator("_")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_store_backend(),
            url: default_store_url(),
            pool: default_pool(),
        }
    }
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            capacity: default_event_capacity(),
        }
    }
}

impl Default for WebSocketConfig {
    fn default() -> Self {
        Self {
            heartbeat: default_heartbeat(),
        }
    }
}
