use std::path::Path;

use exitpass_db::DbConfig;
use exitpass_workflow::WorkflowConfig;
use serde::Deserialize;

use crate::error::ServerError;

const ENV_PREFIX: &str = "EXITPASS";

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub server: Server,
    pub database: Database,
    pub workflow: WorkflowConfig,
    pub logging: Logging,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Server {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Database {
    /// SurrealDB WebSocket address, e.g. `127.0.0.1:8000`
    pub url: String,
    pub namespace: String,
    pub database: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Logging {
    /// `EnvFilter` directives used when `RUST_LOG` is unset.
    pub filter: String,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for Server {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for Database {
    fn default() -> Self {
        let db = DbConfig::default();
        Self {
            url: db.url,
            namespace: db.namespace,
            database: db.database,
            username: db.username,
            password: db.password,
        }
    }
}

impl Default for Logging {
    fn default() -> Self {
        Self {
            filter: "exitpass=info".to_string(),
            json: false,
        }
    }
}

impl From<&Database> for DbConfig {
    fn from(db: &Database) -> Self {
        Self {
            url: db.url.clone(),
            namespace: db.namespace.clone(),
            database: db.database.clone(),
            username: db.username.clone(),
            password: db.password.clone(),
        }
    }
}

impl Settings {
    /// Defaults, then the optional TOML file at `path`, then
    /// `EXITPASS__SECTION__KEY` environment overrides.
    pub fn load(path: &str) -> Result<Self, ServerError> {
        Self::load_with_prefix(path, ENV_PREFIX)
    }

    fn load_with_prefix(path: &str, prefix: &str) -> Result<Self, ServerError> {
        let mut builder = config::Config::builder();

        // Optional file
        if Path::new(path).exists() {
            builder = builder.add_source(config::File::with_name(path));
        }

        // Environment overrides: EXITPASS__SERVER__PORT=9090, etc.
        builder = builder.add_source(config::Environment::with_prefix(prefix).separator("__"));

        let cfg = builder.build()?;
        Ok(cfg.try_deserialize()?)
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
