use std::path::PathBuf;

use anyhow::{anyhow, Context};
use serde::Deserialize;

const DEFAULT_ENV: &str = "local";
const ENV_VAR_NAME: &str = "SHELF_ENV";
const CONFIG_DIR_ENV: &str = "SHELF_CONFIG_DIR";
const ENV_PREFIX: &str = "SHELF";

/// Connection string for the shared record store. Read verbatim, without the
/// `SHELF_` prefix, so existing container wiring keeps working.
pub const DATABASE_URI_ENV: &str = "DATABASE_URI";

/// Keys whose environment values are comma separated lists.
const LIST_KEYS: &[&str] = &[
    "gateway.pools.full",
    "gateway.pools.get",
    "gateway.pools.post",
    "gateway.pools.put",
    "gateway.pools.delete",
];

/// Deployment environment the application is running in.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Local,
    Staging,
    Production,
}

/// Top-level configuration structure loaded from layered sources.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: Environment,
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub database: DatabaseSettings,
    #[serde(default)]
    pub telemetry: TelemetrySettings,
    #[serde(default)]
    pub pages: PagesSettings,
    #[serde(default)]
    pub gateway: GatewaySettings,
}

impl Settings {
    /// Load configuration by layering `.env`, base file, environment overlay,
    /// `SHELF_*` variables and finally `DATABASE_URI`.
    pub fn load() -> anyhow::Result<Self> {
        // Allow missing `.env` files without failing.
        let _ = dotenvy::dotenv();

        let environment = std::env::var(ENV_VAR_NAME).unwrap_or_else(|_| DEFAULT_ENV.to_string());
        let config_dir = match std::env::var(CONFIG_DIR_ENV) {
            Ok(dir) => PathBuf::from(dir),
            // Default to repo root `config` directory.
            Err(_) => std::env::current_dir()
                .context("unable to resolve current directory")?
                .join("config"),
        };

        let base_path = config_dir.join("base.toml");
        let environment_filename = format!("{}.toml", environment);
        let environment_path = config_dir.join(environment_filename);

        let env_source = LIST_KEYS.iter().fold(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .list_separator(","),
            |source, key| source.with_list_parse_key(key),
        );

        let builder = config::Config::builder()
            .add_source(config::File::from(base_path).required(false))
            .add_source(config::File::from(environment_path).required(false))
            .add_source(env_source)
            .set_override_option("database.uri", std::env::var(DATABASE_URI_ENV).ok())
            .with_context(|| format!("failed to apply {DATABASE_URI_ENV}"))?;

        let cfg = builder
            .build()
            .with_context(|| "failed to build configuration")?;

        let mut settings: Settings = cfg
            .try_deserialize()
            .with_context(|| "failed to deserialize configuration")?;

        // Override environment field with parsed enum variant.
        settings.environment = match environment.as_str() {
            "local" => Environment::Local,
            "staging" => Environment::Staging,
            "production" => Environment::Production,
            other => {
                return Err(anyhow!(
                    "unsupported environment '{}'; expected local/staging/production",
                    other
                ));
            }
        };

        Ok(settings)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "ServerSettings::default_host")]
    pub host: String,
    #[serde(default = "ServerSettings::default_port")]
    pub port: u16,
    /// Unset means handlers run until the store answers.
    #[serde(default)]
    pub request_timeout_ms: Option<u64>,
}

impl ServerSettings {
    fn default_host() -> String {
        "0.0.0.0".to_string()
    }

    fn default_port() -> u16 {
        3030
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            port: Self::default_port(),
            request_timeout_ms: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    /// `mongodb://...` for the shared store, `memory://` for a process-local one.
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default = "DatabaseSettings::default_database")]
    pub database: String,
    #[serde(default = "DatabaseSettings::default_collection")]
    pub collection: String,
    #[serde(default = "DatabaseSettings::default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    #[serde(default = "DatabaseSettings::default_seed")]
    pub seed: bool,
}

impl DatabaseSettings {
    fn default_database() -> String {
        "exercise-1".to_string()
    }

    fn default_collection() -> String {
        "information".to_string()
    }

    fn default_connect_timeout_ms() -> u64 {
        10_000
    }

    fn default_seed() -> bool {
        true
    }

    /// The configured connection string. A replica must not start without one.
    pub fn uri(&self) -> anyhow::Result<&str> {
        match self.uri.as_deref() {
            Some(uri) if !uri.trim().is_empty() => Ok(uri),
            _ => Err(anyhow!(
                "{DATABASE_URI_ENV} is not set; the catalog cannot start without a record store"
            )),
        }
    }
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            uri: None,
            database: Self::default_database(),
            collection: Self::default_collection(),
            connect_timeout_ms: Self::default_connect_timeout_ms(),
            seed: Self::default_seed(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelemetrySettings {
    #[serde(default)]
    pub log_format: LogFormat,
    /// Used when `RUST_LOG` is not set.
    #[serde(default = "TelemetrySettings::default_filter")]
    pub filter: String,
}

impl TelemetrySettings {
    fn default_filter() -> String {
        "info,tower_http=info".to_string()
    }
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Pretty,
            filter: Self::default_filter(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PagesSettings {
    #[serde(default = "PagesSettings::default_static_dir")]
    pub static_dir: PathBuf,
}

impl PagesSettings {
    fn default_static_dir() -> PathBuf {
        PathBuf::from("css")
    }
}

impl Default for PagesSettings {
    fn default() -> Self {
        Self {
            static_dir: Self::default_static_dir(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GatewaySettings {
    #[serde(default = "GatewaySettings::default_host")]
    pub host: String,
    #[serde(default = "GatewaySettings::default_port")]
    pub port: u16,
    #[serde(default)]
    pub pools: PoolSettings,
}

impl GatewaySettings {
    fn default_host() -> String {
        "0.0.0.0".to_string()
    }

    fn default_port() -> u16 {
        8000
    }
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            port: Self::default_port(),
            pools: PoolSettings::default(),
        }
    }
}

/// Upstream base URLs per pool. Every pool needs at least one entry.
#[derive(Debug, Clone, Deserialize)]
pub struct PoolSettings {
    #[serde(default = "PoolSettings::local_replica")]
    pub full: Vec<String>,
    #[serde(default = "PoolSettings::local_replica")]
    pub get: Vec<String>,
    #[serde(default = "PoolSettings::local_replica")]
    pub post: Vec<String>,
    #[serde(default = "PoolSettings::local_replica")]
    pub put: Vec<String>,
    #[serde(default = "PoolSettings::local_replica")]
    pub delete: Vec<String>,
}

impl PoolSettings {
    fn local_replica() -> Vec<String> {
        vec!["http://127.0.0.1:3030".to_string()]
    }
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            full: Self::local_replica(),
            get: Self::local_replica(),
            post: Self::local_replica(),
            put: Self::local_replica(),
            delete: Self::local_replica(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_environment_is_local() {
        let settings = Settings::default();
        assert_eq!(settings.environment, Environment::Local);
    }

    #[test]
    fn default_store_layout_matches_existing_deployments() {
        let settings = Settings::default();
        assert_eq!(settings.database.database, "exercise-1");
        assert_eq!(settings.database.collection, "information");
        assert_eq!(settings.database.connect_timeout_ms, 10_000);
        assert_eq!(settings.server.port, 3030);
    }

    #[test]
    fn missing_database_uri_is_an_error() {
        let settings = DatabaseSettings::default();
        let err = settings.uri().unwrap_err();
        assert!(err.to_string().contains(DATABASE_URI_ENV));

        let blank = DatabaseSettings {
            uri: Some("   ".to_string()),
            ..DatabaseSettings::default()
        };
        assert!(blank.uri().is_err());
    }

    #[test]
    fn configured_database_uri_is_returned() {
        let settings = DatabaseSettings {
            uri: Some("mongodb://db:27017".to_string()),
            ..DatabaseSettings::default()
        };
        assert_eq!(settings.uri().unwrap(), "mongodb://db:27017");
    }

    #[test]
    fn every_pool_defaults_to_a_local_replica() {
        let pools = PoolSettings::default();
        for pool in [&pools.full, &pools.get, &pools.post, &pools.put, &pools.delete] {
            assert_eq!(pool, &vec!["http://127.0.0.1:3030".to_string()]);
        }
    }

    #[test]
    fn settings_deserialize_from_toml() {
        let cfg = config::Config::builder()
            .add_source(config::File::from_str(
                r#"
                [database]
                uri = "memory://"
                seed = false

                [gateway.pools]
                get = ["http://catalog-get-1:3030", "http://catalog-get-2:3030"]
                "#,
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap();
        let settings: Settings = cfg.try_deserialize().unwrap();

        assert_eq!(settings.database.uri.as_deref(), Some("memory://"));
        assert!(!settings.database.seed);
        assert_eq!(settings.gateway.pools.get.len(), 2);
        assert_eq!(settings.gateway.pools.post, PoolSettings::local_replica());
        assert_eq!(settings.telemetry.log_format, LogFormat::Pretty);
    }
}
