mod file_config;

pub use file_config::{AuthConfig, EngineConfig, FileConfig};

use crate::auth::DEFAULT_TOKEN_TTL_SEC;
use crate::pin::EngineSettings;
use crate::server::RequestsLoggingLevel;
use anyhow::{bail, Result};
use clap::ValueEnum;
use std::path::PathBuf;

/// CLI arguments that take part in config resolution.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub db_dir: Option<PathBuf>,
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub frontend_dir_path: Option<String>,
    pub jwt_secret: Option<String>,
    pub token_ttl_sec: u64,
    pub recompute_genre_on_all_mutations: bool,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            db_dir: None,
            port: 3001,
            metrics_port: 9091,
            logging_level: RequestsLoggingLevel::Path,
            frontend_dir_path: None,
            jwt_secret: None,
            token_ttl_sec: DEFAULT_TOKEN_TTL_SEC,
            recompute_genre_on_all_mutations: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_dir: PathBuf,
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub frontend_dir_path: Option<String>,
    pub jwt_secret: String,
    pub token_ttl_sec: u64,
    pub engine: EngineSettings,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let db_dir = file
            .db_dir
            .map(PathBuf::from)
            .or_else(|| cli.db_dir.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("db_dir must be specified via --db-dir or in config file")
            })?;
        if !db_dir.exists() {
            bail!("Database directory does not exist: {:?}", db_dir);
        }
        if !db_dir.is_dir() {
            bail!("db_dir is not a directory: {:?}", db_dir);
        }

        let port = file.port.unwrap_or(cli.port);
        let metrics_port = file.metrics_port.unwrap_or(cli.metrics_port);
        if port == metrics_port {
            bail!("port and metrics_port must differ (both are {})", port);
        }

        let logging_level = file
            .logging_level
            .and_then(|s| parse_logging_level(&s))
            .unwrap_or_else(|| cli.logging_level.clone());
        let frontend_dir_path = file
            .frontend_dir_path
            .or_else(|| cli.frontend_dir_path.clone());

        let auth = file.auth.unwrap_or_default();
        let jwt_secret = auth
            .jwt_secret
            .or_else(|| cli.jwt_secret.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("jwt_secret must be specified via --jwt-secret or in config file")
            })?;
        if jwt_secret.is_empty() {
            bail!("jwt_secret must not be empty");
        }
        let token_ttl_sec = auth.token_ttl_sec.unwrap_or(cli.token_ttl_sec);
        if token_ttl_sec == 0 {
            bail!("token_ttl_sec must be positive");
        }

        let engine_file = file.engine.unwrap_or_default();
        let engine = EngineSettings {
            recompute_genre_on_all_mutations: engine_file
                .recompute_genre_on_all_mutations
                .unwrap_or(cli.recompute_genre_on_all_mutations),
        };

        Ok(Self {
            db_dir,
            port,
            metrics_port,
            logging_level,
            frontend_dir_path,
            jwt_secret,
            token_ttl_sec,
            engine,
        })
    }

    pub fn db_path(&self) -> PathBuf {
        self.db_dir.join("songpin.db")
    }
}

fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}
