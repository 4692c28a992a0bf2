use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use std::{fmt::Debug, path::PathBuf};
use tracing::{error, info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use songpin_server::auth::{Authenticator, SqliteTokenCache, DEFAULT_TOKEN_TTL_SEC};
use songpin_server::config::{AppConfig, CliConfig, FileConfig};
use songpin_server::server::{self, RequestsLoggingLevel, ServerConfig};
use songpin_server::SongPinStore;

const TOKEN_PURGE_INTERVAL: Duration = Duration::from_secs(60 * 60);

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Directory holding the SQLite database (songpin.db).
    #[clap(long, value_parser = parse_path)]
    pub db_dir: Option<PathBuf>,

    /// Optional TOML config file. Its values override the CLI arguments.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 3001)]
    pub port: u16,

    /// The port for the metrics server (Prometheus scraping).
    #[clap(long, default_value_t = 9091)]
    pub metrics_port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// Path to the frontend directory to be statically served.
    #[clap(long)]
    pub frontend_dir_path: Option<String>,

    /// Secret used to sign access tokens.
    #[clap(long, env = "JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: Option<String>,

    /// Lifetime of issued access tokens, in seconds.
    #[clap(long, default_value_t = DEFAULT_TOKEN_TTL_SEC)]
    pub token_ttl_sec: u64,

    /// Recompute a song's average genre on pin updates and deletes too,
    /// not only on creation.
    #[clap(long)]
    pub recompute_genre_on_all_mutations: bool,
}

impl CliArgs {
    fn to_cli_config(&self) -> CliConfig {
        CliConfig {
            db_dir: self.db_dir.clone(),
            port: self.port,
            metrics_port: self.metrics_port,
            logging_level: self.logging_level.clone(),
            frontend_dir_path: self.frontend_dir_path.clone(),
            jwt_secret: self.jwt_secret.clone(),
            token_ttl_sec: self.token_ttl_sec,
            recompute_genre_on_all_mutations: self.recompute_genre_on_all_mutations,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .context("Failed to initialize logging")?;

    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading config file {:?}...", path);
            Some(FileConfig::load(path)?)
        }
        None => None,
    };
    let config = AppConfig::resolve(&cli_args.to_cli_config(), file_config)?;

    info!("Opening SQLite database at {:?}...", config.db_path());
    let store = SongPinStore::new(config.db_path())?;

    info!("Initializing metrics...");
    server::metrics::init_metrics();

    let token_cache = Arc::new(SqliteTokenCache::new(store.clone()));
    let authenticator = Authenticator::new(
        config.jwt_secret.as_bytes(),
        token_cache,
        config.token_ttl_sec,
    );

    let purging_authenticator = authenticator.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(TOKEN_PURGE_INTERVAL);
        loop {
            ticker.tick().await;
            match purging_authenticator.purge_expired() {
                Ok(count) => {
                    if count > 0 {
                        info!("Purged {} expired access tokens", count);
                    }
                }
                Err(e) => {
                    error!("Failed to purge expired access tokens: {}", e);
                }
            }
        }
    });

    if config.engine.recompute_genre_on_all_mutations {
        info!("Average genre is recomputed on every pin mutation");
    }

    info!("Ready to serve at port {}!", config.port);
    info!("Metrics available at port {}!", config.metrics_port);
    server::run_server(
        ServerConfig {
            requests_logging_level: config.logging_level,
            port: config.port,
            metrics_port: config.metrics_port,
            frontend_dir_path: config.frontend_dir_path,
        },
        store,
        config.engine,
        authenticator,
    )
    .await
}
