//! Configuration loading
//!
//! Precedence, lowest first: env file, process environment, flags. The env
//! file never overrides variables already present in the environment.

use std::ffi::OsString;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use itemsvc_server::db::pool::{DEFAULT_ACQUIRE_TIMEOUT, DEFAULT_MAX_CONNECTIONS};
use itemsvc_server::http::server::DEFAULT_PORT;
use itemsvc_server::{PoolSettings, ServerConfig};
use sqlx::postgres::PgConnectOptions;

pub const DEFAULT_ENV_FILE: &str = "dev.env";

/// Store connection settings
#[derive(Args, Debug, Clone)]
pub struct DatabaseArgs {
    /// Full connection URL; overrides the individual PG* settings
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,

    /// Database host
    #[arg(long, env = "PGHOST", default_value = "localhost")]
    pub pg_host: String,

    /// Database port
    #[arg(long, env = "PGPORT", default_value_t = 5432)]
    pub pg_port: u16,

    /// Database user
    #[arg(long, env = "PGUSER")]
    pub pg_user: Option<String>,

    /// Database password
    #[arg(long, env = "PGPASSWORD", hide_env_values = true)]
    pub pg_password: Option<String>,

    /// Database name
    #[arg(long, env = "PGDATABASE")]
    pub pg_database: Option<String>,

    /// Maximum pooled connections
    #[arg(long, default_value_t = DEFAULT_MAX_CONNECTIONS)]
    pub max_connections: u32,

    /// Seconds to wait for a free connection
    #[arg(long, default_value_t = DEFAULT_ACQUIRE_TIMEOUT.as_secs())]
    pub acquire_timeout: u64,
}

impl DatabaseArgs {
    pub fn connect_options(&self) -> Result<PgConnectOptions> {
        if let Some(url) = &self.database_url {
            return url.parse().context("invalid DATABASE_URL");
        }

        let mut options = PgConnectOptions::new()
            .host(&self.pg_host)
            .port(self.pg_port);
        if let Some(user) = &self.pg_user {
            options = options.username(user);
        }
        if let Some(password) = &self.pg_password {
            options = options.password(password);
        }
        if let Some(database) = &self.pg_database {
            options = options.database(database);
        }
        Ok(options)
    }

    pub fn pool_settings(&self) -> Result<PoolSettings> {
        Ok(PoolSettings::new(self.connect_options()?)
            .max_connections(self.max_connections)
            .acquire_timeout(Duration::from_secs(self.acquire_timeout)))
    }
}

/// Listener settings
#[derive(Args, Debug, Clone)]
pub struct ListenArgs {
    /// Port to listen on
    #[arg(short, long, env = "ITEMSVC_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Bind address
    #[arg(short, long, default_value = "0.0.0.0")]
    pub bind: IpAddr,
}

impl ListenArgs {
    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            bind_addr: SocketAddr::new(self.bind, self.port),
            ..ServerConfig::default()
        }
    }
}

/// Find the env file named on the command line, before clap runs.
///
/// clap reads `env = ...` defaults while parsing, so the file has to be
/// loaded first.
pub fn env_file_from_args<I>(args: I) -> PathBuf
where
    I: IntoIterator<Item = OsString>,
{
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        let Some(arg) = arg.to_str() else { continue };
        if arg == "--env-file" {
            if let Some(path) = args.next() {
                return PathBuf::from(path);
            }
        } else if let Some(path) = arg.strip_prefix("--env-file=") {
            return PathBuf::from(path);
        }
    }
    PathBuf::from(DEFAULT_ENV_FILE)
}

/// Load `path` into the process environment. A missing file is fine.
///
/// Returns whether a file was loaded.
pub fn load_env_file(path: &Path) -> Result<bool> {
    match dotenvy::from_path(path) {
        Ok(()) => Ok(true),
        Err(e) if e.not_found() => Ok(false),
        Err(e) => Err(e).with_context(|| format!("failed to load {}", path.display())),
    }
}
