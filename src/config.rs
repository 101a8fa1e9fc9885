use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::auth::AuthSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Server settings. Every flag can also come from the environment (or a
/// `.env` file loaded before parsing).
#[derive(Parser, Debug, Clone)]
#[command(name = "inventory-server")]
#[command(about = "Inventory admin REST API and static pages", long_about = None)]
pub struct Config {
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    #[arg(short, long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// Sled database directory
    #[arg(long, env = "DATA_DIR", default_value = "inventory_data")]
    pub data_dir: PathBuf,

    /// Static admin pages
    #[arg(long, env = "PUBLIC_DIR", default_value = "public")]
    pub public_dir: PathBuf,

    #[arg(long, env = "JWT_SECRET", default_value = "change-me", hide_env_values = true)]
    pub jwt_secret: String,

    #[arg(long, env = "TOKEN_TTL_SECS", default_value_t = 3600)]
    pub token_ttl_secs: u64,

    #[arg(long, env = "BCRYPT_COST", default_value_t = bcrypt::DEFAULT_COST)]
    pub bcrypt_cost: u32,

    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,

    /// Also write daily rolling log files here
    #[arg(long, env = "LOG_DIR")]
    pub log_dir: Option<PathBuf>,
}

impl Config {
    pub fn addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }

    pub fn auth_settings(&self) -> AuthSettings {
        AuthSettings {
            jwt_secret: self.jwt_secret.clone(),
            token_ttl_secs: self.token_ttl_secs,
            bcrypt_cost: self.bcrypt_cost,
        }
    }
}
