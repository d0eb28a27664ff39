use std::net::SocketAddr;
use std::str::FromStr;

use anyhow::Context;

#[derive(Debug, Clone)]
pub struct MongoConfig {
    pub url: String,
    pub database: String,
    pub app_name: Option<String>,
    pub connect_timeout_secs: u64,
    pub server_selection_timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub mongo: MongoConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let port = match std::env::var("APP_PORT").or_else(|_| std::env::var("PORT")) {
            Ok(v) => v
                .parse::<u16>()
                .with_context(|| format!("invalid port {v:?}"))?,
            Err(_) => 8080,
        };
        let mongo = MongoConfig {
            url: std::env::var("MONGODB_URI")
                .or_else(|_| std::env::var("MONGODB_URL"))
                .context("MONGODB_URI or MONGODB_URL must be set")?,
            database: std::env::var("MONGODB_DATABASE").unwrap_or_else(|_| "users_api".into()),
            app_name: std::env::var("MONGODB_APP_NAME").ok(),
            connect_timeout_secs: parse_or("MONGODB_CONNECT_TIMEOUT_SECS", 10)?,
            server_selection_timeout_secs: parse_or("MONGODB_SERVER_SELECTION_TIMEOUT_SECS", 30)?,
        };
        Ok(Self {
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port,
            mongo,
        })
    }

    pub fn listen_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }
}

fn parse_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(v) => v.parse().with_context(|| format!("{key} has invalid value {v:?}")),
        Err(_) => Ok(default),
    }
}
