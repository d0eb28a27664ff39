use std::time::Duration;

use anyhow::Context;
use mongodb::{bson::doc, options::ClientOptions, Client};
use tracing::info;

use crate::config::MongoConfig;

/// Builds a pooled client from `config` and pings the server before returning it.
pub async fn connect(config: &MongoConfig) -> anyhow::Result<Client> {
    let mut options = ClientOptions::parse(&config.url)
        .await
        .context("parse mongodb connection string")?;
    options.connect_timeout = Some(Duration::from_secs(config.connect_timeout_secs));
    options.server_selection_timeout =
        Some(Duration::from_secs(config.server_selection_timeout_secs));
    if let Some(app_name) = &config.app_name {
        options.app_name = Some(app_name.clone());
    }

    let client = Client::with_options(options).context("build mongodb client")?;
    client
        .database("admin")
        .run_command(doc! { "ping": 1 })
        .await
        .context("ping mongodb")?;

    info!(database = %config.database, "connected to mongodb");
    Ok(client)
}
