//! Applies comment and profile facts from RabbitMQ to the posts table until interrupted.

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use post_engagement::bus::rabbit::{RabbitFactSource, RabbitFactSourceConfig};
use post_engagement::config::Settings;
use post_engagement::relay::{Consumer, CounterProjector, RelayConfig};
use post_engagement::store::postgres::{PgPostStore, PgPostStoreBuilder};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    let settings: Settings = Settings::from_env()?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&settings.database_url)
        .await
        .context("failed to connect to postgres")?;
    let store: PgPostStore = PgPostStoreBuilder::new(pool)
        .try_build()
        .await
        .context("failed to prepare the posts schema")?;

    let source = RabbitFactSource::new(
        RabbitFactSourceConfig::builder()
            .url(&settings.amqp_url)
            .queue(&settings.fact_queue)
            .channels(settings.fact_channels.clone())
            .build(),
    );
    let relay_config = RelayConfig::builder().handler_timeout(settings.handler_timeout).build();
    let consumer = Consumer::new(source, relay_config).with_handler(CounterProjector::new(store));

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if let Err(error) = tokio::signal::ctrl_c().await {
                tracing::error!(%error, "failed to listen for shutdown signal");
            }
            tracing::info!("shutdown requested");
            cancel.cancel();
        }
    });

    consumer.run(cancel).await.context("fact consumer failed")?;
    Ok(())
}
