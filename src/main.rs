use std::process::ExitCode;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::alerts::{AlertSink, DiscordWebhook};
use crate::config_file::WatcherConfigFile;
use crate::store::{
    SnapshotStore,
    redis::{RedisQueue, RedisStore},
};
use crate::watcher::{ContainerSnapshot, GameStateSnapshot, IngestionLoop, Pipeline};

mod alerts;
mod cli;
mod config_file;
mod health;
mod secrets;
mod signals;
mod store;
#[cfg(test)]
mod testing;
mod watcher;

type SetupError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> ExitCode {
    let env = env_logger::Env::default().default_filter_or("info");
    env_logger::Builder::from_env(env).init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), SetupError> {
    let args = cli::get_cli_args();
    let config = WatcherConfigFile::try_init(&args.config, &args.vars)?;
    let call_timeout = config.call_timeout();

    log::info!(
        "Starting {} {} (lists {} and {})",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        config.redis.info_list_name,
        config.redis.details_list_name
    );

    let webhook_url = config.alerts.webhook_url.resolve().await?;
    let alerts: Arc<dyn AlertSink> = Arc::new(DiscordWebhook::new(webhook_url, call_timeout)?);

    let client = redis::Client::open(config.redis.address.as_str())?;
    let store: Arc<dyn SnapshotStore> = Arc::new(RedisStore::connect(&client).await?);
    // BLPOP holds its connection, so each loop gets its own
    let info_queue = RedisQueue::connect(&client, config.redis.pop_timeout()).await?;
    let details_queue = RedisQueue::connect(&client, config.redis.pop_timeout()).await?;

    let cancel = CancellationToken::new();
    signals::handle_shutdown(cancel.clone())?;

    let info_loop = IngestionLoop::new(
        config.redis.info_list_name.clone(),
        Arc::new(info_queue),
        Pipeline::<ContainerSnapshot>::new(store.clone(), alerts.clone(), call_timeout),
    );
    let details_loop = IngestionLoop::new(
        config.redis.details_list_name.clone(),
        Arc::new(details_queue),
        Pipeline::<GameStateSnapshot>::new(store.clone(), alerts, call_timeout),
    );

    let info_task = tokio::spawn(info_loop.run(cancel.clone()));
    let details_task = tokio::spawn(details_loop.run(cancel.clone()));
    let health_port = config.health.port;
    let health_cancel = cancel.clone();
    let health_task = tokio::spawn(async move {
        // Without the health endpoint the watcher keeps running
        let served = health::start_health_service(health_port, store, health_cancel);
        if let Err(e) = served.await {
            log::error!("Health service stopped: {e}");
        }
    });

    let _ = sd_notify::notify(true, &[sd_notify::NotifyState::Ready]);

    let (info, details, health) = tokio::join!(info_task, details_task, health_task);
    info?;
    details?;
    health?;

    log::info!("Shutdown complete");
    Ok(())
}
