use std::sync::Arc;

use serenity::{http::Http, model::gateway::GatewayIntents, Client};

use shelf_core::{
    config::Config, dispatch::Dispatcher, messaging::port::MessagingPort,
    scheduler::SweepScheduler, sweeper::DueSweeper,
};

use crate::handlers::Handler;
use crate::DiscordMessenger;

/// Everything the gateway handlers need.
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub scheduler: SweepScheduler,
}

/// Connect to the gateway and serve until ctrl-c.
///
/// The reminder scheduler starts once the first `ready` arrives and is stopped
/// before the shards shut down.
pub async fn run(cfg: Arc<Config>, dispatcher: Arc<Dispatcher>) -> anyhow::Result<()> {
    let http = Arc::new(Http::new(&cfg.client_token));
    let messenger: Arc<dyn MessagingPort> = Arc::new(DiscordMessenger::new(http));
    let sweeper = Arc::new(DueSweeper::new(
        dispatcher.store().clone(),
        messenger,
        cfg.overdue_policy,
    ));
    let scheduler = SweepScheduler::new(sweeper, &cfg.sweep_cron)?;

    tracing::info!(
        store = %cfg.borrowings_file.display(),
        cron = %cfg.sweep_cron,
        policy = ?cfg.overdue_policy,
        "starting bot"
    );

    let state = Arc::new(AppState {
        dispatcher,
        scheduler: scheduler.clone(),
    });

    let intents =
        GatewayIntents::GUILDS | GatewayIntents::GUILD_MESSAGES | GatewayIntents::MESSAGE_CONTENT;
    let mut client = Client::builder(&cfg.client_token, intents)
        .event_handler(Handler::new(state))
        .await?;
    let shard_manager = client.shard_manager.clone();

    tokio::select! {
        res = client.start() => {
            scheduler.stop().await;
            res?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutting down");
            scheduler.stop().await;
            shard_manager.shutdown_all().await;
        }
    }

    Ok(())
}
