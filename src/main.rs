mod config;
mod discord;
mod handler;
mod log;
mod models;
mod notifier;
mod polling;
mod ratelimit;
mod registry;
mod render;
mod shutdown;
mod steam;
mod tracker;

use anyhow::{Context as _, Result};
use clap::Parser;
use serenity::prelude::*;
use std::sync::Arc;
use tokio::time::Duration;

use config::{Cli, Config};
use handler::BotHandler;
use registry::ChannelRegistry;
use steam::SteamClient;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    log::set_debug(cli.debug);

    let config = Config::load(&cli).context("Failed to load configuration")?;
    print_config_info(&config);

    let config = Arc::new(config);
    let registry = Arc::new(ChannelRegistry::new());
    let (trigger, shutdown) = shutdown::channel();

    let steam = SteamClient::new(
        config.steam.base_url.clone(),
        config.steam.api_key.clone(),
        Duration::from_millis(config.steam.request_spacing_ms),
        shutdown.clone(),
    )
    .context("Failed to create Steam client")?;

    let handler = BotHandler::new(Arc::clone(&config), Arc::clone(&registry), steam, shutdown);
    let poller = Arc::clone(&handler.poller);

    let intents = GatewayIntents::GUILDS;
    let mut client = Client::builder(&config.discord.token, intents)
        .event_handler(handler)
        .await
        .context("Failed to create Discord client")?;

    let trigger = Arc::new(trigger);
    let shard_manager = Arc::clone(&client.shard_manager);
    let interrupt = Arc::clone(&trigger);
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error(format!("Failed to listen for interrupt: {}", e));
            return;
        }
        log::info("Interrupt received, shutting down...");
        interrupt.cancel();
        shard_manager.shutdown_all().await;
    });

    log::info("Starting Discord bot...");
    if let Err(why) = client.start().await {
        log::error(format!("Client error: {:?}", why));
    }
    trigger.cancel();

    let handle = poller.lock().ok().and_then(|mut poller| poller.take());
    if let Some(handle) = handle {
        if let Err(e) = handle.await {
            log::error(format!("Polling task failed: {}", e));
        }
    }

    log::success("Shut down cleanly");
    Ok(())
}

fn print_config_info(config: &Config) {
    log::info("Configuration loaded:");
    log::info(format!("   Steam API: {}", config.steam.base_url));
    log::info(format!("   League ID: {}", config.steam.league_id));
    log::info(format!(
        "   Poll interval: {}s (max {}s)",
        config.steam.poll_interval, config.steam.max_poll_interval
    ));
    log::info(format!("   Request spacing: {}ms", config.steam.request_spacing_ms));
    if let Some(language) = &config.steam.hero_language {
        log::info(format!("   Hero names: {}", language));
    }
}
