use serenity::all::ActivityData;
use serenity::async_trait;
use serenity::model::channel::{ChannelType, GuildChannel, Message};
use serenity::model::gateway::Ready;
use serenity::model::guild::{Guild, UnavailableGuild};
use serenity::model::id::ChannelId;
use serenity::prelude::*;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;

use crate::config::Config;
use crate::discord::DiscordMessenger;
use crate::log;
use crate::notifier::Notifier;
use crate::polling::PollingService;
use crate::registry::ChannelRegistry;
use crate::shutdown::Shutdown;
use crate::steam::SteamClient;

pub struct BotHandler {
  pub config: Arc<Config>,
  pub registry: Arc<ChannelRegistry>,
  pub shutdown: Shutdown,
  pub poller: Arc<Mutex<Option<JoinHandle<()>>>>,
  // Taken by the first ready event; empty once polling has started.
  client: Mutex<Option<SteamClient>>,
}

impl BotHandler {
  pub fn new(
    config: Arc<Config>,
    registry: Arc<ChannelRegistry>,
    client: SteamClient,
    shutdown: Shutdown,
  ) -> Self {
    Self {
      config,
      registry,
      shutdown,
      poller: Arc::new(Mutex::new(None)),
      client: Mutex::new(Some(client)),
    }
  }

  fn take_client(&self) -> Option<SteamClient> {
    self.client.lock().ok().and_then(|mut client| client.take())
  }

  fn start_polling(&self, ctx: &Context, client: SteamClient) {
    let messenger = Arc::new(DiscordMessenger::new(Arc::clone(&ctx.http)));
    let notifier = Notifier::new(Arc::clone(&self.registry), messenger, self.shutdown.clone());
    let service = PollingService::new(&self.config.steam, client, notifier, self.shutdown.clone());

    let handle = tokio::spawn(service.run());
    if let Ok(mut poller) = self.poller.lock() {
      *poller = Some(handle);
    }
  }
}

#[async_trait]
impl EventHandler for BotHandler {
  async fn ready(&self, ctx: Context, ready: Ready) {
    log::success(format!("{} is connected and ready!", ready.user.name));
    ctx.set_activity(Some(ActivityData::watching(format!(
      "league {}",
      self.config.steam.league_id
    ))));

    // Ready fires again after every reconnect.
    if let Some(client) = self.take_client() {
      self.start_polling(&ctx, client);
    }
  }

  async fn guild_create(&self, _ctx: Context, guild: Guild, _is_new: Option<bool>) {
    let text_channels = guild
      .channels
      .values()
      .filter(|c| c.kind == ChannelType::Text)
      .map(|c| (c.id, c.position));

    match default_channel(guild.system_channel_id, text_channels) {
      Some(channel) => {
        self.registry.add(channel, guild.id).await;
        log::info(format!(
          "Joined guild {} ({}), posting to channel {} ({} channel(s) registered)",
          guild.name,
          guild.id,
          channel,
          self.registry.len().await
        ));
      }
      None => log::warn(format!(
        "Guild {} ({}) has no text channel to post in",
        guild.name, guild.id
      )),
    }
  }

  async fn channel_delete(
    &self,
    _ctx: Context,
    channel: GuildChannel,
    _messages: Option<Vec<Message>>,
  ) {
    if self.registry.remove(channel.id).await {
      log::info(format!(
        "Channel {} in guild {} was deleted, no longer posting there",
        channel.id, channel.guild_id
      ));
    }
  }

  async fn guild_delete(&self, _ctx: Context, incomplete: UnavailableGuild, _full: Option<Guild>) {
    // An unavailable guild is an outage, not a departure; guild_create
    // fires again when it comes back.
    if incomplete.unavailable {
      log::debug(format!("Guild {} became unavailable", incomplete.id));
      return;
    }

    let removed = self.registry.remove_guild(incomplete.id).await;
    log::info(format!(
      "Left guild {}, removed {} channel(s)",
      incomplete.id, removed
    ));
    if self.registry.is_empty().await {
      log::warn("No channels left to post in");
    }
  }
}

/// Picks where to post in a guild: its system channel, otherwise the topmost
/// text channel.
pub fn default_channel(
  system_channel: Option<ChannelId>,
  text_channels: impl IntoIterator<Item = (ChannelId, u16)>,
) -> Option<ChannelId> {
  system_channel.or_else(|| {
    text_channels
      .into_iter()
      .min_by_key(|&(id, position)| (position, id))
      .map(|(id, _)| id)
  })
}
