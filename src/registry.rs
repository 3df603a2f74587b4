use serenity::model::id::{ChannelId, GuildId};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Channels that receive match notices, each remembered with its guild so a
/// departed guild can be dropped in one go.
#[derive(Debug, Default)]
pub struct ChannelRegistry {
  channels: RwLock<HashMap<ChannelId, GuildId>>,
}

impl ChannelRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  pub async fn add(&self, channel: ChannelId, guild: GuildId) {
    self.channels.write().await.insert(channel, guild);
  }

  pub async fn remove(&self, channel: ChannelId) -> bool {
    self.channels.write().await.remove(&channel).is_some()
  }

  /// Removes every channel belonging to `guild`, returning how many went.
  pub async fn remove_guild(&self, guild: GuildId) -> usize {
    let mut channels = self.channels.write().await;
    let before = channels.len();
    channels.retain(|_, owner| *owner != guild);
    before - channels.len()
  }

  pub async fn snapshot(&self) -> Vec<ChannelId> {
    self.channels.read().await.keys().copied().collect()
  }

  pub async fn len(&self) -> usize {
    self.channels.read().await.len()
  }

  pub async fn is_empty(&self) -> bool {
    self.channels.read().await.is_empty()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::Arc;

  #[tokio::test]
  async fn removing_guild_empties_its_channels() {
    let registry = ChannelRegistry::new();
    registry.add(ChannelId::new(10), GuildId::new(1)).await;
    assert!(!registry.is_empty().await);
    assert_eq!(registry.remove_guild(GuildId::new(1)).await, 1);
    assert!(registry.is_empty().await);
  }

  #[tokio::test]
  async fn removing_guild_keeps_other_guilds() {
    let registry = ChannelRegistry::new();
    registry.add(ChannelId::new(10), GuildId::new(1)).await;
    registry.add(ChannelId::new(11), GuildId::new(1)).await;
    registry.add(ChannelId::new(20), GuildId::new(2)).await;

    assert_eq!(registry.remove_guild(GuildId::new(1)).await, 2);
    assert_eq!(registry.snapshot().await, vec![ChannelId::new(20)]);
    assert_eq!(registry.remove_guild(GuildId::new(3)).await, 0);
  }

  #[tokio::test]
  async fn add_is_idempotent_and_remove_reports_presence() {
    let registry = ChannelRegistry::new();
    registry.add(ChannelId::new(10), GuildId::new(1)).await;
    registry.add(ChannelId::new(10), GuildId::new(1)).await;
    assert_eq!(registry.len().await, 1);

    assert!(registry.remove(ChannelId::new(10)).await);
    assert!(!registry.remove(ChannelId::new(10)).await);
  }

  #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
  async fn concurrent_writers_and_readers() {
    let registry = Arc::new(ChannelRegistry::new());
    let mut tasks = Vec::new();

    for i in 1..=50u64 {
      let registry = Arc::clone(&registry);
      tasks.push(tokio::spawn(async move {
        registry.add(ChannelId::new(i), GuildId::new(i % 5 + 1)).await;
        registry.snapshot().await.len()
      }));
    }
    for task in tasks {
      assert!(task.await.unwrap() >= 1);
    }
    assert_eq!(registry.len().await, 50);
  }
}
