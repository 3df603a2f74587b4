use std::sync::Arc;

use crate::discord::{ChatSink, MESSAGE_LIMIT, split_message};
use crate::log;
use crate::models::{HeroCatalog, LiveLeagueGame, MatchOutcome};
use crate::registry::ChannelRegistry;
use crate::render::{NoticeKind, render_drafting, render_finished, render_started};
use crate::shutdown::Shutdown;

pub struct Notifier {
  registry: Arc<ChannelRegistry>,
  sink: Arc<dyn ChatSink>,
  heroes: Option<HeroCatalog>,
  shutdown: Shutdown,
}

impl Notifier {
  pub fn new(registry: Arc<ChannelRegistry>, sink: Arc<dyn ChatSink>, shutdown: Shutdown) -> Self {
    Self {
      registry,
      sink,
      heroes: None,
      shutdown,
    }
  }

  pub fn set_heroes(&mut self, heroes: HeroCatalog) {
    self.heroes = Some(heroes);
  }

  pub async fn matches_drafting(&self, games: &[LiveLeagueGame]) {
    if !games.is_empty() {
      self.broadcast(NoticeKind::Drafting, &render_drafting(games)).await;
    }
  }

  pub async fn matches_started(&self, games: &[LiveLeagueGame]) {
    if !games.is_empty() {
      let text = render_started(games, self.heroes.as_ref());
      self.broadcast(NoticeKind::Started, &text).await;
    }
  }

  pub async fn matches_finished(&self, outcomes: &[MatchOutcome]) {
    if !outcomes.is_empty() {
      self.broadcast(NoticeKind::Finished, &render_finished(outcomes)).await;
    }
  }

  /// Sends `content` to every registered channel. A failing channel is logged
  /// and skipped. Stops at the first send interrupted by shutdown. Returns the
  /// number of channels that got every chunk.
  pub async fn broadcast(&self, kind: NoticeKind, content: &str) -> usize {
    if self.shutdown.is_cancelled() {
      return 0;
    }
    let channels = self.registry.snapshot().await;
    if channels.is_empty() {
      log::debug(format!("No channels registered, dropping {:?} notice", kind));
      return 0;
    }

    let chunks = split_message(content, MESSAGE_LIMIT);
    let mut delivered = 0;

    'channels: for channel in channels {
      let mut ok = true;
      for chunk in &chunks {
        let sent = tokio::select! {
          biased;
          _ = self.shutdown.cancelled() => {
            log::debug(format!("Shutdown interrupted {:?} notice", kind));
            break 'channels;
          }
          sent = self.sink.send(channel, chunk, kind.tts()) => sent,
        };
        if let Err(e) = sent {
          log::error(format!("Failed sending message to channel {}: {}", channel, e));
          ok = false;
          break;
        }
      }
      if ok {
        delivered += 1;
      }
    }

    log::info(format!(
      "Broadcast {:?} notice to {} channel(s)",
      kind, delivered
    ));
    delivered
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use anyhow::Result;
  use serenity::async_trait;
  use serenity::model::id::{ChannelId, GuildId};
  use std::sync::Mutex;

  use crate::shutdown::{self, ShutdownTrigger};

  #[derive(Default)]
  struct RecordingSink {
    sent: Mutex<Vec<(ChannelId, String, bool)>>,
    failing: Vec<ChannelId>,
    // Pulled on the first send, as if Ctrl-C arrived mid-broadcast.
    cancel_on_send: Option<ShutdownTrigger>,
  }

  #[async_trait]
  impl ChatSink for RecordingSink {
    async fn send(&self, channel: ChannelId, content: &str, tts: bool) -> Result<()> {
      if self.failing.contains(&channel) {
        anyhow::bail!("missing permissions");
      }
      self.sent.lock().unwrap().push((channel, content.to_string(), tts));
      if let Some(trigger) = &self.cancel_on_send {
        trigger.cancel();
        std::future::pending::<()>().await;
      }
      Ok(())
    }
  }

  // The trigger must outlive the notifier; a dropped trigger reads as cancelled.
  fn notifier(
    registry: Arc<ChannelRegistry>,
    sink: Arc<RecordingSink>,
  ) -> (Notifier, ShutdownTrigger) {
    let (trigger, shutdown) = shutdown::channel();
    (Notifier::new(registry, sink, shutdown), trigger)
  }

  fn outcome() -> MatchOutcome {
    MatchOutcome {
      game_number: 1,
      winner_name: "A".to_string(),
      loser_name: "B".to_string(),
      winner_score: 30,
      loser_score: 12,
    }
  }

  #[tokio::test]
  async fn empty_registry_sends_nothing() {
    let sink = Arc::new(RecordingSink::default());
    let (notifier, _trigger) = notifier(Arc::new(ChannelRegistry::new()), sink.clone());

    assert_eq!(notifier.broadcast(NoticeKind::Started, "hello").await, 0);
    assert!(sink.sent.lock().unwrap().is_empty());
  }

  #[tokio::test]
  async fn failing_channel_does_not_stop_others() {
    let registry = Arc::new(ChannelRegistry::new());
    registry.add(ChannelId::new(1), GuildId::new(1)).await;
    registry.add(ChannelId::new(2), GuildId::new(2)).await;
    registry.add(ChannelId::new(3), GuildId::new(3)).await;

    let sink = Arc::new(RecordingSink {
      failing: vec![ChannelId::new(2)],
      ..Default::default()
    });
    let (notifier, _trigger) = notifier(registry, sink.clone());

    assert_eq!(notifier.broadcast(NoticeKind::Drafting, "hi").await, 2);
    let mut reached: Vec<u64> = sink
      .sent
      .lock()
      .unwrap()
      .iter()
      .map(|(c, _, _)| c.get())
      .collect();
    reached.sort();
    assert_eq!(reached, vec![1, 3]);
  }

  #[tokio::test]
  async fn finished_notice_is_tts() {
    let registry = Arc::new(ChannelRegistry::new());
    registry.add(ChannelId::new(1), GuildId::new(1)).await;
    let sink = Arc::new(RecordingSink::default());
    let (notifier, _trigger) = notifier(registry, sink.clone());

    notifier.matches_finished(&[outcome()]).await;

    let sent = sink.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].1, "Match Ended: A defeated B (30 - 12, Game 1)");
    assert!(sent[0].2);
  }

  #[tokio::test]
  async fn empty_batches_are_not_sent() {
    let registry = Arc::new(ChannelRegistry::new());
    registry.add(ChannelId::new(1), GuildId::new(1)).await;
    let sink = Arc::new(RecordingSink::default());
    let (notifier, _trigger) = notifier(registry, sink.clone());

    notifier.matches_drafting(&[]).await;
    notifier.matches_started(&[]).await;
    notifier.matches_finished(&[]).await;
    assert!(sink.sent.lock().unwrap().is_empty());
  }

  #[tokio::test]
  async fn cancelled_shutdown_sends_nothing() {
    let registry = Arc::new(ChannelRegistry::new());
    registry.add(ChannelId::new(1), GuildId::new(1)).await;
    let sink = Arc::new(RecordingSink::default());
    let (trigger, shutdown) = shutdown::channel();
    let notifier = Notifier::new(registry, sink.clone(), shutdown);

    trigger.cancel();
    notifier.matches_finished(&[outcome()]).await;
    assert!(sink.sent.lock().unwrap().is_empty());
  }

  #[tokio::test]
  async fn shutdown_interrupts_broadcast_in_flight() {
    let registry = Arc::new(ChannelRegistry::new());
    for id in 1..=3 {
      registry.add(ChannelId::new(id), GuildId::new(id)).await;
    }
    let (trigger, shutdown) = shutdown::channel();
    let sink = Arc::new(RecordingSink {
      cancel_on_send: Some(trigger),
      ..Default::default()
    });
    let notifier = Notifier::new(registry, sink.clone(), shutdown);

    assert_eq!(notifier.broadcast(NoticeKind::Started, "go").await, 0);
    assert_eq!(sink.sent.lock().unwrap().len(), 1);
  }
}
