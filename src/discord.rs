use anyhow::Result;
use serenity::async_trait;
use serenity::builder::CreateMessage;
use serenity::http::Http;
use serenity::model::id::ChannelId;
use std::sync::Arc;
use tokio::time::{Duration, timeout};

use crate::log;

/// Discord rejects message bodies longer than this.
pub const MESSAGE_LIMIT: usize = 2000;

/// Somewhere a text notice can be delivered.
#[async_trait]
pub trait ChatSink: Send + Sync {
  async fn send(&self, channel: ChannelId, content: &str, tts: bool) -> Result<()>;
}

pub struct DiscordMessenger {
  http: Arc<Http>,
}

impl DiscordMessenger {
  pub fn new(http: Arc<Http>) -> Self {
    Self { http }
  }
}

#[async_trait]
impl ChatSink for DiscordMessenger {
  async fn send(&self, channel: ChannelId, content: &str, tts: bool) -> Result<()> {
    let message = CreateMessage::new().content(content).tts(tts);
    let send_future = channel.send_message(&self.http, message);

    match timeout(Duration::from_secs(10), send_future).await {
      Ok(Ok(_)) => {
        log::debug(format!("Sent message to channel {}", channel));
        Ok(())
      }
      Ok(Err(e)) => Err(e.into()),
      Err(_) => Err(anyhow::anyhow!("Message send timeout after 10 seconds")),
    }
  }
}

/// Splits a multi-line notice into chunks that fit one Discord message,
/// breaking between lines where possible.
pub fn split_message(content: &str, limit: usize) -> Vec<String> {
  let mut chunks = Vec::new();
  let mut current = String::new();

  for line in content.lines() {
    let mut line = line.to_string();
    while line.chars().count() > limit {
      if !current.is_empty() {
        chunks.push(std::mem::take(&mut current));
      }
      let head: String = line.chars().take(limit).collect();
      line = line.chars().skip(limit).collect();
      chunks.push(head);
    }

    let needed = if current.is_empty() {
      line.chars().count()
    } else {
      current.chars().count() + 1 + line.chars().count()
    };
    if needed > limit {
      chunks.push(std::mem::take(&mut current));
    }
    if !current.is_empty() {
      current.push('\n');
    }
    current.push_str(&line);
  }

  if !current.is_empty() {
    chunks.push(current);
  }
  chunks
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn short_message_is_one_chunk() {
    assert_eq!(split_message("a\nb", 2000), vec!["a\nb".to_string()]);
  }

  #[test]
  fn splits_between_lines() {
    let chunks = split_message("aaaa\nbbbb\ncc", 9);
    assert_eq!(chunks, vec!["aaaa\nbbbb".to_string(), "cc".to_string()]);
  }

  #[test]
  fn overlong_line_is_cut() {
    let chunks = split_message("abcdefgh\nxy", 3);
    assert_eq!(chunks, vec!["abc", "def", "gh", "xy"]);
  }

  #[test]
  fn empty_message_has_no_chunks() {
    assert!(split_message("", 10).is_empty());
  }
}
