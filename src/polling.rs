use chrono::Utc;
use tokio::time::{Duration, sleep};

use crate::config::SteamConfig;
use crate::log;
use crate::notifier::Notifier;
use crate::shutdown::Shutdown;
use crate::steam::{ApiError, SteamClient};
use crate::tracker::MatchTracker;

/// Poll delay that doubles while the live feed keeps failing and snaps back
/// once a fetch succeeds.
#[derive(Debug, Clone)]
pub struct Backoff {
  base: Duration,
  max: Duration,
  current: Duration,
}

impl Backoff {
  pub fn new(base: Duration, max: Duration) -> Self {
    Self {
      base,
      max: max.max(base),
      current: base,
    }
  }

  pub fn success(&mut self) -> Duration {
    self.current = self.base;
    self.current
  }

  pub fn failure(&mut self) -> Duration {
    self.current = (self.current * 2).min(self.max);
    self.current
  }

  pub fn current(&self) -> Duration {
    self.current
  }
}

pub struct PollingService {
  league_id: u32,
  hero_language: Option<String>,
  client: SteamClient,
  notifier: Notifier,
  tracker: MatchTracker,
  backoff: Backoff,
  shutdown: Shutdown,
}

impl PollingService {
  pub fn new(
    steam: &SteamConfig,
    client: SteamClient,
    notifier: Notifier,
    shutdown: Shutdown,
  ) -> Self {
    Self {
      league_id: steam.league_id,
      hero_language: steam.hero_language.clone(),
      client,
      notifier,
      tracker: MatchTracker::new(),
      backoff: Backoff::new(
        Duration::from_secs(steam.poll_interval),
        Duration::from_secs(steam.max_poll_interval),
      ),
      shutdown,
    }
  }

  /// Startup probes. Neither is required for tracking, so failures are only
  /// logged.
  async fn init(&mut self) {
    match self.client.get_match_history(self.league_id).await {
      Ok(matches) => log::success(format!(
        "League {} reachable, {} completed match(es) on record",
        self.league_id,
        matches.len()
      )),
      Err(e) if e.is_cancelled() => {}
      Err(e) => log::warn(format!(
        "Could not fetch match history for league {}: {}",
        self.league_id, e
      )),
    }

    if let Some(language) = self.hero_language.clone() {
      match self.client.get_heroes(&language).await {
        Ok(heroes) => {
          log::info(format!("Loaded {} hero names ({})", heroes.len(), language));
          self.notifier.set_heroes(heroes);
        }
        Err(e) if e.is_cancelled() => {}
        Err(e) => log::warn(format!("Could not load hero names: {}", e)),
      }
    }
  }

  pub async fn run(mut self) {
    log::info(format!(
      "Watching league {} every {}s",
      self.league_id,
      self.backoff.current().as_secs()
    ));
    self.init().await;

    loop {
      if self.shutdown.is_cancelled() {
        break;
      }

      self.fetch_finished_match_details().await;
      let delay = match self.fetch_live_games().await {
        Ok(()) => self.backoff.success(),
        Err(e) if e.is_cancelled() => break,
        Err(e) => {
          let delay = self.backoff.failure();
          log::error(format!(
            "Error getting live games: {}. Next attempt in {}s",
            e,
            delay.as_secs()
          ));
          delay
        }
      };

      tokio::select! {
        _ = self.shutdown.cancelled() => break,
        _ = sleep(delay) => {}
      }
    }

    log::debug("Polling loop stopped");
  }

  async fn fetch_finished_match_details(&mut self) {
    if self.tracker.pending_finished().is_empty() {
      return;
    }

    let client = &self.client;
    let outcomes = self
      .tracker
      .drain_finished_queue(Utc::now(), |match_id| client.get_match_details(match_id))
      .await;

    self.notifier.matches_finished(&outcomes).await;
  }

  async fn fetch_live_games(&mut self) -> Result<(), ApiError> {
    let games = self.client.get_live_league_games(self.league_id).await?;
    let transitions = self.tracker.observe(&games, Utc::now());

    log::debug(format!(
      "{} live game(s): {} drafting, {} started, {} finished",
      games.len(),
      transitions.drafting.len(),
      transitions.started.len(),
      transitions.finished.len()
    ));

    if !transitions.finished.is_empty() {
      log::info(format!(
        "Match(es) finished: {:?}, waiting for details",
        transitions.finished
      ));
    }

    self.notifier.matches_drafting(&transitions.drafting).await;
    self.notifier.matches_started(&transitions.started).await;
    Ok(())
  }
}
