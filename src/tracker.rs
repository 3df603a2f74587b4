use chrono::{DateTime, Duration, Utc};
use std::collections::{HashMap, HashSet};
use std::fmt::Display;
use std::future::Future;

use crate::log;
use crate::models::{LiveLeagueGame, MatchDetails, MatchId, MatchOutcome};
use crate::steam::ApiError;

/// How long (minutes) a finished match keeps being retried for details. Steam
/// indexes match details some minutes after a game leaves the live feed.
pub const FINISHED_RETRY_MINUTES: i64 = 10;

/// Combined pick count at which a game counts as started. One short of the
/// full ten so a start is never missed between polls.
pub const STARTED_PICK_THRESHOLD: usize = 9;

/// A failed details lookup. Cancelled lookups stop the drain without
/// touching the queue.
pub trait DetailError: Display {
    fn is_cancelled(&self) -> bool;
}

impl DetailError for ApiError {
    fn is_cancelled(&self) -> bool {
        ApiError::is_cancelled(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FinishedQueueEntry {
    pub match_id: MatchId,
    pub enqueued_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct LiveTransitions {
    pub drafting: Vec<LiveLeagueGame>,
    pub started: Vec<LiveLeagueGame>,
}

#[derive(Debug, Default)]
pub struct Transitions {
    pub drafting: Vec<LiveLeagueGame>,
    pub started: Vec<LiveLeagueGame>,
    pub finished: Vec<MatchId>,
}

/// Per-league match state. Owned by the poll loop; nothing else mutates it.
#[derive(Debug, Default)]
pub struct MatchTracker {
    drafting_seen: HashSet<MatchId>,
    started_seen: HashSet<MatchId>,
    finished_seen: HashSet<MatchId>,
    // GetMatchDetails does not report the game number, so it is kept from the
    // live feed.
    game_numbers: HashMap<MatchId, u32>,
    finished_queue: Vec<FinishedQueueEntry>,
}

pub fn is_started(game: &LiveLeagueGame) -> bool {
    game.scoreboard.duration > 0.0 || game.pick_count() >= STARTED_PICK_THRESHOLD
}

impl MatchTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs finished detection against the snapshot, then ingests it.
    pub fn observe(&mut self, games: &[LiveLeagueGame], now: DateTime<Utc>) -> Transitions {
        let live_ids: HashSet<MatchId> = games.iter().map(|g| g.match_id).collect();
        let finished = self.detect_finished(&live_ids, now);
        let LiveTransitions { drafting, started } = self.ingest_live_snapshot(games);

        Transitions {
            drafting,
            started,
            finished,
        }
    }

    pub fn ingest_live_snapshot(&mut self, games: &[LiveLeagueGame]) -> LiveTransitions {
        let mut out = LiveTransitions::default();

        for game in games {
            self.game_numbers.insert(game.match_id, game.game_number);

            if !is_started(game) {
                // A game already reported started never goes back to drafting,
                // even if a snapshot arrives with an empty scoreboard.
                if self.started_seen.contains(&game.match_id) {
                    continue;
                }
                if self.drafting_seen.insert(game.match_id) {
                    out.drafting.push(game.clone());
                }
            } else if self.started_seen.insert(game.match_id) {
                out.started.push(game.clone());
            }
        }

        out
    }

    pub fn detect_finished(
        &mut self,
        live_ids: &HashSet<MatchId>,
        now: DateTime<Utc>,
    ) -> Vec<MatchId> {
        let newly_finished: Vec<MatchId> = self
            .started_seen
            .iter()
            .filter(|id| !self.finished_seen.contains(*id) && !live_ids.contains(*id))
            .copied()
            .collect();

        for &match_id in &newly_finished {
            self.finished_seen.insert(match_id);
            self.finished_queue.push(FinishedQueueEntry {
                match_id,
                enqueued_at: now,
            });
        }

        newly_finished
    }

    /// Tries to fetch details for every queued finished match. Entries that
    /// fail are kept until they are older than [`FINISHED_RETRY_MINUTES`].
    /// A cancelled lookup ends the drain and leaves the rest queued.
    pub async fn drain_finished_queue<F, Fut, E>(
        &mut self,
        now: DateTime<Utc>,
        mut fetch: F,
    ) -> Vec<MatchOutcome>
    where
        F: FnMut(MatchId) -> Fut,
        Fut: Future<Output = Result<MatchDetails, E>>,
        E: DetailError,
    {
        let retry_window = Duration::minutes(FINISHED_RETRY_MINUTES);
        let queue = std::mem::take(&mut self.finished_queue);
        let mut remaining = Vec::with_capacity(queue.len());
        let mut outcomes = Vec::new();
        let mut entries = queue.into_iter();

        while let Some(entry) = entries.next() {
            match fetch(entry.match_id).await {
                Err(e) if e.is_cancelled() => {
                    remaining.push(entry);
                    remaining.extend(entries);
                    break;
                }
                Ok(details) => {
                    let game_number = self.game_number(entry.match_id).unwrap_or_default();
                    outcomes.push(MatchOutcome::from_details(&details, game_number));
                }
                Err(e) if now - entry.enqueued_at <= retry_window => {
                    log::debug(format!(
                        "Error getting match details for {}: {}",
                        entry.match_id, e
                    ));
                    remaining.push(entry);
                }
                Err(e) => {
                    log::warn(format!(
                        "Giving up on match details for {} after {} minutes: {}",
                        entry.match_id, FINISHED_RETRY_MINUTES, e
                    ));
                }
            }
        }

        self.finished_queue = remaining;
        outcomes
    }

    pub fn game_number(&self, match_id: MatchId) -> Option<u32> {
        self.game_numbers.get(&match_id).copied()
    }

    pub fn pending_finished(&self) -> &[FinishedQueueEntry] {
        &self.finished_queue
    }
}
