use serde::Deserialize;
use std::collections::HashMap;

pub type MatchId = u64;
pub type HeroId = u32;

/// Localized hero names keyed by hero id.
pub type HeroCatalog = HashMap<HeroId, String>;

/// Success predicate for a decoded Steam response. Endpoints disagree on what
/// "ok" looks like, so each response kind declares its own.
pub trait CheckStatus {
    fn is_success(&self) -> bool;
}

#[derive(Debug, Clone, Deserialize)]
pub struct LiveLeagueGamesResponse {
    pub result: LiveLeagueGamesResult,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LiveLeagueGamesResult {
    pub status: i32,
    #[serde(default)]
    pub games: Vec<LiveLeagueGame>,
}

impl CheckStatus for LiveLeagueGamesResponse {
    fn is_success(&self) -> bool {
        self.result.status == 200
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LiveLeagueGame {
    #[serde(default)]
    pub radiant_team: Team,
    #[serde(default)]
    pub dire_team: Team,
    #[serde(default)]
    pub game_number: u32,
    pub match_id: MatchId,
    #[serde(default)]
    pub scoreboard: Scoreboard,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Team {
    #[serde(default, alias = "name")]
    pub team_name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Scoreboard {
    #[serde(default)]
    pub duration: f32,
    #[serde(default)]
    pub radiant: ScoreboardSide,
    #[serde(default)]
    pub dire: ScoreboardSide,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScoreboardSide {
    #[serde(default)]
    pub picks: Vec<HeroPick>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct HeroPick {
    pub hero_id: HeroId,
}

impl LiveLeagueGame {
    pub fn pick_count(&self) -> usize {
        self.scoreboard.radiant.picks.len() + self.scoreboard.dire.picks.len()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MatchHistoryResponse {
    pub result: MatchHistoryResult,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MatchHistoryResult {
    pub status: i32,
    #[serde(default)]
    pub matches: Vec<MatchHistoryEntry>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct MatchHistoryEntry {
    pub match_id: MatchId,
}

impl CheckStatus for MatchHistoryResponse {
    fn is_success(&self) -> bool {
        self.result.status == 1
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MatchDetailsResponse {
    pub result: MatchDetailsResult,
}

/// Raw details payload. Steam reports unknown or not-yet-indexed matches with
/// an `error` field instead of an HTTP error.
#[derive(Debug, Clone, Deserialize)]
pub struct MatchDetailsResult {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub radiant_win: Option<bool>,
    #[serde(default)]
    pub radiant_name: String,
    #[serde(default)]
    pub dire_name: String,
    #[serde(default)]
    pub radiant_score: u32,
    #[serde(default)]
    pub dire_score: u32,
}

impl CheckStatus for MatchDetailsResponse {
    fn is_success(&self) -> bool {
        self.result.error.is_none() && self.result.radiant_win.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchDetails {
    pub radiant_win: bool,
    pub radiant_name: String,
    pub dire_name: String,
    pub radiant_score: u32,
    pub dire_score: u32,
}

impl MatchDetailsResponse {
    /// Only meaningful once `is_success` has passed.
    pub fn into_details(self) -> MatchDetails {
        let result = self.result;
        MatchDetails {
            radiant_win: result.radiant_win.unwrap_or_default(),
            radiant_name: result.radiant_name,
            dire_name: result.dire_name,
            radiant_score: result.radiant_score,
            dire_score: result.dire_score,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HeroesResponse {
    pub result: HeroesResult,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HeroesResult {
    pub status: i32,
    #[serde(default)]
    pub heroes: Vec<Hero>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Hero {
    pub id: HeroId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub localized_name: String,
}

impl CheckStatus for HeroesResponse {
    fn is_success(&self) -> bool {
        self.result.status == 200
    }
}

impl HeroesResponse {
    pub fn into_catalog(self) -> HeroCatalog {
        self.result
            .heroes
            .into_iter()
            .map(|hero| {
                let name = if hero.localized_name.is_empty() {
                    hero.name
                } else {
                    hero.localized_name
                };
                (hero.id, name)
            })
            .collect()
    }
}

/// Result of a finished match, seen from the winner's side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchOutcome {
    pub game_number: u32,
    pub winner_name: String,
    pub loser_name: String,
    pub winner_score: u32,
    pub loser_score: u32,
}

impl MatchOutcome {
    pub fn from_details(details: &MatchDetails, game_number: u32) -> Self {
        if details.radiant_win {
            Self {
                game_number,
                winner_name: details.radiant_name.clone(),
                loser_name: details.dire_name.clone(),
                winner_score: details.radiant_score,
                loser_score: details.dire_score,
            }
        } else {
            Self {
                game_number,
                winner_name: details.dire_name.clone(),
                loser_name: details.radiant_name.clone(),
                winner_score: details.dire_score,
                loser_score: details.radiant_score,
            }
        }
    }
}
