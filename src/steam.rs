use anyhow::Result;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tokio::sync::AcquireError;
use tokio::time::Duration;

use crate::log;
use crate::models::{
    CheckStatus, HeroCatalog, HeroesResponse, LiveLeagueGame, LiveLeagueGamesResponse,
    MatchDetails, MatchDetailsResponse, MatchHistoryResponse, MatchId,
};
use crate::ratelimit::RateLimiter;
use crate::shutdown::Shutdown;

pub const DEFAULT_BASE_URL: &str = "http://api.steampowered.com";

const PATH_LIVE_LEAGUE_GAMES: &str = "/IDOTA2Match_570/GetLiveLeagueGames/v1/";
const PATH_MATCH_HISTORY: &str = "/IDOTA2Match_570/GetMatchHistory/v1/";
const PATH_MATCH_DETAILS: &str = "/IDOTA2Match_570/GetMatchDetails/v1/";
const PATH_HEROES: &str = "/IEconDOTA2_570/GetHeroes/v1/";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request cancelled")]
    Cancelled,

    #[error("rate limiter unavailable: {0}")]
    RateLimit(#[from] AcquireError),

    #[error("error sending request: {0}")]
    Request(#[from] reqwest::Error),

    #[error("bad HTTP response status code: {0}")]
    HttpStatus(StatusCode),

    #[error("error decoding {endpoint} response: {source}")]
    Decode {
        endpoint: &'static str,
        source: serde_json::Error,
    },

    #[error("bad steam result from {endpoint}")]
    BadResult { endpoint: &'static str },
}

impl ApiError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ApiError::Cancelled)
    }
}

pub struct SteamClient {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
    limiter: RateLimiter,
    shutdown: Shutdown,
}

impl SteamClient {
    pub fn new(
        base_url: String,
        api_key: String,
        spacing: Duration,
        shutdown: Shutdown,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self::with_http_client(client, base_url, api_key, spacing, shutdown))
    }

    pub fn with_http_client(
        client: reqwest::Client,
        base_url: String,
        api_key: String,
        spacing: Duration,
        shutdown: Shutdown,
    ) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            client,
            limiter: RateLimiter::new(spacing),
            shutdown,
        }
    }

    pub async fn get_live_league_games(
        &self,
        league_id: u32,
    ) -> Result<Vec<LiveLeagueGame>, ApiError> {
        let res: LiveLeagueGamesResponse = self
            .get_json(
                "GetLiveLeagueGames",
                PATH_LIVE_LEAGUE_GAMES,
                &[("league_id", league_id.to_string())],
            )
            .await?;
        Ok(res.result.games)
    }

    pub async fn get_match_history(&self, league_id: u32) -> Result<Vec<MatchId>, ApiError> {
        let res: MatchHistoryResponse = self
            .get_json(
                "GetMatchHistory",
                PATH_MATCH_HISTORY,
                &[("league_id", league_id.to_string())],
            )
            .await?;
        Ok(res.result.matches.into_iter().map(|m| m.match_id).collect())
    }

    pub async fn get_match_details(&self, match_id: MatchId) -> Result<MatchDetails, ApiError> {
        let res: MatchDetailsResponse = self
            .get_json(
                "GetMatchDetails",
                PATH_MATCH_DETAILS,
                &[("match_id", match_id.to_string())],
            )
            .await?;
        Ok(res.into_details())
    }

    pub async fn get_heroes(&self, language: &str) -> Result<HeroCatalog, ApiError> {
        let res: HeroesResponse = self
            .get_json("GetHeroes", PATH_HEROES, &[("language", language.to_string())])
            .await?;
        Ok(res.into_catalog())
    }

    async fn get_json<T>(
        &self,
        endpoint: &'static str,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned + CheckStatus,
    {
        if self.shutdown.is_cancelled() {
            return Err(ApiError::Cancelled);
        }

        tokio::select! {
            biased;
            _ = self.shutdown.cancelled() => Err(ApiError::Cancelled),
            res = self.fetch(endpoint, path, params) => res,
        }
    }

    async fn fetch<T>(
        &self,
        endpoint: &'static str,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned + CheckStatus,
    {
        let _permit = self.limiter.acquire().await?;

        let url = format!("{}{}", self.base_url, path);
        let res = self
            .client
            .get(&url)
            .query(&[("key", self.api_key.as_str())])
            .query(params)
            .send()
            .await?;

        let status = res.status();
        log::debug(format!("GET: {} - [{}]", path, status));
        if status != StatusCode::OK {
            return Err(ApiError::HttpStatus(status));
        }

        let body = res.bytes().await?;
        decode(endpoint, &body)
    }
}

/// Decodes a response body and applies the response kind's success check.
pub fn decode<T>(endpoint: &'static str, body: &[u8]) -> Result<T, ApiError>
where
    T: DeserializeOwned + CheckStatus,
{
    let data: T =
        serde_json::from_slice(body).map_err(|source| ApiError::Decode { endpoint, source })?;

    if !data.is_success() {
        return Err(ApiError::BadResult { endpoint });
    }
    Ok(data)
}
