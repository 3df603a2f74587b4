use clap::Parser;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::steam::DEFAULT_BASE_URL;

const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Parser)]
#[command(version, about = "Posts live Dota 2 league match updates to Discord")]
pub struct Cli {
    /// Path to the TOML config file. Defaults to ./config.toml when present.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Log debug messages.
    #[arg(long)]
    pub debug: bool,

    /// Discord bot token.
    #[arg(long, env = "DISCORD_TOKEN", hide_env_values = true)]
    pub discord_token: Option<String>,

    /// Steam Web API key.
    #[arg(long, env = "STEAM_KEY", hide_env_values = true)]
    pub steam_key: Option<String>,

    /// League to watch.
    #[arg(long, env = "LEAGUE_ID")]
    pub league_id: Option<u32>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("{0} is required")]
    Missing(&'static str),

    #[error("{0}")]
    Invalid(&'static str),
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct DiscordConfig {
    #[serde(default)]
    pub token: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SteamConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub league_id: u32,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Seconds between live polls.
    #[serde(default = "default_poll_interval")]
    pub poll_interval: u64,
    /// Ceiling in seconds for the backoff applied while the API is failing.
    #[serde(default = "default_max_poll_interval")]
    pub max_poll_interval: u64,
    /// Minimum milliseconds between two API requests.
    #[serde(default = "default_request_spacing_ms")]
    pub request_spacing_ms: u64,
    /// Language for hero names, e.g. "en_us". Hero names are omitted when unset.
    #[serde(default)]
    pub hero_language: Option<String>,
}

impl Default for SteamConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            league_id: 0,
            base_url: default_base_url(),
            poll_interval: default_poll_interval(),
            max_poll_interval: default_max_poll_interval(),
            request_spacing_ms: default_request_spacing_ms(),
            hero_language: None,
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_poll_interval() -> u64 {
    60
}

fn default_max_poll_interval() -> u64 {
    15 * 60
}

fn default_request_spacing_ms() -> u64 {
    1000
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub discord: DiscordConfig,
    #[serde(default)]
    pub steam: SteamConfig,
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let config_str = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&config_str)
    }

    pub fn from_toml(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Reads the config file (if any), applies command-line overrides and
    /// checks that everything needed to start is present.
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let mut config = match &cli.config {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_PATH))?
            }
            None => Self::default(),
        };

        config.apply_overrides(cli);
        config.validate()?;
        Ok(config)
    }

    pub fn apply_overrides(&mut self, cli: &Cli) {
        if let Some(token) = &cli.discord_token {
            self.discord.token = token.clone();
        }
        if let Some(key) = &cli.steam_key {
            self.steam.api_key = key.clone();
        }
        if let Some(league_id) = cli.league_id {
            self.steam.league_id = league_id;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.discord.token.trim().is_empty() {
            return Err(ConfigError::Missing("discord token"));
        }
        if self.steam.api_key.trim().is_empty() {
            return Err(ConfigError::Missing("steam api key"));
        }
        if self.steam.league_id == 0 {
            return Err(ConfigError::Missing("league id"));
        }
        if self.steam.poll_interval == 0 {
            return Err(ConfigError::Invalid("poll_interval must be positive"));
        }
        if self.steam.max_poll_interval < self.steam.poll_interval {
            return Err(ConfigError::Invalid(
                "max_poll_interval must not be below poll_interval",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("league-watch").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn full_file_with_defaults() {
        let config = Config::from_toml(
            r#"
            [discord]
            token = "bot-token"

            [steam]
            api_key = "steam-key"
            league_id = 5401
            "#,
        )
        .unwrap();

        config.validate().unwrap();
        assert_eq!(config.steam.poll_interval, 60);
        assert_eq!(config.steam.max_poll_interval, 900);
        assert_eq!(config.steam.request_spacing_ms, 1000);
        assert_eq!(config.steam.base_url, DEFAULT_BASE_URL);
        assert!(config.steam.hero_language.is_none());
    }

    #[test]
    fn missing_values_are_rejected() {
        let config = Config::from_toml("[steam]\napi_key = \"k\"\nleague_id = 1").unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Missing("discord token"))));

        let config = Config::from_toml("[discord]\ntoken = \"t\"\n[steam]\nleague_id = 1").unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Missing("steam api key"))));

        let config =
            Config::from_toml("[discord]\ntoken = \"t\"\n[steam]\napi_key = \"k\"").unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Missing("league id"))));
    }

    #[test]
    fn command_line_overrides_file() {
        let mut config = Config::from_toml(
            "[discord]\ntoken = \"old\"\n[steam]\napi_key = \"old\"\nleague_id = 1",
        )
        .unwrap();

        config.apply_overrides(&cli(&[
            "--discord-token",
            "new-token",
            "--steam-key",
            "new-key",
            "--league-id",
            "5401",
        ]));

        assert_eq!(config.discord.token, "new-token");
        assert_eq!(config.steam.api_key, "new-key");
        assert_eq!(config.steam.league_id, 5401);
    }

    #[test]
    fn backoff_ceiling_must_cover_interval() {
        let config = Config::from_toml(
            r#"
            [discord]
            token = "t"

            [steam]
            api_key = "k"
            league_id = 1
            poll_interval = 120
            max_poll_interval = 60
            "#,
        )
        .unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn unreadable_file_is_read_error() {
        let err = Config::from_file(Path::new("/nonexistent/league-watch.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
