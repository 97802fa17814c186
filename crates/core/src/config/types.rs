use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

use crate::decide::MatchMode;
use crate::model::Searchee;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub auth: AuthConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Directory holding the torrent cache and other app state.
    #[serde(default = "default_app_dir")]
    pub app_dir: PathBuf,
    #[serde(default)]
    pub matching: MatchingConfig,
    #[serde(default)]
    pub jobs: JobsConfig,
    /// Substrings that block a release by searchee title or torrent name.
    #[serde(default)]
    pub block_list: Vec<String>,
    /// Snatch HTTP timeout.
    #[serde(default = "default_snatch_timeout_secs")]
    pub snatch_timeout_secs: u64,
}

fn default_app_dir() -> PathBuf {
    PathBuf::from(".reseed")
}

fn default_snatch_timeout_secs() -> u64 {
    30
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    "0.0.0.0".parse().unwrap()
}

fn default_port() -> u16 {
    2468
}

/// Authentication configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    pub method: AuthMethod,
    /// API key for the api_key auth method.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    /// No authentication - all requests allowed
    None,
    /// API key authentication - requires X-Api-Key header
    ApiKey,
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("reseed.db")
}

/// Matching thresholds for the decision engine.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MatchingConfig {
    #[serde(default = "default_match_mode")]
    pub match_mode: MatchMode,
    /// Allowed relative deviation of a candidate's advertised size.
    #[serde(default = "default_fuzzy_size_factor")]
    pub fuzzy_size_factor: f64,
    /// Minimum aligned-piece coverage for a partial match.
    #[serde(default = "default_min_size_ratio")]
    pub min_size_ratio: f64,
    /// Allow single-episode candidates against season-pack searchees.
    #[serde(default)]
    pub include_single_episodes: bool,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            match_mode: default_match_mode(),
            fuzzy_size_factor: default_fuzzy_size_factor(),
            min_size_ratio: default_min_size_ratio(),
            include_single_episodes: false,
        }
    }
}

impl MatchingConfig {
    /// The fuzzy-size tolerance applied to a given searchee.
    pub fn fuzzy_size_factor(&self, _searchee: &Searchee) -> f64 {
        self.fuzzy_size_factor
    }

    /// The partial-match coverage threshold applied to a given searchee.
    pub fn min_size_ratio(&self, _searchee: &Searchee) -> f64 {
        self.min_size_ratio
    }
}

fn default_match_mode() -> MatchMode {
    MatchMode::Flexible
}

fn default_fuzzy_size_factor() -> f64 {
    0.02
}

fn default_min_size_ratio() -> f64 {
    0.7
}

/// What to do with a matched candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Save the matched torrent file only.
    Save,
    /// Inject the matched torrent into a client.
    Inject,
}

/// Scheduler cadences and modes.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JobsConfig {
    /// RSS scan interval in milliseconds; zero disables the job.
    #[serde(default)]
    pub rss_cadence_ms: u64,
    /// Bulk search interval in milliseconds; zero disables the job.
    #[serde(default)]
    pub search_cadence_ms: u64,
    #[serde(default = "default_action")]
    pub action: Action,
    /// Source searchees from connected clients; enables collision recheck.
    #[serde(default)]
    pub use_client_torrents: bool,
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            rss_cadence_ms: 0,
            search_cadence_ms: 0,
            action: default_action(),
            use_client_torrents: false,
        }
    }
}

fn default_action() -> Action {
    Action::Save
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matching_defaults() {
        let m = MatchingConfig::default();
        assert_eq!(m.match_mode, MatchMode::Flexible);
        assert!((m.fuzzy_size_factor - 0.02).abs() < f64::EPSILON);
        assert!((m.min_size_ratio - 0.7).abs() < f64::EPSILON);
        assert!(!m.include_single_episodes);
    }

    #[test]
    fn test_jobs_defaults_disable_operator_jobs() {
        let j = JobsConfig::default();
        assert_eq!(j.rss_cadence_ms, 0);
        assert_eq!(j.search_cadence_ms, 0);
        assert_eq!(j.action, Action::Save);
        assert!(!j.use_client_torrents);
    }

    #[test]
    fn test_action_serde() {
        assert_eq!(serde_json::to_string(&Action::Inject).unwrap(), "\"inject\"");
    }
}
