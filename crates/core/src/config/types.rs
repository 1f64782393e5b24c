use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    /// IGDB credentials, only needed by the import binary
    #[serde(default)]
    pub igdb: Option<IgdbConfig>,
    #[serde(default)]
    pub import: ImportConfig,
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
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    8080
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
    PathBuf::from("ludex.db")
}

/// IGDB API configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IgdbConfig {
    /// Twitch application client id
    pub client_id: String,
    /// OAuth app access token
    pub access_token: String,
    /// API base URL (default: "https://api.igdb.com/v4")
    #[serde(default = "default_igdb_base_url")]
    pub base_url: String,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

fn default_igdb_base_url() -> String {
    "https://api.igdb.com/v4".to_string()
}

fn default_timeout() -> u32 {
    30
}

/// Import (seed) configuration.
///
/// The default id lists are a curated set of popular IGDB genres and
/// platforms.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ImportConfig {
    #[serde(default = "default_genre_ids")]
    pub genre_ids: Vec<u64>,
    #[serde(default = "default_platform_ids")]
    pub platform_ids: Vec<u64>,
    /// Only games rated strictly above this are imported
    #[serde(default = "default_min_rating")]
    pub min_rating: f64,
    /// Only games with strictly more ratings than this are imported
    #[serde(default = "default_min_rating_count")]
    pub min_rating_count: u32,
    #[serde(default = "default_game_limit")]
    pub game_limit: u32,
    #[serde(default = "default_max_genres")]
    pub max_genres_per_game: usize,
    #[serde(default = "default_max_platforms")]
    pub max_platforms_per_game: usize,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            genre_ids: default_genre_ids(),
            platform_ids: default_platform_ids(),
            min_rating: default_min_rating(),
            min_rating_count: default_min_rating_count(),
            game_limit: default_game_limit(),
            max_genres_per_game: default_max_genres(),
            max_platforms_per_game: default_max_platforms(),
        }
    }
}

fn default_genre_ids() -> Vec<u64> {
    vec![5, 12, 31, 32, 33, 15, 16, 4, 10, 14]
}

fn default_platform_ids() -> Vec<u64> {
    vec![6, 48, 49, 167, 169, 130, 14, 41, 46, 38]
}

fn default_min_rating() -> f64 {
    70.0
}

fn default_min_rating_count() -> u32 {
    100
}

fn default_game_limit() -> u32 {
    50
}

fn default_max_genres() -> usize {
    3
}

fn default_max_platforms() -> usize {
    5
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub igdb: Option<SanitizedIgdbConfig>,
    pub import: ImportConfig,
}

/// Sanitized IGDB config (access token hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedIgdbConfig {
    pub base_url: String,
    pub client_id_configured: bool,
    pub access_token_configured: bool,
    pub timeout_secs: u32,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            database: config.database.clone(),
            igdb: config.igdb.as_ref().map(|i| SanitizedIgdbConfig {
                base_url: i.base_url.clone(),
                client_id_configured: !i.client_id.is_empty(),
                access_token_configured: !i.access_token.is_empty(),
                timeout_secs: i.timeout_secs,
            }),
            import: config.import.clone(),
        }
    }
}
