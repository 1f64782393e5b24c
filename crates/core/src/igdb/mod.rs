//! IGDB integration - the external source of game metadata.
//!
//! IGDB is queried with Apicalypse bodies POSTed to one endpoint per entity
//! (`games`, `genres`, `platforms`).

mod client;
mod types;

pub use client::{IgdbClient, TopGamesQuery};
pub use types::*;

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur when talking to IGDB.
#[derive(Debug, Error)]
pub enum IgdbError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Rate limit exceeded.
    #[error("Rate limit exceeded, please wait before retrying")]
    RateLimitExceeded,

    /// API returned an error.
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Client not configured (missing or rejected credentials).
    #[error("Client not configured: {0}")]
    NotConfigured(String),
}

/// A source of game metadata.
#[async_trait]
pub trait GameSource: Send + Sync {
    /// Fetch genres by IGDB id.
    async fn fetch_genres(&self, ids: &[u64]) -> Result<Vec<IgdbNamed>, IgdbError>;

    /// Fetch platforms by IGDB id.
    async fn fetch_platforms(&self, ids: &[u64]) -> Result<Vec<IgdbNamed>, IgdbError>;

    /// Fetch the best rated games matching the query.
    async fn fetch_top_games(&self, query: &TopGamesQuery) -> Result<Vec<IgdbGame>, IgdbError>;
}
