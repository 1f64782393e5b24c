//! IGDB API client.
//!
//! IGDB authenticates through Twitch: every request carries the application's
//! client id and an app access token.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::types::{IgdbGame, IgdbNamed};
use super::{GameSource, IgdbError};
use crate::config::{IgdbConfig, ImportConfig};
use crate::metrics::{IGDB_REQUESTS, IGDB_REQUEST_DURATION};

/// Selection of the best rated games.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopGamesQuery {
    /// Keep games rated strictly above this.
    pub min_rating: f64,
    /// Keep games with strictly more ratings than this.
    pub min_rating_count: u32,
    pub limit: u32,
}

impl TopGamesQuery {
    /// Apicalypse body for the `games` endpoint.
    pub fn to_body(&self) -> String {
        format!(
            "fields name, rating, first_release_date, cover.url, genres, platforms; \
             where rating > {} & rating_count > {}; \
             sort rating desc; \
             limit {};",
            self.min_rating, self.min_rating_count, self.limit
        )
    }
}

impl From<&ImportConfig> for TopGamesQuery {
    fn from(config: &ImportConfig) -> Self {
        Self {
            min_rating: config.min_rating,
            min_rating_count: config.min_rating_count,
            limit: config.game_limit,
        }
    }
}

/// Apicalypse body selecting id/name entities by id.
fn named_by_ids_body(ids: &[u64]) -> String {
    let list = ids
        .iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(",");
    format!("fields id, name; where id = ({}); limit {};", list, ids.len())
}

/// IGDB API client.
pub struct IgdbClient {
    client: Client,
    base_url: String,
    client_id: String,
    access_token: String,
}

impl IgdbClient {
    /// Create a new IGDB client.
    pub fn new(config: IgdbConfig) -> Result<Self, IgdbError> {
        if config.client_id.is_empty() || config.access_token.is_empty() {
            return Err(IgdbError::NotConfigured(
                "IGDB client id and access token are required".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client_id: config.client_id,
            access_token: config.access_token,
        })
    }

    /// POST an Apicalypse query to an endpoint and decode the JSON array reply.
    async fn query<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: String,
    ) -> Result<Vec<T>, IgdbError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        debug!("IGDB query: endpoint={}, body='{}'", endpoint, body);

        let start = Instant::now();
        let result = self.send(&url, body).await;
        IGDB_REQUEST_DURATION
            .with_label_values(&[endpoint])
            .observe(start.elapsed().as_secs_f64());

        let outcome = match &result {
            Ok(_) => "success",
            Err(IgdbError::RateLimitExceeded) => "rate_limited",
            Err(_) => "error",
        };
        IGDB_REQUESTS.with_label_values(&[endpoint, outcome]).inc();

        let response = result?;
        response.json::<Vec<T>>().await.map_err(|e| {
            IgdbError::ParseError(format!("Failed to parse {} response: {}", endpoint, e))
        })
    }

    async fn send(&self, url: &str, body: String) -> Result<reqwest::Response, IgdbError> {
        let response = self
            .client
            .post(url)
            .header("Client-ID", &self.client_id)
            .header(AUTHORIZATION, format!("Bearer {}", self.access_token))
            .header(ACCEPT, "application/json")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if status == 401 || status == 403 {
            return Err(IgdbError::NotConfigured(
                "IGDB rejected the client id or access token".to_string(),
            ));
        }
        if status == 429 {
            return Err(IgdbError::RateLimitExceeded);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(IgdbError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        Ok(response)
    }
}

#[async_trait]
impl GameSource for IgdbClient {
    async fn fetch_genres(&self, ids: &[u64]) -> Result<Vec<IgdbNamed>, IgdbError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.query("genres", named_by_ids_body(ids)).await
    }

    async fn fetch_platforms(&self, ids: &[u64]) -> Result<Vec<IgdbNamed>, IgdbError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.query("platforms", named_by_ids_body(ids)).await
    }

    async fn fetch_top_games(&self, query: &TopGamesQuery) -> Result<Vec<IgdbGame>, IgdbError> {
        self.query("games", query.to_body()).await
    }
}
