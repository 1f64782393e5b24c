//! Mock game source for testing.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::igdb::{GameSource, IgdbError, IgdbGame, IgdbNamed, TopGamesQuery};

/// A recorded source query for test assertions.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedSourceQuery {
    Genres { ids: Vec<u64> },
    Platforms { ids: Vec<u64> },
    TopGames(TopGamesQuery),
}

/// Mock implementation of the GameSource trait.
///
/// Behaves like IGDB for the queries the importer sends: tag lookups only
/// return the requested ids, and the game query keeps games rated above the
/// threshold, best first, up to the limit.
///
/// # Example
///
/// ```rust,ignore
/// use ludex_core::testing::{MockGameSource, fixtures};
///
/// let source = MockGameSource::new();
/// source.set_genres(vec![fixtures::named(5, "Shooter")]).await;
/// source.set_games(vec![fixtures::igdb_game(1, "Doom", 85.0, &[5], &[])]).await;
/// ```
#[derive(Debug, Default)]
pub struct MockGameSource {
    genres: Arc<RwLock<Vec<IgdbNamed>>>,
    platforms: Arc<RwLock<Vec<IgdbNamed>>>,
    games: Arc<RwLock<Vec<IgdbGame>>>,
    queries: Arc<RwLock<Vec<RecordedSourceQuery>>>,
    /// If set, the next operation will fail with this error.
    next_error: Arc<RwLock<Option<IgdbError>>>,
}

impl MockGameSource {
    /// Create a new empty mock source.
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_genres(&self, genres: Vec<IgdbNamed>) {
        *self.genres.write().await = genres;
    }

    pub async fn set_platforms(&self, platforms: Vec<IgdbNamed>) {
        *self.platforms.write().await = platforms;
    }

    pub async fn set_games(&self, games: Vec<IgdbGame>) {
        *self.games.write().await = games;
    }

    // =========================================================================
    // Query Recording
    // =========================================================================

    /// Get all recorded queries.
    pub async fn recorded_queries(&self) -> Vec<RecordedSourceQuery> {
        self.queries.read().await.clone()
    }

    /// Get only the recorded game queries.
    pub async fn recorded_game_queries(&self) -> Vec<TopGamesQuery> {
        self.queries
            .read()
            .await
            .iter()
            .filter_map(|q| match q {
                RecordedSourceQuery::TopGames(query) => Some(query.clone()),
                _ => None,
            })
            .collect()
    }

    // =========================================================================
    // Error Injection
    // =========================================================================

    /// Configure the next operation to fail with the given error.
    pub async fn set_next_error(&self, error: IgdbError) {
        *self.next_error.write().await = Some(error);
    }

    async fn take_error(&self) -> Option<IgdbError> {
        self.next_error.write().await.take()
    }

    async fn record(&self, query: RecordedSourceQuery) {
        self.queries.write().await.push(query);
    }
}

fn select_by_ids(all: &[IgdbNamed], ids: &[u64]) -> Vec<IgdbNamed> {
    all.iter().filter(|t| ids.contains(&t.id)).cloned().collect()
}

#[async_trait]
impl GameSource for MockGameSource {
    async fn fetch_genres(&self, ids: &[u64]) -> Result<Vec<IgdbNamed>, IgdbError> {
        if let Some(err) = self.take_error().await {
            return Err(err);
        }
        self.record(RecordedSourceQuery::Genres { ids: ids.to_vec() }).await;
        Ok(select_by_ids(&self.genres.read().await, ids))
    }

    async fn fetch_platforms(&self, ids: &[u64]) -> Result<Vec<IgdbNamed>, IgdbError> {
        if let Some(err) = self.take_error().await {
            return Err(err);
        }
        self.record(RecordedSourceQuery::Platforms { ids: ids.to_vec() }).await;
        Ok(select_by_ids(&self.platforms.read().await, ids))
    }

    async fn fetch_top_games(&self, query: &TopGamesQuery) -> Result<Vec<IgdbGame>, IgdbError> {
        if let Some(err) = self.take_error().await {
            return Err(err);
        }
        self.record(RecordedSourceQuery::TopGames(query.clone())).await;

        let mut games: Vec<IgdbGame> = self
            .games
            .read()
            .await
            .iter()
            .filter(|g| g.rating.unwrap_or(0.0) > query.min_rating)
            .cloned()
            .collect();
        games.sort_by(|a, b| {
            b.rating
                .unwrap_or(0.0)
                .total_cmp(&a.rating.unwrap_or(0.0))
        });
        games.truncate(query.limit as usize);
        Ok(games)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;

    #[tokio::test]
    async fn test_fetch_genres_filters_by_id() {
        let source = MockGameSource::new();
        source
            .set_genres(vec![fixtures::named(5, "Shooter"), fixtures::named(12, "RPG")])
            .await;

        let genres = source.fetch_genres(&[12, 99]).await.unwrap();
        assert_eq!(genres, vec![fixtures::named(12, "RPG")]);
    }

    #[tokio::test]
    async fn test_fetch_top_games_applies_query() {
        let source = MockGameSource::new();
        source
            .set_games(vec![
                fixtures::igdb_game(1, "Low", 60.0, &[], &[]),
                fixtures::igdb_game(2, "Mid", 80.0, &[], &[]),
                fixtures::igdb_game(3, "High", 95.0, &[], &[]),
                fixtures::igdb_game(4, "Higher", 97.0, &[], &[]),
            ])
            .await;

        let games = source
            .fetch_top_games(&TopGamesQuery {
                min_rating: 70.0,
                min_rating_count: 0,
                limit: 2,
            })
            .await
            .unwrap();
        let names: Vec<&str> = games.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["Higher", "High"]);
    }

    #[tokio::test]
    async fn test_next_error_is_consumed() {
        let source = MockGameSource::new();
        source.set_next_error(IgdbError::RateLimitExceeded).await;

        assert!(source.fetch_platforms(&[1]).await.is_err());
        assert!(source.fetch_platforms(&[1]).await.is_ok());
        assert_eq!(source.recorded_queries().await.len(), 1);
    }
}
