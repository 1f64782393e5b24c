//! One-shot import of popular games from IGDB into the library.
//!
//! Tags are upserted first so their IGDB ids can be mapped to names; games
//! are then created one by one. A game that is already in the library is
//! skipped, a game that fails for any other reason is logged and the batch
//! moves on.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::config::ImportConfig;
use crate::igdb::{GameSource, IgdbError, IgdbGame, IgdbNamed, TopGamesQuery};
use crate::library::{GameInput, GameLibrary, LibraryError, TagKind};
use crate::metrics::IMPORTED_GAMES;

/// Errors that abort an import run.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("IGDB request failed: {0}")]
    Source(#[from] IgdbError),

    #[error("Library error: {0}")]
    Library(#[from] LibraryError),
}

/// Outcome of an import run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportReport {
    /// Genres upserted.
    pub genres: usize,
    /// Platforms upserted.
    pub platforms: usize,
    /// Games created.
    pub created: usize,
    /// Games already in the library.
    pub skipped: usize,
    /// Games that could not be stored.
    pub failed: usize,
}

/// Imports games from a [`GameSource`] into a [`GameLibrary`].
pub struct Importer {
    source: Arc<dyn GameSource>,
    library: Arc<dyn GameLibrary>,
    config: ImportConfig,
}

impl Importer {
    pub fn new(
        source: Arc<dyn GameSource>,
        library: Arc<dyn GameLibrary>,
        config: ImportConfig,
    ) -> Self {
        Self {
            source,
            library,
            config,
        }
    }

    /// Run the import.
    pub async fn run(&self) -> Result<ImportReport, ImportError> {
        let mut report = ImportReport::default();

        info!("Fetching {} genres", self.config.genre_ids.len());
        let genres = self.source.fetch_genres(&self.config.genre_ids).await?;
        let genre_names = self.upsert_tags(TagKind::Genre, &genres)?;
        report.genres = genre_names.len();
        info!("{} genres stored", report.genres);

        info!("Fetching {} platforms", self.config.platform_ids.len());
        let platforms = self
            .source
            .fetch_platforms(&self.config.platform_ids)
            .await?;
        let platform_names = self.upsert_tags(TagKind::Platform, &platforms)?;
        report.platforms = platform_names.len();
        info!("{} platforms stored", report.platforms);

        let query = TopGamesQuery::from(&self.config);
        info!(
            "Fetching up to {} games rated above {}",
            query.limit, query.min_rating
        );
        let games = self.source.fetch_top_games(&query).await?;

        info!("Storing {} games", games.len());
        for game in &games {
            let input = self.to_input(game, &genre_names, &platform_names);
            match self.library.create(&input) {
                Ok(created) => {
                    report.created += 1;
                    IMPORTED_GAMES.with_label_values(&["created"]).inc();
                    info!("Imported {} (id {})", created.name, created.id);
                }
                Err(LibraryError::AlreadyExists(_)) => {
                    report.skipped += 1;
                    IMPORTED_GAMES.with_label_values(&["skipped"]).inc();
                    info!("Skipped {} (already exists)", game.name);
                }
                Err(e) => {
                    report.failed += 1;
                    IMPORTED_GAMES.with_label_values(&["failed"]).inc();
                    error!("Failed to import {}: {}", game.name, e);
                }
            }
        }

        info!(
            "Import finished: {} genres, {} platforms, {} games created, {} skipped, {} failed",
            report.genres, report.platforms, report.created, report.skipped, report.failed
        );
        Ok(report)
    }

    /// Upsert tags by name, returning IGDB id -> stored name.
    fn upsert_tags(
        &self,
        kind: TagKind,
        tags: &[IgdbNamed],
    ) -> Result<HashMap<u64, String>, ImportError> {
        let mut names = HashMap::with_capacity(tags.len());
        for tag in tags {
            let stored = self.library.upsert_tag(kind, &tag.name)?;
            names.insert(tag.id, stored.name);
        }
        Ok(names)
    }

    fn to_input(
        &self,
        game: &IgdbGame,
        genre_names: &HashMap<u64, String>,
        platform_names: &HashMap<u64, String>,
    ) -> GameInput {
        let genres = map_tag_ids(
            &game.genres,
            self.config.max_genres_per_game,
            genre_names,
        );
        let platforms = map_tag_ids(
            &game.platforms,
            self.config.max_platforms_per_game,
            platform_names,
        );

        let unmapped = game.genres.len().min(self.config.max_genres_per_game) - genres.len();
        if unmapped > 0 {
            warn!(
                "{}: {} genre(s) outside the imported set were dropped",
                game.name, unmapped
            );
        }

        GameInput {
            igdb_id: game.id as i64,
            name: game.name.clone(),
            rating: game.rating(),
            release_date: game.release_date(),
            cover_url: game.cover_url(),
            genres,
            platforms,
        }
    }
}

/// Take the first `max` ids and keep the ones that map to a stored tag.
fn map_tag_ids(ids: &[u64], max: usize, names: &HashMap<u64, String>) -> Vec<String> {
    ids.iter()
        .take(max)
        .filter_map(|id| names.get(id).cloned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::SqliteLibrary;
    use crate::testing::{fixtures, MockGameSource, RecordedSourceQuery};

    fn small_config() -> ImportConfig {
        ImportConfig {
            genre_ids: vec![5, 12, 31],
            platform_ids: vec![6, 48],
            max_genres_per_game: 2,
            max_platforms_per_game: 1,
            ..Default::default()
        }
    }

    async fn seeded_source() -> Arc<MockGameSource> {
        let source = Arc::new(MockGameSource::new());
        source
            .set_genres(vec![
                fixtures::named(5, "Shooter"),
                fixtures::named(12, "Role-playing (RPG)"),
                fixtures::named(31, "Adventure"),
            ])
            .await;
        source
            .set_platforms(vec![
                fixtures::named(6, "PC (Microsoft Windows)"),
                fixtures::named(48, "PlayStation 4"),
            ])
            .await;
        source
    }

    #[tokio::test]
    async fn test_import_creates_games_with_mapped_tags() {
        let source = seeded_source().await;
        source
            .set_games(vec![
                fixtures::igdb_game(1942, "The Witcher 3", 93.4, &[12, 31, 5], &[6, 48]),
                fixtures::igdb_game(472, "Skyrim", 88.0, &[12, 999], &[48]),
            ])
            .await;
        let library = Arc::new(SqliteLibrary::in_memory().unwrap());

        let importer = Importer::new(source.clone(), library.clone(), small_config());
        let report = importer.run().await.unwrap();

        assert_eq!(
            report,
            ImportReport {
                genres: 3,
                platforms: 2,
                created: 2,
                skipped: 0,
                failed: 0,
            }
        );

        let games = library.list().unwrap();
        let witcher = games.iter().find(|g| g.igdb_id == 1942).unwrap();
        // Only the first two genres and the first platform are kept
        let genres: Vec<&str> = witcher.genres.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(genres, vec!["Role-playing (RPG)", "Adventure"]);
        assert_eq!(witcher.platforms.len(), 1);
        assert_eq!(witcher.platforms[0].name, "PC (Microsoft Windows)");
        assert!(witcher
            .cover_url
            .as_deref()
            .unwrap()
            .starts_with("https://images.igdb.com"));

        // Unknown genre id 999 is ignored
        let skyrim = games.iter().find(|g| g.igdb_id == 472).unwrap();
        assert_eq!(skyrim.genres.len(), 1);
    }

    #[tokio::test]
    async fn test_import_twice_skips_existing() {
        let source = seeded_source().await;
        source
            .set_games(vec![fixtures::igdb_game(1942, "The Witcher 3", 93.4, &[12], &[6])])
            .await;
        let library = Arc::new(SqliteLibrary::in_memory().unwrap());
        let importer = Importer::new(source, library.clone(), small_config());

        let first = importer.run().await.unwrap();
        assert_eq!(first.created, 1);

        let second = importer.run().await.unwrap();
        assert_eq!(second.created, 0);
        assert_eq!(second.skipped, 1);
        // Tags are upserted, not duplicated
        assert_eq!(second.genres, 3);
        assert_eq!(library.tags(TagKind::Genre).unwrap().len(), 3);
        assert_eq!(library.list().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_import_counts_invalid_games_as_failed() {
        let source = seeded_source().await;
        source
            .set_games(vec![
                fixtures::igdb_game(1, "   ", 80.0, &[], &[]),
                fixtures::igdb_game(2, "Valid", 80.0, &[], &[]),
            ])
            .await;
        let library = Arc::new(SqliteLibrary::in_memory().unwrap());

        let report = Importer::new(source, library, small_config())
            .run()
            .await
            .unwrap();
        assert_eq!(report.failed, 1);
        assert_eq!(report.created, 1);
    }

    #[tokio::test]
    async fn test_import_aborts_on_source_error() {
        let source = seeded_source().await;
        source.set_next_error(IgdbError::RateLimitExceeded).await;
        let library = Arc::new(SqliteLibrary::in_memory().unwrap());

        let result = Importer::new(source, library.clone(), small_config())
            .run()
            .await;
        assert!(matches!(
            result,
            Err(ImportError::Source(IgdbError::RateLimitExceeded))
        ));
        assert!(library.tags(TagKind::Genre).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_import_passes_query_settings() {
        let source = seeded_source().await;
        let library = Arc::new(SqliteLibrary::in_memory().unwrap());
        let config = ImportConfig {
            game_limit: 7,
            min_rating: 85.0,
            ..small_config()
        };

        Importer::new(source.clone(), library, config)
            .run()
            .await
            .unwrap();

        let recorded = source.recorded_queries().await;
        assert_eq!(
            recorded[..2],
            [
                RecordedSourceQuery::Genres { ids: vec![5, 12, 31] },
                RecordedSourceQuery::Platforms { ids: vec![6, 48] },
            ]
        );

        let queries = source.recorded_game_queries().await;
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0].limit, 7);
        assert_eq!(queries[0].min_rating, 85.0);
    }

    #[test]
    fn test_map_tag_ids_respects_max_before_mapping() {
        let names: HashMap<u64, String> =
            [(1, "A".to_string()), (3, "C".to_string())].into_iter().collect();
        // 2 is unknown but still consumes a slot
        assert_eq!(map_tag_ids(&[2, 1, 3], 2, &names), vec!["A"]);
    }
}
