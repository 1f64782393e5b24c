//! Testing utilities and mock implementations.
//!
//! This module provides a mock [`GameSource`](crate::igdb::GameSource) and
//! fixtures so the importer and the HTTP API can be tested without IGDB.
//!
//! # Example
//!
//! ```rust,ignore
//! use ludex_core::testing::{fixtures, MockGameSource};
//!
//! let source = MockGameSource::new();
//! source.set_games(vec![fixtures::igdb_game(1942, "The Witcher 3", 93.4, &[12], &[6])]).await;
//! ```

mod mock_game_source;

pub use mock_game_source::{MockGameSource, RecordedSourceQuery};

/// Test fixtures and helper functions.
pub mod fixtures {
    use chrono::{TimeZone, Utc};

    use crate::igdb::{IgdbCover, IgdbGame, IgdbNamed};
    use crate::library::{Game, GameInput, Tag};

    /// An IGDB genre or platform.
    pub fn named(id: u64, name: &str) -> IgdbNamed {
        IgdbNamed {
            id,
            name: name.to_string(),
        }
    }

    /// An IGDB game with a thumbnail cover and a fixed release date.
    pub fn igdb_game(
        id: u64,
        name: &str,
        rating: f64,
        genres: &[u64],
        platforms: &[u64],
    ) -> IgdbGame {
        IgdbGame {
            id,
            name: name.to_string(),
            rating: Some(rating),
            first_release_date: Some(1_431_993_600), // 2015-05-19
            cover: Some(IgdbCover {
                url: Some(format!(
                    "//images.igdb.com/igdb/image/upload/t_thumb/co{}.jpg",
                    id
                )),
            }),
            genres: genres.to_vec(),
            platforms: platforms.to_vec(),
        }
    }

    /// A create/update payload with tags and a release date.
    pub fn game_input(igdb_id: i64, name: &str, rating: Option<f64>) -> GameInput {
        let mut input = GameInput::new(igdb_id, name)
            .with_release_date(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap())
            .with_genres(["Adventure"])
            .with_platforms(["PC (Microsoft Windows)"]);
        input.rating = rating;
        input
    }

    /// An in-memory game for view and stats tests.
    ///
    /// `year` sets the release date to January 1st of that year.
    pub fn game(
        id: i64,
        name: &str,
        rating: Option<f64>,
        year: Option<i32>,
        genres: &[&str],
        platforms: &[&str],
    ) -> Game {
        let tags = |names: &[&str], offset: i64| -> Vec<Tag> {
            names
                .iter()
                .enumerate()
                .map(|(i, n)| Tag {
                    id: offset + i as i64,
                    name: n.to_string(),
                })
                .collect()
        };

        Game {
            id,
            igdb_id: 1000 + id,
            name: name.to_string(),
            rating,
            release_date: year.and_then(|y| Utc.with_ymd_and_hms(y, 1, 1, 0, 0, 0).single()),
            cover_url: None,
            genres: tags(genres, 1),
            platforms: tags(platforms, 100),
        }
    }
}
