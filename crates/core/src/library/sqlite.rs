//! SQLite-backed game library implementation.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use super::types::format_release_date;
use super::{Game, GameInput, GameLibrary, LibraryError, LibraryStats, Tag, TagKind};

/// SQLite-backed game library.
pub struct SqliteLibrary {
    conn: Mutex<Connection>,
}

impl SqliteLibrary {
    /// Open (or create) the library database at `path`.
    pub fn new(path: &Path) -> Result<Self, LibraryError> {
        let conn = Connection::open(path).map_err(db_err)?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory library (useful for testing).
    pub fn in_memory() -> Result<Self, LibraryError> {
        let conn = Connection::open_in_memory().map_err(db_err)?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), LibraryError> {
        conn.execute_batch(
            r#"
            PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS games (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                igdb_id INTEGER NOT NULL UNIQUE,
                name TEXT NOT NULL,
                rating REAL,
                release_date TEXT,
                cover_url TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_games_rating ON games(rating);

            CREATE TABLE IF NOT EXISTS genres (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE
            );

            CREATE TABLE IF NOT EXISTS platforms (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE
            );

            CREATE TABLE IF NOT EXISTS game_genres (
                game_id INTEGER NOT NULL REFERENCES games(id) ON DELETE CASCADE,
                genre_id INTEGER NOT NULL REFERENCES genres(id) ON DELETE CASCADE,
                PRIMARY KEY (game_id, genre_id)
            );

            CREATE INDEX IF NOT EXISTS idx_game_genres_genre ON game_genres(genre_id);

            CREATE TABLE IF NOT EXISTS game_platforms (
                game_id INTEGER NOT NULL REFERENCES games(id) ON DELETE CASCADE,
                platform_id INTEGER NOT NULL REFERENCES platforms(id) ON DELETE CASCADE,
                PRIMARY KEY (game_id, platform_id)
            );

            CREATE INDEX IF NOT EXISTS idx_game_platforms_platform ON game_platforms(platform_id);
            "#,
        )
        .map_err(db_err)?;

        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, LibraryError> {
        self.conn
            .lock()
            .map_err(|_| LibraryError::Internal("library connection lock poisoned".to_string()))
    }

    /// Convert a row to a Game (without tags).
    fn row_to_game(row: &rusqlite::Row) -> rusqlite::Result<Game> {
        let release_date: Option<String> = row.get(4)?;
        let release_date = release_date
            .map(|s| DateTime::parse_from_rfc3339(&s))
            .transpose()
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    4,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })?
            .map(|dt| dt.with_timezone(&Utc));

        Ok(Game {
            id: row.get(0)?,
            igdb_id: row.get(1)?,
            name: row.get(2)?,
            rating: row.get(3)?,
            release_date,
            cover_url: row.get(5)?,
            genres: Vec::new(),    // Loaded separately
            platforms: Vec::new(), // Loaded separately
        })
    }

    /// Load the tags of one kind for a single game, in link order.
    fn load_tags(conn: &Connection, kind: TagKind, game_id: i64) -> Result<Vec<Tag>, LibraryError> {
        let sql = format!(
            "SELECT t.id, t.name FROM {join} j
             JOIN {table} t ON t.id = j.{column}
             WHERE j.game_id = ?
             ORDER BY j.rowid",
            join = kind.join_table(),
            table = kind.table(),
            column = kind.join_column(),
        );
        let mut stmt = conn.prepare(&sql).map_err(db_err)?;
        let rows = stmt
            .query_map(params![game_id], |row| {
                Ok(Tag {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })
            .map_err(db_err)?;

        let mut tags = Vec::new();
        for row in rows {
            tags.push(row.map_err(db_err)?);
        }
        Ok(tags)
    }

    /// Load the tags of one kind for every game, keyed by game id.
    fn load_all_tags(
        conn: &Connection,
        kind: TagKind,
    ) -> Result<HashMap<i64, Vec<Tag>>, LibraryError> {
        let sql = format!(
            "SELECT j.game_id, t.id, t.name FROM {join} j
             JOIN {table} t ON t.id = j.{column}
             ORDER BY j.game_id, j.rowid",
            join = kind.join_table(),
            table = kind.table(),
            column = kind.join_column(),
        );
        let mut stmt = conn.prepare(&sql).map_err(db_err)?;
        let rows = stmt
            .query_map([], |row| {
                let game_id: i64 = row.get(0)?;
                Ok((
                    game_id,
                    Tag {
                        id: row.get(1)?,
                        name: row.get(2)?,
                    },
                ))
            })
            .map_err(db_err)?;

        let mut by_game: HashMap<i64, Vec<Tag>> = HashMap::new();
        for row in rows {
            let (game_id, tag) = row.map_err(db_err)?;
            by_game.entry(game_id).or_default().push(tag);
        }
        Ok(by_game)
    }

    fn load_game(conn: &Connection, id: i64) -> Result<Game, LibraryError> {
        let mut game = conn
            .query_row(
                "SELECT id, igdb_id, name, rating, release_date, cover_url
                 FROM games WHERE id = ?",
                params![id],
                Self::row_to_game,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => {
                    LibraryError::NotFound(format!("game {}", id))
                }
                _ => db_err(e),
            })?;

        game.genres = Self::load_tags(conn, TagKind::Genre, id)?;
        game.platforms = Self::load_tags(conn, TagKind::Platform, id)?;
        Ok(game)
    }

    fn game_exists(conn: &Connection, id: i64) -> Result<bool, LibraryError> {
        let found = conn
            .query_row("SELECT 1 FROM games WHERE id = ?", params![id], |_| Ok(()))
            .optional()
            .map_err(db_err)?;
        Ok(found.is_some())
    }

    /// Insert a tag if missing and return it.
    fn ensure_tag(conn: &Connection, kind: TagKind, name: &str) -> Result<Tag, LibraryError> {
        conn.execute(
            &format!(
                "INSERT INTO {} (name) VALUES (?) ON CONFLICT(name) DO NOTHING",
                kind.table()
            ),
            params![name],
        )
        .map_err(db_err)?;

        conn.query_row(
            &format!("SELECT id, name FROM {} WHERE name = ?", kind.table()),
            params![name],
            |row| {
                Ok(Tag {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            },
        )
        .map_err(db_err)
    }

    /// Link a game to the named tags, creating missing tags.
    fn link_tags(
        conn: &Connection,
        kind: TagKind,
        game_id: i64,
        names: &[String],
    ) -> Result<(), LibraryError> {
        let sql = format!(
            "INSERT OR IGNORE INTO {} (game_id, {}) VALUES (?, ?)",
            kind.join_table(),
            kind.join_column()
        );
        for name in names {
            let tag = Self::ensure_tag(conn, kind, name)?;
            conn.execute(&sql, params![game_id, tag.id]).map_err(db_err)?;
        }
        Ok(())
    }

    fn unlink_tags(conn: &Connection, kind: TagKind, game_id: i64) -> Result<(), LibraryError> {
        conn.execute(
            &format!("DELETE FROM {} WHERE game_id = ?", kind.join_table()),
            params![game_id],
        )
        .map_err(db_err)?;
        Ok(())
    }

    fn count(conn: &Connection, table: &str) -> Result<u64, LibraryError> {
        let n: i64 = conn
            .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
                row.get(0)
            })
            .map_err(db_err)?;
        Ok(n as u64)
    }
}

impl GameLibrary for SqliteLibrary {
    fn list(&self) -> Result<Vec<Game>, LibraryError> {
        let conn = self.conn()?;

        let mut stmt = conn
            .prepare(
                "SELECT id, igdb_id, name, rating, release_date, cover_url
                 FROM games
                 ORDER BY rating IS NULL, rating DESC, id ASC",
            )
            .map_err(db_err)?;
        let rows = stmt.query_map([], Self::row_to_game).map_err(db_err)?;

        let mut games = Vec::new();
        for row in rows {
            games.push(row.map_err(db_err)?);
        }

        let mut genres = Self::load_all_tags(&conn, TagKind::Genre)?;
        let mut platforms = Self::load_all_tags(&conn, TagKind::Platform)?;
        for game in &mut games {
            game.genres = genres.remove(&game.id).unwrap_or_default();
            game.platforms = platforms.remove(&game.id).unwrap_or_default();
        }

        Ok(games)
    }

    fn get(&self, id: i64) -> Result<Game, LibraryError> {
        let conn = self.conn()?;
        Self::load_game(&conn, id)
    }

    fn create(&self, input: &GameInput) -> Result<Game, LibraryError> {
        let input = input.normalized()?;
        let mut conn = self.conn()?;

        let tx = conn.transaction().map_err(db_err)?;
        tx.execute(
            "INSERT INTO games (igdb_id, name, rating, release_date, cover_url)
             VALUES (?, ?, ?, ?, ?)",
            params![
                input.igdb_id,
                &input.name,
                input.rating,
                input.release_date.as_ref().map(format_release_date),
                &input.cover_url,
            ],
        )
        .map_err(|e| unique_or_db_err(e, || format!("game with igdbId {}", input.igdb_id)))?;
        let id = tx.last_insert_rowid();

        Self::link_tags(&tx, TagKind::Genre, id, &input.genres)?;
        Self::link_tags(&tx, TagKind::Platform, id, &input.platforms)?;
        tx.commit().map_err(db_err)?;

        debug!("Created game {} ({})", id, input.name);
        Self::load_game(&conn, id)
    }

    fn update(&self, id: i64, input: &GameInput) -> Result<Game, LibraryError> {
        let input = input.normalized()?;
        let mut conn = self.conn()?;

        let tx = conn.transaction().map_err(db_err)?;
        if !Self::game_exists(&tx, id)? {
            return Err(LibraryError::NotFound(format!("game {}", id)));
        }

        tx.execute(
            "UPDATE games
             SET igdb_id = ?, name = ?, rating = ?, release_date = ?, cover_url = ?
             WHERE id = ?",
            params![
                input.igdb_id,
                &input.name,
                input.rating,
                input.release_date.as_ref().map(format_release_date),
                &input.cover_url,
                id,
            ],
        )
        .map_err(|e| unique_or_db_err(e, || format!("game with igdbId {}", input.igdb_id)))?;

        // Links are replaced wholesale
        Self::unlink_tags(&tx, TagKind::Genre, id)?;
        Self::link_tags(&tx, TagKind::Genre, id, &input.genres)?;
        Self::unlink_tags(&tx, TagKind::Platform, id)?;
        Self::link_tags(&tx, TagKind::Platform, id, &input.platforms)?;
        tx.commit().map_err(db_err)?;

        debug!("Updated game {} ({})", id, input.name);
        Self::load_game(&conn, id)
    }

    fn delete(&self, id: i64) -> Result<(), LibraryError> {
        let conn = self.conn()?;

        // Cascades to game_genres and game_platforms
        let rows_affected = conn
            .execute("DELETE FROM games WHERE id = ?", params![id])
            .map_err(db_err)?;

        if rows_affected == 0 {
            return Err(LibraryError::NotFound(format!("game {}", id)));
        }

        debug!("Deleted game {}", id);
        Ok(())
    }

    fn upsert_tag(&self, kind: TagKind, name: &str) -> Result<Tag, LibraryError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LibraryError::Validation("tag name is required".to_string()));
        }
        let conn = self.conn()?;
        Self::ensure_tag(&conn, kind, name)
    }

    fn tags(&self, kind: TagKind) -> Result<Vec<Tag>, LibraryError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT id, name FROM {} ORDER BY name",
                kind.table()
            ))
            .map_err(db_err)?;
        let rows = stmt
            .query_map([], |row| {
                Ok(Tag {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })
            .map_err(db_err)?;

        let mut tags = Vec::new();
        for row in rows {
            tags.push(row.map_err(db_err)?);
        }
        Ok(tags)
    }

    fn stats(&self) -> Result<LibraryStats, LibraryError> {
        let conn = self.conn()?;
        Ok(LibraryStats {
            games: Self::count(&conn, "games")?,
            genres: Self::count(&conn, "genres")?,
            platforms: Self::count(&conn, "platforms")?,
        })
    }
}

fn db_err(e: rusqlite::Error) -> LibraryError {
    LibraryError::Database(e.to_string())
}

/// Map a UNIQUE constraint violation to `AlreadyExists`, anything else to `Database`.
fn unique_or_db_err(e: rusqlite::Error, what: impl FnOnce() -> String) -> LibraryError {
    match &e {
        rusqlite::Error::SqliteFailure(err, _)
            if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            LibraryError::AlreadyExists(what())
        }
        _ => db_err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn create_test_library() -> SqliteLibrary {
        SqliteLibrary::in_memory().unwrap()
    }

    fn zelda() -> GameInput {
        GameInput::new(1025, "The Legend of Zelda: Breath of the Wild")
            .with_rating(97.0)
            .with_release_date(Utc.with_ymd_and_hms(2017, 3, 3, 0, 0, 0).unwrap())
            .with_cover_url("https://images.igdb.com/igdb/image/upload/t_cover_big/co3p2d.jpg")
            .with_genres(["Adventure", "Role-playing (RPG)"])
            .with_platforms(["Nintendo Switch", "Wii U"])
    }

    fn count_rows(library: &SqliteLibrary, table: &str) -> u64 {
        let conn = library.conn().unwrap();
        SqliteLibrary::count(&conn, table).unwrap()
    }

    #[test]
    fn test_create_then_get_returns_same_fields() {
        let library = create_test_library();
        let created = library.create(&zelda()).unwrap();

        let fetched = library.get(created.id).unwrap();
        assert_eq!(fetched, created);
        assert_eq!(fetched.igdb_id, 1025);
        assert_eq!(fetched.name, "The Legend of Zelda: Breath of the Wild");
        assert_eq!(fetched.rating, Some(97.0));
        assert_eq!(
            fetched.release_date,
            Some(Utc.with_ymd_and_hms(2017, 3, 3, 0, 0, 0).unwrap())
        );
        let genres: Vec<&str> = fetched.genres.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(genres, vec!["Adventure", "Role-playing (RPG)"]);
        let platforms: Vec<&str> = fetched.platforms.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(platforms, vec!["Nintendo Switch", "Wii U"]);
    }

    #[test]
    fn test_create_duplicate_igdb_id() {
        let library = create_test_library();
        library.create(&zelda()).unwrap();

        let result = library.create(&GameInput::new(1025, "Another name"));
        assert!(matches!(result, Err(LibraryError::AlreadyExists(_))));
        assert_eq!(library.list().unwrap().len(), 1);
    }

    #[test]
    fn test_create_invalid_input_writes_nothing() {
        let library = create_test_library();
        let result = library.create(&GameInput::new(1, " ").with_genres(["Puzzle"]));
        assert!(matches!(result, Err(LibraryError::Validation(_))));
        assert_eq!(count_rows(&library, "genres"), 0);
    }

    #[test]
    fn test_tags_are_shared_between_games() {
        let library = create_test_library();
        let a = library
            .create(&GameInput::new(1, "Doom").with_genres(["Shooter"]))
            .unwrap();
        let b = library
            .create(&GameInput::new(2, "Quake").with_genres(["Shooter"]))
            .unwrap();

        assert_eq!(a.genres[0].id, b.genres[0].id);
        assert_eq!(library.tags(TagKind::Genre).unwrap().len(), 1);
    }

    #[test]
    fn test_get_nonexistent() {
        let library = create_test_library();
        let result = library.get(42);
        assert!(matches!(result, Err(LibraryError::NotFound(_))));
    }

    #[test]
    fn test_list_orders_by_rating_unrated_last() {
        let library = create_test_library();
        library.create(&GameInput::new(1, "Unrated")).unwrap();
        library
            .create(&GameInput::new(2, "Good").with_rating(80.0))
            .unwrap();
        library
            .create(&GameInput::new(3, "Great").with_rating(95.0))
            .unwrap();

        let names: Vec<String> = library
            .list()
            .unwrap()
            .into_iter()
            .map(|g| g.name)
            .collect();
        assert_eq!(names, vec!["Great", "Good", "Unrated"]);
    }

    #[test]
    fn test_list_includes_tags() {
        let library = create_test_library();
        library.create(&zelda()).unwrap();
        library.create(&GameInput::new(2, "Tetris")).unwrap();

        let games = library.list().unwrap();
        assert_eq!(games[0].genres.len(), 2);
        assert_eq!(games[0].platforms.len(), 2);
        assert!(games[1].genres.is_empty());
    }

    #[test]
    fn test_update_replaces_all_tags() {
        let library = create_test_library();
        let created = library.create(&zelda()).unwrap();

        let input = GameInput::new(1025, "Zelda BotW")
            .with_rating(96.0)
            .with_genres(["Open world"])
            .with_platforms(Vec::<String>::new());
        let updated = library.update(created.id, &input).unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.name, "Zelda BotW");
        assert_eq!(updated.rating, Some(96.0));
        assert!(updated.release_date.is_none());
        assert!(updated.cover_url.is_none());
        assert_eq!(updated.genres.len(), 1);
        assert_eq!(updated.genres[0].name, "Open world");
        assert!(updated.platforms.is_empty());

        // Old tags survive, only the links are gone
        assert_eq!(library.tags(TagKind::Genre).unwrap().len(), 3);
        assert_eq!(count_rows(&library, "game_platforms"), 0);
    }

    #[test]
    fn test_update_nonexistent() {
        let library = create_test_library();
        let result = library.update(7, &GameInput::new(1, "Nope"));
        assert!(matches!(result, Err(LibraryError::NotFound(_))));
    }

    #[test]
    fn test_update_to_taken_igdb_id() {
        let library = create_test_library();
        library.create(&GameInput::new(1, "First")).unwrap();
        let second = library.create(&GameInput::new(2, "Second")).unwrap();

        let result = library.update(second.id, &GameInput::new(1, "Second"));
        assert!(matches!(result, Err(LibraryError::AlreadyExists(_))));
        assert_eq!(library.get(second.id).unwrap().igdb_id, 2);
    }

    #[test]
    fn test_delete_removes_tag_links() {
        let library = create_test_library();
        let created = library.create(&zelda()).unwrap();
        assert_eq!(count_rows(&library, "game_genres"), 2);
        assert_eq!(count_rows(&library, "game_platforms"), 2);

        library.delete(created.id).unwrap();

        assert!(matches!(
            library.get(created.id),
            Err(LibraryError::NotFound(_))
        ));
        assert_eq!(count_rows(&library, "game_genres"), 0);
        assert_eq!(count_rows(&library, "game_platforms"), 0);
        // Tags themselves are kept
        assert_eq!(count_rows(&library, "genres"), 2);
    }

    #[test]
    fn test_delete_nonexistent() {
        let library = create_test_library();
        let result = library.delete(99);
        assert!(matches!(result, Err(LibraryError::NotFound(_))));
    }

    #[test]
    fn test_upsert_tag_is_idempotent() {
        let library = create_test_library();
        let first = library.upsert_tag(TagKind::Platform, "PC").unwrap();
        let second = library.upsert_tag(TagKind::Platform, " PC ").unwrap();
        assert_eq!(first, second);
        assert_eq!(library.tags(TagKind::Platform).unwrap().len(), 1);
        assert!(library.tags(TagKind::Genre).unwrap().is_empty());
    }

    #[test]
    fn test_upsert_blank_tag_rejected() {
        let library = create_test_library();
        let result = library.upsert_tag(TagKind::Genre, "  ");
        assert!(matches!(result, Err(LibraryError::Validation(_))));
    }

    #[test]
    fn test_tags_sorted_by_name() {
        let library = create_test_library();
        library.upsert_tag(TagKind::Genre, "Strategy").unwrap();
        library.upsert_tag(TagKind::Genre, "Adventure").unwrap();
        library.upsert_tag(TagKind::Genre, "Puzzle").unwrap();

        let names: Vec<String> = library
            .tags(TagKind::Genre)
            .unwrap()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["Adventure", "Puzzle", "Strategy"]);
    }

    #[test]
    fn test_stats() {
        let library = create_test_library();
        let stats = library.stats().unwrap();
        assert_eq!(stats.games, 0);

        library.create(&zelda()).unwrap();
        let stats = library.stats().unwrap();
        assert_eq!(stats.games, 1);
        assert_eq!(stats.genres, 2);
        assert_eq!(stats.platforms, 2);
    }

    #[test]
    fn test_persists_across_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("library.db");

        let id = {
            let library = SqliteLibrary::new(&path).unwrap();
            library.create(&zelda()).unwrap().id
        };

        let library = SqliteLibrary::new(&path).unwrap();
        let game = library.get(id).unwrap();
        assert_eq!(game.igdb_id, 1025);
        assert_eq!(game.genres.len(), 2);
    }

    #[test]
    fn test_unparsable_release_date_is_database_error() {
        let library = create_test_library();
        let id = library.create(&zelda()).unwrap().id;
        library
            .conn()
            .unwrap()
            .execute(
                "UPDATE games SET release_date = 'garbage' WHERE id = ?",
                params![id],
            )
            .unwrap();

        assert!(matches!(library.get(id), Err(LibraryError::Database(_))));
        assert!(matches!(library.list(), Err(LibraryError::Database(_))));
    }
}
