//! Game library - the persistent catalog of games and their tags.
//!
//! Games are linked many-to-many to genres and platforms. Tags are created
//! on first reference and never deleted; deleting a game removes its links.

mod sqlite;
mod types;

pub use sqlite::SqliteLibrary;
pub use types::*;

/// Trait for game library storage.
pub trait GameLibrary: Send + Sync {
    /// All games with their tags, highest rated first (unrated last).
    fn list(&self) -> Result<Vec<Game>, LibraryError>;

    /// Get a game by id.
    fn get(&self, id: i64) -> Result<Game, LibraryError>;

    /// Create a game, creating any tags it references.
    ///
    /// Fails with `AlreadyExists` if another game has the same IGDB id.
    fn create(&self, input: &GameInput) -> Result<Game, LibraryError>;

    /// Replace a game's fields and all of its tag links.
    fn update(&self, id: i64, input: &GameInput) -> Result<Game, LibraryError>;

    /// Delete a game and its tag links.
    fn delete(&self, id: i64) -> Result<(), LibraryError>;

    /// Insert a tag if missing and return it.
    fn upsert_tag(&self, kind: TagKind, name: &str) -> Result<Tag, LibraryError>;

    /// All tags of a kind, sorted by name.
    fn tags(&self, kind: TagKind) -> Result<Vec<Tag>, LibraryError>;

    /// Library counts.
    fn stats(&self) -> Result<LibraryStats, LibraryError>;
}
