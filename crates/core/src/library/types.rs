//! Types for the game library.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A game in the library, with its genre and platform tags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    /// Store-assigned identifier.
    pub id: i64,
    /// IGDB identifier (unique across the library).
    pub igdb_id: i64,
    pub name: String,
    /// Aggregated rating, 0 to 100.
    pub rating: Option<f64>,
    #[serde(default, with = "release_date_format")]
    pub release_date: Option<DateTime<Utc>>,
    pub cover_url: Option<String>,
    #[serde(default)]
    pub genres: Vec<Tag>,
    #[serde(default)]
    pub platforms: Vec<Tag>,
}

impl Game {
    pub fn has_genre(&self, name: &str) -> bool {
        self.genres.iter().any(|g| g.name == name)
    }

    pub fn has_platform(&self, name: &str) -> bool {
        self.platforms.iter().any(|p| p.name == name)
    }
}

/// A named genre or platform shared across games.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
}

/// Which tag relation a tag belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagKind {
    Genre,
    Platform,
}

impl TagKind {
    /// Table holding the tag names.
    pub(crate) fn table(self) -> &'static str {
        match self {
            TagKind::Genre => "genres",
            TagKind::Platform => "platforms",
        }
    }

    /// Join table linking games to tags.
    pub(crate) fn join_table(self) -> &'static str {
        match self {
            TagKind::Genre => "game_genres",
            TagKind::Platform => "game_platforms",
        }
    }

    /// Tag column in the join table.
    pub(crate) fn join_column(self) -> &'static str {
        match self {
            TagKind::Genre => "genre_id",
            TagKind::Platform => "platform_id",
        }
    }
}

/// Fields for creating or replacing a game.
///
/// Tags are referenced by name; missing tags are created on write.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameInput {
    pub igdb_id: i64,
    pub name: String,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default, with = "release_date_format")]
    pub release_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub cover_url: Option<String>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub platforms: Vec<String>,
}

impl GameInput {
    pub fn new(igdb_id: i64, name: impl Into<String>) -> Self {
        Self {
            igdb_id,
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_rating(mut self, rating: f64) -> Self {
        self.rating = Some(rating);
        self
    }

    pub fn with_release_date(mut self, date: DateTime<Utc>) -> Self {
        self.release_date = Some(date);
        self
    }

    pub fn with_cover_url(mut self, url: impl Into<String>) -> Self {
        self.cover_url = Some(url.into());
        self
    }

    pub fn with_genres<I, S>(mut self, genres: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.genres = genres.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_platforms<I, S>(mut self, platforms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.platforms = platforms.into_iter().map(Into::into).collect();
        self
    }

    /// Validate and clean up the input.
    ///
    /// Trims the name and tag names, drops blank and repeated tags (keeping
    /// the first occurrence) and turns a blank cover URL into `None`.
    pub fn normalized(&self) -> Result<GameInput, LibraryError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(LibraryError::Validation("name is required".to_string()));
        }
        if self.igdb_id <= 0 {
            return Err(LibraryError::Validation(
                "igdbId must be a positive integer".to_string(),
            ));
        }
        if let Some(rating) = self.rating {
            if !rating.is_finite() || !(0.0..=100.0).contains(&rating) {
                return Err(LibraryError::Validation(
                    "rating must be between 0 and 100".to_string(),
                ));
            }
        }

        let cover_url = self
            .cover_url
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        Ok(GameInput {
            igdb_id: self.igdb_id,
            name: name.to_string(),
            rating: self.rating,
            release_date: self.release_date,
            cover_url,
            genres: dedup_tag_names(&self.genres),
            platforms: dedup_tag_names(&self.platforms),
        })
    }
}

fn dedup_tag_names(names: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(names.len());
    for name in names {
        let name = name.trim();
        if !name.is_empty() && !out.iter().any(|n| n == name) {
            out.push(name.to_string());
        }
    }
    out
}

/// Library counts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryStats {
    pub games: u64,
    pub genres: u64,
    pub platforms: u64,
}

/// Errors for library operations.
#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Parse a release date given either as RFC 3339 or as a plain `YYYY-MM-DD`
/// day (taken as midnight UTC).
pub fn parse_release_date(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// Format a release date the way the API emits it (`2017-03-03T00:00:00.000Z`).
pub fn format_release_date(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Serde adapter for optional release dates.
///
/// Emits millisecond RFC 3339 strings; accepts RFC 3339, `YYYY-MM-DD`, an
/// empty string or null.
pub(crate) mod release_date_format {
    use chrono::{DateTime, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(date: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match date {
            Some(d) => serializer.serialize_str(&super::format_release_date(d)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) => super::parse_release_date(s)
                .map(Some)
                .ok_or_else(|| de::Error::custom(format!("invalid release date: {}", s))),
        }
    }
}
