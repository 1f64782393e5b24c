//! IGDB response types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Image size used for stored cover URLs.
const COVER_SIZE: &str = "t_cover_big";

/// Image size IGDB returns by default.
const THUMB_SIZE: &str = "t_thumb";

/// An IGDB entity that only carries an id and a name (genre, platform).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IgdbNamed {
    pub id: u64,
    pub name: String,
}

/// Cover image reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IgdbCover {
    #[serde(default)]
    pub url: Option<String>,
}

/// A game as returned by the `games` endpoint.
///
/// `genres` and `platforms` are IGDB ids, not names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IgdbGame {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub rating: Option<f64>,
    /// Unix timestamp in seconds.
    #[serde(default)]
    pub first_release_date: Option<i64>,
    #[serde(default)]
    pub cover: Option<IgdbCover>,
    #[serde(default)]
    pub genres: Vec<u64>,
    #[serde(default)]
    pub platforms: Vec<u64>,
}

impl IgdbGame {
    /// Rating, treating 0 as unrated.
    pub fn rating(&self) -> Option<f64> {
        self.rating.filter(|r| *r != 0.0)
    }

    pub fn release_date(&self) -> Option<DateTime<Utc>> {
        self.first_release_date
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
    }

    /// Absolute URL of the big cover image.
    ///
    /// IGDB hands out protocol-relative thumbnail URLs
    /// (`//images.igdb.com/.../t_thumb/xyz.jpg`).
    pub fn cover_url(&self) -> Option<String> {
        let url = self.cover.as_ref()?.url.as_deref()?;
        if url.is_empty() {
            return None;
        }
        let url = url.replace(THUMB_SIZE, COVER_SIZE);
        if url.starts_with("//") {
            Some(format!("https:{}", url))
        } else {
            Some(url)
        }
    }
}
