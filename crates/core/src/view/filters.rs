//! Filter and sort settings, and the pure function applying them.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::library::Game;

/// Field the catalog is sorted by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    Name,
    #[default]
    Rating,
    ReleaseDate,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn toggled(self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }
}

/// Current filter and sort settings.
///
/// Empty strings and a zero minimum rating disable the corresponding filter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Filters {
    /// Case-insensitive substring of the game name.
    pub search: String,
    /// Exact genre name.
    pub genre: String,
    /// Exact platform name.
    pub platform: String,
    pub min_rating: f64,
    pub sort_by: SortKey,
    pub sort_order: SortOrder,
}

impl Filters {
    /// Merge the fields present in `patch`.
    pub fn apply_patch(&mut self, patch: FilterPatch) {
        if let Some(search) = patch.search {
            self.search = search;
        }
        if let Some(genre) = patch.genre {
            self.genre = genre;
        }
        if let Some(platform) = patch.platform {
            self.platform = platform;
        }
        if let Some(min_rating) = patch.min_rating {
            self.min_rating = min_rating;
        }
        if let Some(sort_by) = patch.sort_by {
            self.sort_by = sort_by;
        }
        if let Some(sort_order) = patch.sort_order {
            self.sort_order = sort_order;
        }
    }

    fn matches(&self, game: &Game, needle: &str) -> bool {
        if !needle.is_empty() && !game.name.to_lowercase().contains(needle) {
            return false;
        }
        if !self.genre.is_empty() && !game.has_genre(&self.genre) {
            return false;
        }
        if !self.platform.is_empty() && !game.has_platform(&self.platform) {
            return false;
        }
        if self.min_rating > 0.0 && game.rating.unwrap_or(0.0) < self.min_rating {
            return false;
        }
        true
    }
}

/// Partial update of [`Filters`]; absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FilterPatch {
    pub search: Option<String>,
    pub genre: Option<String>,
    pub platform: Option<String>,
    pub min_rating: Option<f64>,
    pub sort_by: Option<SortKey>,
    pub sort_order: Option<SortOrder>,
}

impl FilterPatch {
    pub fn is_empty(&self) -> bool {
        *self == FilterPatch::default()
    }
}

/// Filter then sort `games`. The sort is stable.
pub fn apply_filters(games: &[Game], filters: &Filters) -> Vec<Game> {
    let needle = filters.search.to_lowercase();
    let mut result: Vec<Game> = games
        .iter()
        .filter(|g| filters.matches(g, &needle))
        .cloned()
        .collect();

    result.sort_by(|a, b| {
        let ord = compare(a, b, filters.sort_by);
        match filters.sort_order {
            SortOrder::Asc => ord,
            SortOrder::Desc => ord.reverse(),
        }
    });
    result
}

fn compare(a: &Game, b: &Game, key: SortKey) -> Ordering {
    match key {
        SortKey::Name => a
            .name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.name.cmp(&b.name)),
        SortKey::Rating => a.rating.unwrap_or(0.0).total_cmp(&b.rating.unwrap_or(0.0)),
        SortKey::ReleaseDate => {
            let ts = |g: &Game| g.release_date.map(|d| d.timestamp_millis()).unwrap_or(0);
            ts(a).cmp(&ts(b))
        }
    }
}
