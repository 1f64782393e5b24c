//! Catalog state container driven by a dashboard.

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::debug;

use super::filters::{apply_filters, FilterPatch, Filters};
use crate::library::{Game, Tag};

/// Full catalog plus the filtered, sorted view derived from it.
///
/// `filtered` is recomputed on every change to the catalog or the filters,
/// so it always equals `apply_filters(&games, &filters)`.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogView {
    games: Vec<Game>,
    filtered: Vec<Game>,
    filters: Filters,
    loading: bool,
    error: Option<String>,
}

impl CatalogView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn games(&self) -> &[Game] {
        &self.games
    }

    pub fn filtered(&self) -> &[Game] {
        &self.filtered
    }

    pub fn filters(&self) -> &Filters {
        &self.filters
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Mark a catalog fetch as in flight.
    pub fn start_loading(&mut self) {
        self.loading = true;
        self.error = None;
    }

    /// Complete a catalog fetch. On failure the previous catalog is kept.
    pub fn finish_loading(&mut self, result: Result<Vec<Game>, String>) {
        self.loading = false;
        match result {
            Ok(games) => {
                debug!("Catalog loaded with {} games", games.len());
                self.games = games;
                self.error = None;
                self.refresh();
            }
            Err(message) => {
                debug!("Catalog load failed: {}", message);
                self.error = Some(message);
            }
        }
    }

    pub fn set_filters(&mut self, patch: FilterPatch) {
        self.filters.apply_patch(patch);
        self.refresh();
    }

    /// Restore the default filters and the default-sorted unfiltered list.
    pub fn reset_filters(&mut self) {
        self.filters = Filters::default();
        self.refresh();
    }

    pub fn toggle_sort_order(&mut self) {
        self.filters.sort_order = self.filters.sort_order.toggled();
        self.refresh();
    }

    /// Unique genre names across the full catalog, sorted.
    pub fn genre_options(&self) -> Vec<String> {
        collect_names(&self.games, |g| &g.genres)
    }

    /// Unique platform names across the full catalog, sorted.
    pub fn platform_options(&self) -> Vec<String> {
        collect_names(&self.games, |g| &g.platforms)
    }

    fn refresh(&mut self) {
        self.filtered = apply_filters(&self.games, &self.filters);
    }
}

fn collect_names<F>(games: &[Game], tags: F) -> Vec<String>
where
    F: Fn(&Game) -> &Vec<Tag>,
{
    games
        .iter()
        .flat_map(|g| tags(g).iter().map(|t| t.name.clone()))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
