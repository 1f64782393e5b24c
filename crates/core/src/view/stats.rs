//! Aggregates backing the dashboard charts.

use std::collections::{BTreeMap, HashMap};

use chrono::Datelike;
use serde::{Deserialize, Serialize};

use crate::library::{Game, Tag};

const BUCKET_WIDTH: f64 = 10.0;
const BUCKET_COUNT: usize = 10;

/// Games whose rating falls in `[min, max)`; the last bucket includes 100.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingBucket {
    pub min: u32,
    pub max: u32,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameCount {
    pub name: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearCount {
    pub year: i32,
    pub count: usize,
}

/// Chart data for a set of games.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogStats {
    pub total: usize,
    /// Games with a rating.
    pub rated: usize,
    /// Mean over rated games.
    pub average_rating: Option<f64>,
    pub rating_buckets: Vec<RatingBucket>,
    /// Most common first, ties by name.
    pub by_genre: Vec<NameCount>,
    pub by_platform: Vec<NameCount>,
    /// Oldest first; undated games are left out.
    pub by_year: Vec<YearCount>,
}

impl CatalogStats {
    pub fn compute(games: &[Game]) -> Self {
        let ratings: Vec<f64> = games.iter().filter_map(|g| g.rating).collect();
        let average_rating = if ratings.is_empty() {
            None
        } else {
            Some(ratings.iter().sum::<f64>() / ratings.len() as f64)
        };

        let mut rating_buckets: Vec<RatingBucket> = (0..BUCKET_COUNT)
            .map(|i| RatingBucket {
                min: (i as f64 * BUCKET_WIDTH) as u32,
                max: ((i + 1) as f64 * BUCKET_WIDTH) as u32,
                count: 0,
            })
            .collect();
        for rating in &ratings {
            let index = ((rating / BUCKET_WIDTH).floor() as usize).min(BUCKET_COUNT - 1);
            rating_buckets[index].count += 1;
        }

        let mut years: BTreeMap<i32, usize> = BTreeMap::new();
        for date in games.iter().filter_map(|g| g.release_date) {
            *years.entry(date.year()).or_default() += 1;
        }

        Self {
            total: games.len(),
            rated: ratings.len(),
            average_rating,
            rating_buckets,
            by_genre: count_tags(games.iter().flat_map(|g| &g.genres)),
            by_platform: count_tags(games.iter().flat_map(|g| &g.platforms)),
            by_year: years
                .into_iter()
                .map(|(year, count)| YearCount { year, count })
                .collect(),
        }
    }
}

fn count_tags<'a>(tags: impl Iterator<Item = &'a Tag>) -> Vec<NameCount> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for tag in tags {
        *counts.entry(tag.name.as_str()).or_default() += 1;
    }

    let mut result: Vec<NameCount> = counts
        .into_iter()
        .map(|(name, count)| NameCount {
            name: name.to_string(),
            count,
        })
        .collect();
    result.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    result
}
