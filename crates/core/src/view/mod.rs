//! Filtered, sorted views of the catalog and the statistics behind the
//! dashboard charts.
//!
//! The view is a pure function of the full catalog and the current
//! [`Filters`]; nothing here touches the store.

mod filters;
mod state;
mod stats;

pub use filters::{apply_filters, FilterPatch, Filters, SortKey, SortOrder};
pub use state::CatalogView;
pub use stats::{CatalogStats, NameCount, RatingBucket, YearCount};
