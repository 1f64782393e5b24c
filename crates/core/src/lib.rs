pub mod config;
pub mod igdb;
pub mod import;
pub mod library;
pub mod metrics;
pub mod testing;
pub mod view;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, DatabaseConfig,
    IgdbConfig, ImportConfig, SanitizedConfig, ServerConfig,
};
pub use igdb::{GameSource, IgdbClient, IgdbError, TopGamesQuery};
pub use import::{ImportError, ImportReport, Importer};
pub use library::{
    Game, GameInput, GameLibrary, LibraryError, LibraryStats, SqliteLibrary, Tag, TagKind,
};
pub use view::{
    apply_filters, CatalogStats, CatalogView, FilterPatch, Filters, SortKey, SortOrder,
};
