mod catalog;
mod outcome;
mod retention;

pub use catalog::{CatalogCache, MarketCatalogEntry};
pub use outcome::{resolve, MULTIPLE_OUTCOMES, UNKNOWN_OUTCOME};
pub use retention::RetentionCache;
