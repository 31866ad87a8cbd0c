pub mod catalog;
pub mod news;

pub use catalog::{CatalogSyncSummary, CatalogSynchronizer};
pub use news::{NewsSyncSummary, NewsSynchronizer};
