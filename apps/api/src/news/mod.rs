// News feed: sheet ingestion, timestamp normalization, range filtering and display.
// Records are loaded into an immutable collection and swapped wholesale on refresh.

pub mod cache;
pub mod display;
pub mod filter;
pub mod handlers;
pub mod models;
pub mod store;
pub mod timestamp;

pub use cache::RecordCache;
pub use store::RecordStore;
