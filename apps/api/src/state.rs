use std::sync::Arc;

use crate::config::Config;
use crate::news::RecordCache;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Last loaded news collection; swapped wholesale on refresh.
    pub records: Arc<RecordCache>,
}
