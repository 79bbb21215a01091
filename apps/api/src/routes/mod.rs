pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::news::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/news", get(handlers::handle_list_news))
        .route("/api/v1/news/facets", get(handlers::handle_news_facets))
        .route("/api/v1/news/refresh", post(handlers::handle_refresh))
        .with_state(state)
}
