use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::{games, handlers, middleware::metrics_middleware};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // API routes
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        // Games
        .route("/games", get(games::list_games))
        .route("/games", post(games::create_game))
        .route("/games", delete(games::bulk_delete_games))
        .route("/games/facets", get(games::get_facets))
        .route("/games/stats", get(games::get_stats))
        .route("/games/{id}", get(games::get_game))
        .route("/games/{id}", put(games::update_game))
        .route("/games/{id}", delete(games::delete_game))
        // Tags
        .route("/genres", get(games::list_genres))
        .route("/platforms", get(games::list_platforms));

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/metrics", get(handlers::metrics))
        .with_state(state)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
