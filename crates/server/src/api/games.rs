//! Game library API handlers.

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use ludex_core::{
    CatalogStats, CatalogView, FilterPatch, Game, GameInput, LibraryError, Tag, TagKind,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::state::AppState;

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub message: String,
    pub id: i64,
}

#[derive(Debug, Deserialize)]
pub struct BulkDeleteRequest {
    pub ids: Vec<i64>,
}

#[derive(Debug, Serialize)]
pub struct BulkDeleteFailure {
    pub id: i64,
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct BulkDeleteResponse {
    pub deleted: Vec<i64>,
    pub failed: Vec<BulkDeleteFailure>,
}

#[derive(Debug, Serialize)]
pub struct FacetsResponse {
    pub genres: Vec<String>,
    pub platforms: Vec<String>,
}

fn bad_request(message: impl Into<String>) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message.into(),
            details: None,
        }),
    )
}

/// Map a library error to a response; `action` names the failed operation.
fn library_error(action: &str, e: LibraryError) -> ApiError {
    let (status, error, details) = match e {
        LibraryError::Validation(msg) => (StatusCode::BAD_REQUEST, msg, None),
        LibraryError::NotFound(_) => (StatusCode::NOT_FOUND, "Game not found".to_string(), None),
        LibraryError::AlreadyExists(_) => (
            StatusCode::CONFLICT,
            "A game with this igdbId already exists".to_string(),
            None,
        ),
        other => {
            error!("Failed to {}: {}", action, other);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to {}", action),
                Some(other.to_string()),
            )
        }
    };
    (status, Json(ErrorResponse { error, details }))
}

fn parse_id(raw: &str) -> Result<i64, ApiError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| bad_request("Invalid id"))
}

/// Load the full catalog into a view with the given filters applied.
fn load_view(
    state: &AppState,
    params: Result<Query<FilterPatch>, QueryRejection>,
) -> Result<CatalogView, ApiError> {
    let Query(patch) = params.map_err(|e| bad_request(e.body_text()))?;
    let games = state
        .library()
        .list()
        .map_err(|e| library_error("fetch games", e))?;

    let mut view = CatalogView::new();
    view.finish_loading(Ok(games));
    if !patch.is_empty() {
        view.set_filters(patch);
    }
    Ok(view)
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/v1/games
///
/// List games, optionally filtered and sorted with
/// `search`, `genre`, `platform`, `minRating`, `sortBy`, `sortOrder`.
pub async fn list_games(
    State(state): State<Arc<AppState>>,
    params: Result<Query<FilterPatch>, QueryRejection>,
) -> Result<Json<Vec<Game>>, ApiError> {
    let view = load_view(&state, params)?;
    Ok(Json(view.filtered().to_vec()))
}

/// GET /api/v1/games/facets
///
/// Genre and platform names present in the library.
pub async fn get_facets(
    State(state): State<Arc<AppState>>,
) -> Result<Json<FacetsResponse>, ApiError> {
    let view = load_view(&state, Ok(Query(FilterPatch::default())))?;
    Ok(Json(FacetsResponse {
        genres: view.genre_options(),
        platforms: view.platform_options(),
    }))
}

/// GET /api/v1/games/stats
///
/// Chart data for the games matching the filter parameters.
pub async fn get_stats(
    State(state): State<Arc<AppState>>,
    params: Result<Query<FilterPatch>, QueryRejection>,
) -> Result<Json<CatalogStats>, ApiError> {
    let view = load_view(&state, params)?;
    Ok(Json(CatalogStats::compute(view.filtered())))
}

/// GET /api/v1/games/{id}
pub async fn get_game(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Game>, ApiError> {
    let id = parse_id(&id)?;
    state
        .library()
        .get(id)
        .map(Json)
        .map_err(|e| library_error("fetch game", e))
}

/// POST /api/v1/games
///
/// Create a game; unknown genres and platforms are created on the fly.
pub async fn create_game(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<GameInput>, JsonRejection>,
) -> Result<(StatusCode, Json<Game>), ApiError> {
    let Json(input) = payload.map_err(|e| bad_request(e.body_text()))?;

    let game = state
        .library()
        .create(&input)
        .map_err(|e| library_error("create game", e))?;
    info!("Created game {} (id {})", game.name, game.id);
    Ok((StatusCode::CREATED, Json(game)))
}

/// PUT /api/v1/games/{id}
///
/// Replace a game's fields and all of its genres and platforms.
pub async fn update_game(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<GameInput>, JsonRejection>,
) -> Result<Json<Game>, ApiError> {
    let id = parse_id(&id)?;
    let Json(input) = payload.map_err(|e| bad_request(e.body_text()))?;

    let game = state
        .library()
        .update(id, &input)
        .map_err(|e| library_error("update game", e))?;
    info!("Updated game {} (id {})", game.name, game.id);
    Ok(Json(game))
}

/// DELETE /api/v1/games/{id}
pub async fn delete_game(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let id = parse_id(&id)?;
    state
        .library()
        .delete(id)
        .map_err(|e| library_error("delete game", e))?;
    info!("Deleted game {}", id);
    Ok(Json(DeleteResponse {
        message: "Game deleted".to_string(),
        id,
    }))
}

/// DELETE /api/v1/games
///
/// Delete several games. Each id is deleted on its own: earlier deletions
/// stay in place when a later one fails, and the response is 207 if any
/// id failed.
pub async fn bulk_delete_games(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<BulkDeleteRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<BulkDeleteResponse>), ApiError> {
    let Json(request) = payload.map_err(|e| bad_request(e.body_text()))?;

    let mut response = BulkDeleteResponse {
        deleted: Vec::with_capacity(request.ids.len()),
        failed: Vec::new(),
    };
    for id in request.ids {
        match state.library().delete(id) {
            Ok(()) => response.deleted.push(id),
            Err(e) => {
                warn!("Bulk delete of game {} failed: {}", id, e);
                let error = match e {
                    LibraryError::NotFound(_) => "Game not found".to_string(),
                    other => other.to_string(),
                };
                response.failed.push(BulkDeleteFailure { id, error });
            }
        }
    }

    info!(
        "Bulk delete: {} deleted, {} failed",
        response.deleted.len(),
        response.failed.len()
    );
    let status = if response.failed.is_empty() {
        StatusCode::OK
    } else {
        StatusCode::MULTI_STATUS
    };
    Ok((status, Json(response)))
}

/// GET /api/v1/genres
pub async fn list_genres(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Tag>>, ApiError> {
    state
        .library()
        .tags(TagKind::Genre)
        .map(Json)
        .map_err(|e| library_error("fetch genres", e))
}

/// GET /api/v1/platforms
pub async fn list_platforms(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Tag>>, ApiError> {
    state
        .library()
        .tags(TagKind::Platform)
        .map(Json)
        .map_err(|e| library_error("fetch platforms", e))
}
