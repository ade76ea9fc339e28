//! # API Endpoint Handlers
//!
//! Thin adapters from HTTP to `Explorer` calls.

use super::{
    AppState,
    types::{
        ActionResponse, FocusResponse, GenerationsResponse, GuidRequest, HealthResponse,
        HistoryResponse, ServerRequest, StatusResponse, UndoResponse,
    },
};
use crate::explorer::Outcome;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use rex_core::{ExploreFilters, RexError, SearchSelection};

// =============================================================================
// RESPONSE HELPERS
// =============================================================================

fn error_status(error: &RexError) -> StatusCode {
    match error {
        RexError::InvalidRequest(_) | RexError::NoFocus | RexError::UnknownInstance(_) => {
            StatusCode::BAD_REQUEST
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

async fn action_response(
    state: &AppState,
    result: Result<Outcome, RexError>,
) -> (StatusCode, Json<ActionResponse>) {
    match result {
        Ok(outcome) => {
            let latest = state
                .explorer
                .snapshot()
                .await
                .store
                .latest_active_generation_id();
            let status = match outcome {
                Outcome::Failed { .. } => StatusCode::BAD_GATEWAY,
                _ => StatusCode::OK,
            };
            (status, Json(ActionResponse::success(outcome, latest)))
        }
        Err(e) => (error_status(&e), Json(ActionResponse::error(e.to_string()))),
    }
}

fn invalid(e: &RexError) -> (StatusCode, Json<ActionResponse>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ActionResponse::error(e.to_string())),
    )
}

// =============================================================================
// READ HANDLERS
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

/// Session status and selected server.
pub async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    let snapshot = state.explorer.snapshot().await;
    let server = state.explorer.selected().await;
    (StatusCode::OK, Json(StatusResponse::new(&snapshot, server)))
}

/// All generations, oldest first.
pub async fn generations_handler(State(state): State<AppState>) -> impl IntoResponse {
    let snapshot = state.explorer.snapshot().await;
    (StatusCode::OK, Json(GenerationsResponse::new(&snapshot)))
}

/// Compiled history.
pub async fn history_handler(State(state): State<AppState>) -> impl IntoResponse {
    let entries = state.explorer.history().await;
    (StatusCode::OK, Json(HistoryResponse { entries }))
}

/// The current focus.
pub async fn focus_handler(State(state): State<AppState>) -> impl IntoResponse {
    let snapshot = state.explorer.snapshot().await;
    (StatusCode::OK, Json(FocusResponse::new(&snapshot)))
}

// =============================================================================
// FOCUS HANDLERS
// =============================================================================

/// Deselect the focus.
pub async fn clear_focus_handler(State(state): State<AppState>) -> impl IntoResponse {
    state.explorer.clear_focus().await;
    action_response(&state, Ok(Outcome::Deselected)).await
}

/// Toggle or reload the focus on a known entity.
pub async fn focus_entity_handler(
    State(state): State<AppState>,
    Json(request): Json<GuidRequest>,
) -> impl IntoResponse {
    let guid = match request.to_guid() {
        Ok(guid) => guid,
        Err(e) => return invalid(&e),
    };
    let result = state.explorer.change_focus_entity(guid).await;
    action_response(&state, result).await
}

/// Toggle or reload the focus on a known relationship.
pub async fn focus_relationship_handler(
    State(state): State<AppState>,
    Json(request): Json<GuidRequest>,
) -> impl IntoResponse {
    let guid = match request.to_guid() {
        Ok(guid) => guid,
        Err(e) => return invalid(&e),
    };
    let result = state.explorer.change_focus_relationship(guid).await;
    action_response(&state, result).await
}

// =============================================================================
// RETRIEVAL HANDLERS
// =============================================================================

/// Retrieve an entity from the selected server.
pub async fn entity_handler(
    State(state): State<AppState>,
    Json(request): Json<GuidRequest>,
) -> impl IntoResponse {
    let guid = match request.to_guid() {
        Ok(guid) => guid,
        Err(e) => return invalid(&e),
    };
    let result = state.explorer.load_entity(guid).await;
    action_response(&state, result).await
}

/// Retrieve a relationship from the selected server.
pub async fn relationship_handler(
    State(state): State<AppState>,
    Json(request): Json<GuidRequest>,
) -> impl IntoResponse {
    let guid = match request.to_guid() {
        Ok(guid) => guid,
        Err(e) => return invalid(&e),
    };
    let result = state.explorer.load_relationship(guid).await;
    action_response(&state, result).await
}

/// Explore around the focus entity.
pub async fn explore_handler(
    State(state): State<AppState>,
    Json(filters): Json<ExploreFilters>,
) -> impl IntoResponse {
    let result = state.explorer.explore(filters).await;
    action_response(&state, result).await
}

/// Commit a search result selection.
pub async fn traversal_handler(
    State(state): State<AppState>,
    Json(selection): Json<SearchSelection>,
) -> impl IntoResponse {
    let result = state.explorer.submit_search_selection(selection).await;
    action_response(&state, result).await
}

// =============================================================================
// SESSION HANDLERS
// =============================================================================

/// Remove the newest generation.
pub async fn undo_handler(State(state): State<AppState>) -> impl IntoResponse {
    let removed = state.explorer.undo().await;
    let latest = state
        .explorer
        .snapshot()
        .await
        .store
        .latest_active_generation_id();
    (
        StatusCode::OK,
        Json(UndoResponse {
            removed,
            latest_generation: latest.value(),
        }),
    )
}

/// Reset the session.
pub async fn clear_handler(State(state): State<AppState>) -> impl IntoResponse {
    state.explorer.clear().await;
    status_handler(State(state)).await
}

/// Select the server plain retrievals go to.
pub async fn server_handler(
    State(state): State<AppState>,
    Json(request): Json<ServerRequest>,
) -> impl IntoResponse {
    let context = match request.to_context() {
        Ok(context) => context,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "error": e.to_string() })),
            );
        }
    };
    state.explorer.select_server(context.clone()).await;
    (StatusCode::OK, Json(serde_json::json!({ "server": context })))
}
