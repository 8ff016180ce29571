//! HTTP gateway (Axum) for question lookup and cache administration.
//!
//! This module is primarily used by the `titrate` server binary.

pub mod error;
pub mod handler;
pub mod payload;
pub mod state;


use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header::HeaderValue},
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use state::HandlerState;

use handler::{
    approve_handler, bulk_correct_handler, cache_question_handler, correct_handler,
    delete_cached_handler, delete_interaction_handler, dismiss_handler, explain_match_handler,
    force_update_handler, get_cached_handler, get_interaction_handler,
    linked_interactions_handler, list_cached_handler, lookup_handler, purge_handler,
    record_interaction_handler, similar_handler, statistics_handler, unapproved_handler,
    update_answer_handler,
};
use titrate::{Embedder, QuestionStore, TITRATE_STATUS_HEADER};

pub const TITRATE_STATUS_HEALTHY: &str = "healthy";

pub fn create_router_with_state<E, S>(state: HandlerState<E, S>) -> Router
where
    E: Embedder + 'static,
    S: QuestionStore + 'static,
{
    Router::new()
        .route("/healthz", get(health_handler::<E, S>))
        .route("/v1/lookup", post(lookup_handler::<E, S>))
        .route(
            "/v1/cache",
            get(list_cached_handler::<E, S>).post(cache_question_handler::<E, S>),
        )
        .route("/v1/cache/statistics", get(statistics_handler::<E, S>))
        .route("/v1/cache/purge", post(purge_handler::<E, S>))
        .route("/v1/cache/force-update", post(force_update_handler::<E, S>))
        .route(
            "/v1/cache/{id}",
            get(get_cached_handler::<E, S>).delete(delete_cached_handler::<E, S>),
        )
        .route("/v1/cache/{id}/answer", put(update_answer_handler::<E, S>))
        .route(
            "/v1/cache/{id}/interactions",
            get(linked_interactions_handler::<E, S>),
        )
        .route("/v1/interactions", post(record_interaction_handler::<E, S>))
        .route(
            "/v1/interactions/unapproved",
            get(unapproved_handler::<E, S>),
        )
        .route(
            "/v1/interactions/bulk-correct",
            post(bulk_correct_handler::<E, S>),
        )
        .route(
            "/v1/interactions/{id}",
            get(get_interaction_handler::<E, S>).delete(delete_interaction_handler::<E, S>),
        )
        .route(
            "/v1/interactions/{id}/approve",
            post(approve_handler::<E, S>),
        )
        .route(
            "/v1/interactions/{id}/correct",
            post(correct_handler::<E, S>),
        )
        .route(
            "/v1/interactions/{id}/dismiss",
            post(dismiss_handler::<E, S>),
        )
        .route(
            "/v1/interactions/{id}/similar",
            get(similar_handler::<E, S>),
        )
        .route("/v1/debug/match", post(explain_match_handler::<E, S>))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(serde::Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub embedder_mode: &'static str,
}

#[tracing::instrument(skip(state))]
pub async fn health_handler<E, S>(State(state): State<HandlerState<E, S>>) -> Response
where
    E: Embedder + 'static,
    S: QuestionStore + 'static,
{
    let mut headers = HeaderMap::new();
    headers.insert(
        TITRATE_STATUS_HEADER,
        HeaderValue::from_static(TITRATE_STATUS_HEALTHY),
    );
    let embedder_mode = if state.is_embedder_stub() { "stub" } else { "real" };

    (
        StatusCode::OK,
        headers,
        Json(HealthResponse {
            status: "ok",
            embedder_mode,
        }),
    )
        .into_response()
}
