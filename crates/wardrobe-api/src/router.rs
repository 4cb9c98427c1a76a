//! Axum router construction.
//!
//! Assembles all routes into a single [`Router`] with permissive CORS
//! (game clients and overlays call from arbitrary origins), request
//! tracing, and the configured body size limit.

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, put};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::{capes, emotes, handlers};

/// Build the complete Axum router.
///
/// The router includes:
/// - `GET /` -- liveness probe
/// - `GET /emotes` -- emote snapshot
/// - `GET /emotes/changes` -- emote long-poll
/// - `PUT /emotes/changes` -- emote write for the player `changes`
/// - `PUT /emotes/{id}` -- emote write
/// - `GET /capes` -- cape snapshot
/// - `PUT /capes/{id}` -- cape write
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    let body_limit = DefaultBodyLimit::max(state.body_limit_bytes);

    Router::new()
        .route("/", get(handlers::index))
        .route("/emotes", get(emotes::get_emotes))
        .route(
            "/emotes/changes",
            get(emotes::get_emote_changes).put(emotes::put_emote_changes),
        )
        .route("/emotes/{id}", put(emotes::put_emote))
        .route("/capes", get(capes::get_capes))
        .route("/capes/{id}", put(capes::put_cape))
        .layer(body_limit)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
