//! API route definitions.

use axum::http::{HeaderValue, Method, header};
use axum::{
    Router,
    routing::{delete, get, post, put},
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::{Level, warn};

use crate::ws::ws_handler;

use super::handlers;
use super::state::AppState;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    let cors = build_cors_layer(&state.cors_origins);

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_request(DefaultOnRequest::new().level(Level::DEBUG))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    let presentation_routes = Router::new()
        // Presentations
        .route("/create", post(handlers::create_presentation))
        .route("/get-all", get(handlers::list_presentations))
        .route("/{id}/general", get(handlers::get_presentation))
        .route("/{id}/edit", put(handlers::update_presentation))
        .route("/delete/{id}", delete(handlers::delete_presentation))
        // Slides
        .route("/{id}/slides/get-all", get(handlers::list_slides))
        .route("/{id}/slide/create", post(handlers::create_slide))
        .route("/{id}/slide/{slide_id}", get(handlers::get_slide))
        .route("/{id}/slide/{slide_id}/edit", put(handlers::update_slide))
        .route(
            "/{id}/slide/delete/{slide_id}",
            delete(handlers::delete_slide),
        )
        // Votes
        .route(
            "/{id}/vote/{content_id}/submit",
            post(handlers::submit_vote),
        );

    Router::new()
        .route("/health", get(handlers::health))
        .route("/ws", get(ws_handler))
        .nest("/presentation", presentation_routes)
        .layer(trace_layer)
        .layer(cors)
        .with_state(state)
}

fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let methods = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::OPTIONS,
    ];
    let headers = [header::CONTENT_TYPE, header::ACCEPT, header::ORIGIN];

    if origins.is_empty() {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(headers);
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "CORS: ignoring invalid origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(methods)
        .allow_headers(headers)
        .allow_credentials(true)
}
