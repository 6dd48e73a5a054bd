//! Main [axum::Router] interface for webserver.

use crate::{
    app_state::AppState,
    routes::{dispatch, fallback::notfound_404, health, ping, verify},
    setups::ServerSetup,
};
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

/// Setup main router for application.
pub fn setup_app_router<S: ServerSetup>(app_state: AppState<S>) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([http::Method::GET, http::Method::POST])
        .allow_headers([
            http::header::AUTHORIZATION,
            http::header::CONTENT_TYPE,
            http::header::ACCEPT,
        ])
        // the mobile app calls us from a file:// origin
        .allow_origin(Any);

    Router::new()
        .route("/ping", get(ping::get))
        .route("/healthcheck", get(health::healthcheck::<S>))
        .route("/send-verification", post(verify::send_verification::<S>))
        .route(
            "/hooks/dispatch-created",
            post(dispatch::dispatch_created::<S>),
        )
        .fallback(notfound_404)
        .layer(cors)
        .with_state(app_state)
}
