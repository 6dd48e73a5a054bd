//! Dispatch-created webhook route.

use crate::{
    app_state::AppState, error::AppResult, extract::json::Json, fanout,
    models::dispatch_event::DispatchEvent, setups::ServerSetup,
};
use axum::{extract::State, http::StatusCode};

/// POST handler invoked by the store once per created dispatch record.
///
/// The store treats this as fire-and-forget and never consumes the
/// response; the status code only feeds observability.
#[utoipa::path(
    post,
    path = "/hooks/dispatch-created",
    request_body = DispatchEvent,
    responses(
        (status = 200, description = "Fan-out attempted (or cleanly skipped)"),
        (status = 400, description = "Malformed event snapshot", body = AppError),
        (status = 500, description = "Token lookup or multicast failure", body = AppError)
    )
)]
pub async fn dispatch_created<S: ServerSetup>(
    State(state): State<AppState<S>>,
    Json(event): Json<DispatchEvent>,
) -> AppResult<StatusCode> {
    fanout::notify_responders(&state, &event).await?;

    Ok(StatusCode::OK)
}
