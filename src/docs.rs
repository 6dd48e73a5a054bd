//! OpenAPI doc generation.

use crate::{
    error::AppError,
    models::dispatch_event::DispatchEvent,
    routes::{dispatch, health, ping, verify},
};
use utoipa::OpenApi;

/// API documentation generator.
#[derive(OpenApi)]
#[openapi(
    paths(
        health::healthcheck,
        ping::get,
        verify::send_verification,
        dispatch::dispatch_created,
    ),
    components(
        schemas(
            AppError,
            DispatchEvent,
            verify::SendVerificationRequest,
            verify::SuccessResponse,
            health::HealthcheckResponse
        )
    )
)]

/// Tied to OpenAPI documentation.
#[derive(Debug)]
pub struct ApiDoc;
