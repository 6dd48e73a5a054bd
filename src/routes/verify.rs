//! Verification-code issuance route.

use crate::{
    app_state::AppState,
    error::{AppError, AppResult},
    extract::json::Json,
    models::{user::UserRecord, verification_code::generate_code},
    setups::{ServerSetup, VerificationCodeSender as _},
};
use axum::{extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Request body for [send_verification]
#[derive(Deserialize, Serialize, Validate, Clone, Debug, ToSchema)]
pub struct SendVerificationRequest {
    /// The email address of the user to verify
    #[serde(default)]
    #[validate(length(min = 1, message = "email is required"))]
    pub email: String,
}

/// Response type indicating success
#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct SuccessResponse {
    /// Whether the response was successful
    pub success: bool,
}

/// POST handler for issuing a fresh verification code over email.
#[utoipa::path(
    post,
    path = "/send-verification",
    request_body = SendVerificationRequest,
    responses(
        (status = 200, description = "Verification code generated and emailed", body = SuccessResponse),
        (status = 400, description = "Missing email", body = AppError),
        (status = 404, description = "No user with that email", body = AppError),
        (status = 500, description = "Store or mail transport failure", body = AppError)
    )
)]
pub async fn send_verification<S: ServerSetup>(
    State(state): State<AppState<S>>,
    Json(request): Json<SendVerificationRequest>,
) -> AppResult<(StatusCode, Json<SuccessResponse>)> {
    request
        .validate()
        .map_err(|e| AppError::new(StatusCode::BAD_REQUEST, Some(e)))?;

    let user = UserRecord::find_by_email(&state.store, &request.email)
        .await?
        .ok_or_else(|| AppError::new(StatusCode::NOT_FOUND, Some("User not found")))?;

    let code = generate_code();

    // Persist first: a code must never be emailed without also being the
    // value on record. A send failure after this point leaves the new code
    // valid.
    user.persist_verification_code(&state.store, &code).await?;

    state
        .verification_code_sender
        .send_code(&user.email, &code)
        .await?;

    tracing::info!(email = %user.email, "Verification code sent");

    // The code itself stays out of the response; it only travels by email.
    Ok((StatusCode::OK, Json(SuccessResponse { success: true })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::ErrorResponse,
        test_utils::{route_builder::RouteBuilder, test_context::TestContext},
    };
    use http::Method;
    use serde_json::json;
    use testresult::TestResult;

    #[test_log::test(tokio::test)]
    async fn test_missing_email_is_a_client_error() -> TestResult {
        let ctx = TestContext::new();

        let (status, response) = RouteBuilder::new(ctx.app(), Method::POST, "/send-verification")
            .with_json_body(json!({}))?
            .into_json_response::<ErrorResponse>()
            .await?;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(!response.errors.is_empty());
        // Failed fast: the store was never consulted, nothing was sent.
        assert_eq!(ctx.store().read_count(), 0);
        assert!(ctx.verification_code_sender().get_emails().is_empty());

        Ok(())
    }

    #[test_log::test(tokio::test)]
    async fn test_empty_email_is_a_client_error() -> TestResult {
        let ctx = TestContext::new();

        let (status, _) = RouteBuilder::new(ctx.app(), Method::POST, "/send-verification")
            .with_json_body(json!({ "email": "" }))?
            .into_json_response::<ErrorResponse>()
            .await?;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(ctx.store().read_count(), 0);

        Ok(())
    }

    #[test_log::test(tokio::test)]
    async fn test_unknown_user_is_not_found() -> TestResult {
        let ctx = TestContext::new();

        let (status, _) = RouteBuilder::new(ctx.app(), Method::POST, "/send-verification")
            .with_json_body(json!({ "email": "nobody@example.com" }))?
            .into_json_response::<ErrorResponse>()
            .await?;

        assert_eq!(status, StatusCode::NOT_FOUND);
        // No write, no email.
        assert!(ctx.call_log().entries().contains(&"store.find_user".to_string()));
        assert!(!ctx
            .call_log()
            .entries()
            .contains(&"store.set_verification_code".to_string()));
        assert!(ctx.verification_code_sender().get_emails().is_empty());

        Ok(())
    }

    #[test_log::test(tokio::test)]
    async fn test_sends_the_code_it_persisted() -> TestResult {
        let ctx = TestContext::new();
        ctx.store().add_user("u1", "user@example.com");

        let (status, response) = RouteBuilder::new(ctx.app(), Method::POST, "/send-verification")
            .with_json_body(json!({ "email": "user@example.com" }))?
            .into_json_response::<SuccessResponse>()
            .await?;

        assert_eq!(status, StatusCode::OK);
        assert!(response.success);

        let emails = ctx.verification_code_sender().get_emails();
        assert_eq!(emails.len(), 1);
        let (to, code) = &emails[0];
        assert_eq!(to, "user@example.com");
        assert_eq!(code.len(), 6);
        assert!((100_000..=999_999).contains(&code.parse::<u32>()?));

        // The stored code equals the emailed code.
        assert_eq!(ctx.store().verification_code_of("u1"), Some(code.clone()));

        Ok(())
    }

    #[test_log::test(tokio::test)]
    async fn test_persists_before_sending() -> TestResult {
        let ctx = TestContext::new();
        ctx.store().add_user("u1", "user@example.com");

        let (status, _) = RouteBuilder::new(ctx.app(), Method::POST, "/send-verification")
            .with_json_body(json!({ "email": "user@example.com" }))?
            .into_json_response::<SuccessResponse>()
            .await?;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            ctx.call_log().entries(),
            vec![
                "store.find_user".to_string(),
                "store.set_verification_code".to_string(),
                "mail.send_code".to_string(),
            ]
        );

        Ok(())
    }

    #[test_log::test(tokio::test)]
    async fn test_mail_failure_keeps_the_persisted_code() -> TestResult {
        let ctx = TestContext::new();
        ctx.store().add_user("u1", "user@example.com");
        ctx.verification_code_sender().fail_sends();

        let (status, _) = RouteBuilder::new(ctx.app(), Method::POST, "/send-verification")
            .with_json_body(json!({ "email": "user@example.com" }))?
            .into_json_response::<ErrorResponse>()
            .await?;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

        // Accepted inconsistency: the new code is on record even though the
        // caller was told the operation failed.
        let stored = ctx.store().verification_code_of("u1");
        assert!(stored.is_some());
        assert_eq!(stored.unwrap().len(), 6);

        Ok(())
    }

    #[test_log::test(tokio::test)]
    async fn test_store_failure_aborts_before_any_send() -> TestResult {
        let ctx = TestContext::new();
        ctx.store().add_user("u1", "user@example.com");
        ctx.store().fail_writes();

        let (status, _) = RouteBuilder::new(ctx.app(), Method::POST, "/send-verification")
            .with_json_body(json!({ "email": "user@example.com" }))?
            .into_json_response::<ErrorResponse>()
            .await?;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(ctx.verification_code_sender().get_emails().is_empty());

        Ok(())
    }

    #[test_log::test(tokio::test)]
    async fn test_duplicate_emails_resolve_to_the_first_match() -> TestResult {
        let ctx = TestContext::new();
        ctx.store().add_user("u1", "user@example.com");
        ctx.store().add_user("u2", "user@example.com");

        let (status, _) = RouteBuilder::new(ctx.app(), Method::POST, "/send-verification")
            .with_json_body(json!({ "email": "user@example.com" }))?
            .into_json_response::<SuccessResponse>()
            .await?;

        assert_eq!(status, StatusCode::OK);
        assert!(ctx.store().verification_code_of("u1").is_some());
        assert!(ctx.store().verification_code_of("u2").is_none());

        Ok(())
    }

    #[test_log::test(tokio::test)]
    async fn test_each_issuance_overwrites_the_previous_code() -> TestResult {
        let ctx = TestContext::new();
        ctx.store().add_user("u1", "user@example.com");

        for _ in 0..2 {
            let (status, _) = RouteBuilder::new(ctx.app(), Method::POST, "/send-verification")
                .with_json_body(json!({ "email": "user@example.com" }))?
                .into_json_response::<SuccessResponse>()
                .await?;
            assert_eq!(status, StatusCode::OK);
        }

        let emails = ctx.verification_code_sender().get_emails();
        assert_eq!(emails.len(), 2);
        // Only the most recently generated code is on record.
        assert_eq!(
            ctx.store().verification_code_of("u1"),
            Some(emails[1].1.clone())
        );

        Ok(())
    }
}
