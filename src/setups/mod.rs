//! This abstracts responder-server side-effects into "setups".
//!
//! This module defines the traits, submodules define test & production
//! collections of implementations.
use crate::models::{device_token::DeviceToken, dispatch_event::PushPayload, user::UserRecord};
use anyhow::Result;
use async_trait::async_trait;

pub mod prod;

/// This trait groups type parameters to the server's `AppState` struct.
///
/// It captures the setup of the server, distinguishing between e.g.
/// unit testing & production setups.
pub trait ServerSetup: Clone + Send + Sync + 'static {
    /// Which implementation of the backing document store to use
    type Store: DocumentStore;
    /// Which implementation to use to multicast push notifications
    type PushSender: PushNotificationSender;
    /// Which implementation to use to send verification codes
    type VerificationCodeSender: VerificationCodeSender;
}

/// The document store holding user records and device-token registrations.
///
/// The store itself is an external system; this trait is the query contract
/// the pipelines rely on. Production talks to it over HTTP, tests plug in an
/// in-memory double.
#[async_trait]
pub trait DocumentStore: Clone + Send + Sync + 'static {
    /// Exact-match lookup of a user record by email, limited to the first
    /// match. Duplicate emails are resolved upstream; whichever record the
    /// store yields first wins.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>>;

    /// Overwrite the verification code on a user record.
    async fn set_verification_code(&self, user_id: &str, code: &str) -> Result<()>;

    /// One batched `in`-style device-token query. `emails` must not exceed
    /// [batch_limit](Self::batch_limit); callers chunk longer lists.
    async fn device_tokens_for(&self, emails: &[String]) -> Result<Vec<DeviceToken>>;

    /// The maximum number of values the store accepts per `in`-style query.
    fn batch_limit(&self) -> usize;

    /// Cheap connectivity probe for healthchecks.
    async fn ping(&self) -> Result<()>;
}

/// The service that multicasts one dispatch notification to a set of devices
#[async_trait]
pub trait PushNotificationSender: Clone + Send + Sync + 'static {
    /// Send the payload to every device token in one batch.
    ///
    /// Whole-batch success or failure; per-token outcomes (e.g. stale
    /// tokens) are not reported back.
    async fn send(&self, tokens: &[String], payload: &PushPayload) -> Result<()>;
}

/// The service that sends account verification codes
#[async_trait]
pub trait VerificationCodeSender: Clone + Send + Sync + 'static {
    /// Send the code associated with the email
    async fn send_code(&self, email: &str, code: &str) -> Result<()>;
}
