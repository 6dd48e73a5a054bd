//! User records.

use crate::setups::DocumentStore;
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// A user record as stored in the `users` collection.
///
/// The pipelines read nothing but the email and mutate nothing but the
/// verification code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Store-assigned document identifier
    pub id: String,
    /// Email address associated with the user
    pub email: String,
    /// The currently pending verification code, if any.
    /// Overwritten (never appended) on each issuance; the previous code is
    /// thereby invalidated.
    #[serde(default)]
    pub verification_code: Option<String>,
}

impl UserRecord {
    /// Resolve an email to a user record. First match wins.
    pub async fn find_by_email<D: DocumentStore>(store: &D, email: &str) -> Result<Option<Self>> {
        tracing::debug!(email, "Looking up user record");

        store.find_user_by_email(email).await
    }

    /// Durably attach a freshly generated code to this record.
    ///
    /// Must complete before any delivery attempt is made, so that a code is
    /// never emailed without also being the expected value on record.
    pub async fn persist_verification_code<D: DocumentStore>(
        &self,
        store: &D,
        code: &str,
    ) -> Result<()> {
        tracing::debug!(user_id = %self.id, "Persisting verification code");

        store.set_verification_code(&self.id, code).await
    }
}
