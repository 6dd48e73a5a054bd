//! Device-token registrations and the batched lookup over them.

use crate::setups::DocumentStore;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

/// One device registration: an identity mapped to an opaque push-routing
/// token. Owned by the device-registration subsystem; we only read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceToken {
    /// Email the device registered under
    pub email: String,
    /// Opaque push-routing token
    pub token: String,
}

impl DeviceToken {
    /// Resolve a list of identities to the deduplicated set of their device
    /// tokens.
    ///
    /// The store caps the number of values per `in`-style query, so identity
    /// lists longer than [DocumentStore::batch_limit] are chunked into
    /// multiple queries and the results merged. Identities without a
    /// registration simply contribute nothing.
    pub async fn lookup_for_identities<D: DocumentStore>(
        store: &D,
        emails: &[String],
    ) -> Result<Vec<String>> {
        let mut seen = HashSet::new();
        let identities: Vec<String> = emails
            .iter()
            .filter(|email| seen.insert(email.as_str()))
            .cloned()
            .collect();

        let batch_limit = store.batch_limit().max(1);
        let mut tokens = BTreeSet::new();

        for chunk in identities.chunks(batch_limit) {
            for registration in store.device_tokens_for(chunk).await? {
                tokens.insert(registration.token);
            }
        }

        tracing::debug!(
            identities = identities.len(),
            tokens = tokens.len(),
            "Resolved responder identities to device tokens"
        );

        Ok(tokens.into_iter().collect())
    }
}
