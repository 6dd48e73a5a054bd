//! The Axum Application State

use crate::setups::ServerSetup;
use anyhow::{anyhow, Result};

#[derive(Clone)]
/// Global application route state.
pub struct AppState<S: ServerSetup> {
    /// Handle to the backing document store
    pub store: S::Store,
    /// The service that fans dispatch notifications out to responder devices
    pub push_sender: S::PushSender,
    /// The service that sends account verification codes
    pub verification_code_sender: S::VerificationCodeSender,
}

/// Builder for [`AppState`]
#[derive(Debug)]
pub struct AppStateBuilder<S: ServerSetup> {
    store: Option<S::Store>,
    push_sender: Option<S::PushSender>,
    verification_code_sender: Option<S::VerificationCodeSender>,
}

impl<S: ServerSetup> Default for AppStateBuilder<S> {
    fn default() -> Self {
        Self {
            store: None,
            push_sender: None,
            verification_code_sender: None,
        }
    }
}

impl<S: ServerSetup> AppStateBuilder<S> {
    /// Finalize the builder and return the [`AppState`]
    pub fn finalize(self) -> Result<AppState<S>> {
        let store = self.store.ok_or_else(|| anyhow!("store is required"))?;

        let push_sender = self
            .push_sender
            .ok_or_else(|| anyhow!("push_sender is required"))?;

        let verification_code_sender = self
            .verification_code_sender
            .ok_or_else(|| anyhow!("verification_code_sender is required"))?;

        Ok(AppState {
            store,
            push_sender,
            verification_code_sender,
        })
    }

    /// Set the document store
    pub fn with_store(mut self, store: S::Store) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the service that multicasts dispatch notifications
    pub fn with_push_sender(mut self, push_sender: S::PushSender) -> Self {
        self.push_sender = Some(push_sender);
        self
    }

    /// Set the service that sends account verification codes
    pub fn with_verification_code_sender(
        mut self,
        verification_code_sender: S::VerificationCodeSender,
    ) -> Self {
        self.verification_code_sender = Some(verification_code_sender);
        self
    }
}

impl<S> std::fmt::Debug for AppState<S>
where
    S: ServerSetup,
    S::Store: std::fmt::Debug,
    S::PushSender: std::fmt::Debug,
    S::VerificationCodeSender: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("store", &self.store)
            .field("push_sender", &self.push_sender)
            .field("verification_code_sender", &self.verification_code_sender)
            .finish()
    }
}
