//! Helpers for running isolated webserver instances
use crate::{
    app_state::{AppState, AppStateBuilder},
    router::setup_app_router,
    setups::test::{
        CallLog, TestDocumentStore, TestPushSender, TestSetup, TestVerificationCodeSender,
    },
};
use axum::Router;

/// A reference to a running responder server in an isolated test environment
#[derive(Debug)]
pub(crate) struct TestContext {
    app: Router,
    app_state: AppState<TestSetup>,
    call_log: CallLog,
}

impl TestContext {
    /// Create a new test context
    pub(crate) fn new() -> Self {
        let call_log = CallLog::default();

        let app_state = AppStateBuilder::<TestSetup>::default()
            .with_store(TestDocumentStore::new(call_log.clone()))
            .with_push_sender(TestPushSender::default())
            .with_verification_code_sender(TestVerificationCodeSender::new(call_log.clone()))
            .finalize()
            .unwrap();

        let app = setup_app_router(app_state.clone());

        Self {
            app,
            app_state,
            call_log,
        }
    }

    pub(crate) fn app(&self) -> Router {
        self.app.clone()
    }

    pub(crate) fn store(&self) -> &TestDocumentStore {
        &self.app_state.store
    }

    pub(crate) fn push_sender(&self) -> &TestPushSender {
        &self.app_state.push_sender
    }

    pub(crate) fn verification_code_sender(&self) -> &TestVerificationCodeSender {
        &self.app_state.verification_code_sender
    }

    pub(crate) fn call_log(&self) -> &CallLog {
        &self.call_log
    }
}
