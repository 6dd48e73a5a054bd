//! The dispatch fan-out pipeline.
//!
//! One invocation per created dispatch: resolve responder identities to
//! device tokens, then multicast a single notification. Best-effort, single
//! attempt, no retry.

use crate::{
    app_state::AppState,
    models::{device_token::DeviceToken, dispatch_event::DispatchEvent},
    setups::{PushNotificationSender as _, ServerSetup},
};
use anyhow::Result;

/// Notify every registered responder device about a freshly created
/// dispatch.
///
/// Dispatches without responders, and responders without registered
/// devices, short-circuit cleanly. A failing multicast fails this
/// invocation; the dispatch record itself was already persisted upstream
/// and is unaffected.
pub async fn notify_responders<S: ServerSetup>(
    state: &AppState<S>,
    event: &DispatchEvent,
) -> Result<()> {
    if event.responder_emails.is_empty() {
        tracing::debug!(dispatch_id = %event.id, "Dispatch has no responders, skipping fan-out");
        return Ok(());
    }

    let tokens = DeviceToken::lookup_for_identities(&state.store, &event.responder_emails).await?;

    if tokens.is_empty() {
        tracing::debug!(
            dispatch_id = %event.id,
            "No registered devices among responders, skipping fan-out"
        );
        return Ok(());
    }

    state.push_sender.send(&tokens, &event.push_payload()).await?;

    tracing::info!(
        dispatch_id = %event.id,
        responders = ?event.responder_emails,
        "Notification sent to responders"
    );

    Ok(())
}
