//! Dispatch events and the notification payload derived from them.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Location text used when a dispatch carries no address.
const UNKNOWN_LOCATION: &str = "Unknown location";

/// A record describing an incident requiring responder notification.
///
/// Created by the upstream dispatch-creation flow and immutable once it
/// reaches this server; we read it exactly once, at creation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DispatchEvent {
    /// Store-assigned document identifier
    pub id: String,
    /// Free-text address of the incident
    #[serde(default)]
    pub user_address: Option<String>,
    /// Ordered list of responder identities to notify
    #[serde(default)]
    pub responder_emails: Vec<String>,
}

impl DispatchEvent {
    /// The human-readable incident location.
    pub fn location(&self) -> &str {
        self.user_address.as_deref().unwrap_or(UNKNOWN_LOCATION)
    }

    /// Build the multicast payload for this dispatch.
    pub fn push_payload(&self) -> PushPayload {
        let location = self.location();

        PushPayload {
            notification: PushNotification {
                title: "🚨 Dispatch Alert!".to_string(),
                body: format!("You have been dispatched to: {location}"),
            },
            data: PushData {
                r#type: "dispatch".to_string(),
                location: location.to_string(),
            },
        }
    }
}

/// The multicast payload handed to the push channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushPayload {
    /// Human-readable notification block
    pub notification: PushNotification,
    /// Structured data block consumed by the client app
    pub data: PushData,
}

/// Title and body rendered by the device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushNotification {
    /// Notification title
    pub title: String,
    /// Notification body
    pub body: String,
}

/// Structured data block routed to the client app.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushData {
    /// Message discriminator, always `"dispatch"`
    pub r#type: String,
    /// The incident location, mirrored from the notification body
    pub location: String,
}
