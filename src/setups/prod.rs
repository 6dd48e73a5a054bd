//! Production server setup code

use crate::{
    models::{device_token::DeviceToken, dispatch_event::PushPayload, user::UserRecord},
    settings,
    setups::{DocumentStore, PushNotificationSender, ServerSetup, VerificationCodeSender},
};
use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use lettre::{
    message::header::ContentType, message::Mailbox, transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware, RequestBuilder};
use serde::{Deserialize, Serialize};
use url::Url;

/// Production implementation of `ServerSetup`.
/// Actually calls out to the services configured in `settings.toml`.
#[derive(Clone, Debug, Default)]
pub struct ProdSetup;

impl ServerSetup for ProdSetup {
    type Store = HttpDocumentStore;
    type PushSender = HttpPushSender;
    type VerificationCodeSender = SmtpCodeSender;
}

/// An implementation of `DocumentStore` which talks to the document-store
/// HTTP API configured in `settings.toml`.
#[derive(Clone, Debug)]
pub struct HttpDocumentStore {
    client: ClientWithMiddleware,
    base_url: Url,
    batch_limit: usize,
}

#[derive(Serialize)]
struct DocumentQuery<'a> {
    field: &'a str,
    values: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    limit: Option<usize>,
}

#[derive(Deserialize)]
struct QueryResponse<T> {
    documents: Vec<T>,
}

#[derive(Serialize)]
struct UserPatch<'a> {
    verification_code: &'a str,
}

impl HttpDocumentStore {
    /// Connect to the document store configured in the settings.
    pub fn new(settings: &settings::Store) -> Result<Self> {
        Self::new_with(ClientBuilder::new(Default::default()).build(), settings)
    }

    /// Connect to the document store with the given client.
    pub fn new_with(client: ClientWithMiddleware, settings: &settings::Store) -> Result<Self> {
        Ok(Self {
            client,
            base_url: Url::parse(&settings.api_url)?,
            batch_limit: settings.batch_limit,
        })
    }

    fn rpc(&self, method: http::Method, path: &str) -> RequestBuilder {
        let mut url = self.base_url.clone();
        url.set_path(path);

        tracing::debug!(%method, %url, "Calling document store");
        self.client.request(method, url)
    }
}

#[async_trait]
impl DocumentStore for HttpDocumentStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        let values = [email.to_string()];
        let response = self
            .rpc(http::Method::POST, "/v1/users/query")
            .json(&DocumentQuery {
                field: "email",
                values: &values,
                limit: Some(1),
            })
            .send()
            .await?
            .error_for_status()?
            .json::<QueryResponse<UserRecord>>()
            .await?;

        Ok(response.documents.into_iter().next())
    }

    async fn set_verification_code(&self, user_id: &str, code: &str) -> Result<()> {
        self.rpc(http::Method::PATCH, &format!("/v1/users/{user_id}"))
            .json(&UserPatch {
                verification_code: code,
            })
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }

    async fn device_tokens_for(&self, emails: &[String]) -> Result<Vec<DeviceToken>> {
        if emails.len() > self.batch_limit {
            bail!(
                "device-token query with {} values exceeds the store batch limit of {}",
                emails.len(),
                self.batch_limit
            );
        }

        let response = self
            .rpc(http::Method::POST, "/v1/device-tokens/query")
            .json(&DocumentQuery {
                field: "email",
                values: emails,
                limit: None,
            })
            .send()
            .await?
            .error_for_status()?
            .json::<QueryResponse<DeviceToken>>()
            .await?;

        Ok(response.documents)
    }

    fn batch_limit(&self) -> usize {
        self.batch_limit
    }

    async fn ping(&self) -> Result<()> {
        self.rpc(http::Method::GET, "/v1/ping")
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }
}

/// An implementation of `PushNotificationSender` which multicasts through
/// the push-gateway HTTP API.
#[derive(Clone)]
pub struct HttpPushSender {
    client: ClientWithMiddleware,
    endpoint: Url,
    server_key: String,
}

impl std::fmt::Debug for HttpPushSender {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fmt.debug_struct("HttpPushSender")
            .field("endpoint", &self.endpoint)
            .field("server_key", &"<redacted>")
            .finish()
    }
}

#[derive(Serialize)]
struct MulticastRequest<'a> {
    registration_ids: &'a [String],
    #[serde(flatten)]
    payload: &'a PushPayload,
}

impl HttpPushSender {
    /// Create a new push sender from the settings.
    pub fn new(settings: &settings::Push) -> Result<Self> {
        Self::new_with(ClientBuilder::new(Default::default()).build(), settings)
    }

    /// Create a new push sender with the given client.
    pub fn new_with(client: ClientWithMiddleware, settings: &settings::Push) -> Result<Self> {
        Ok(Self {
            client,
            endpoint: Url::parse(&settings.api_url)?,
            server_key: settings.key.clone(),
        })
    }
}

#[async_trait]
impl PushNotificationSender for HttpPushSender {
    async fn send(&self, tokens: &[String], payload: &PushPayload) -> Result<()> {
        tracing::debug!(tokens = tokens.len(), "Multicasting push notification");

        let response = self
            .client
            .post(self.endpoint.clone())
            .header(
                http::header::AUTHORIZATION,
                format!("key={}", self.server_key),
            )
            .json(&MulticastRequest {
                registration_ids: tokens,
                payload,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            bail!(
                "push gateway rejected the multicast: {}",
                response.status()
            );
        }

        Ok(())
    }
}

#[derive(Debug, Clone)]
/// Sends verification codes over SMTP
pub struct SmtpCodeSender {
    settings: settings::Smtp,
}

impl SmtpCodeSender {
    /// Create a new SmtpCodeSender
    pub fn new(settings: settings::Smtp) -> Self {
        Self { settings }
    }

    fn sender(&self) -> Result<Mailbox> {
        format!(
            "\"{}\" <{}>",
            self.settings.from_name, self.settings.from_address
        )
        .parse()
        .map_err(|e| anyhow!("invalid from address in settings: {e}"))
    }

    fn html_body(code: &str) -> String {
        format!(
            r#"<div style="font-family: Arial, sans-serif; text-align: center;">
  <h2>Verification Code</h2>
  <p>Your verification code is:</p>
  <h1 style="color: #A30000;">{code}</h1>
  <p>Enter this code in the app to verify your account.</p>
</div>"#
        )
    }

    fn message(&self, email: &str, code: &str) -> Result<Message> {
        Ok(Message::builder()
            .from(self.sender()?)
            .to(email.parse()?)
            .subject(&self.settings.subject)
            .header(ContentType::TEXT_HTML)
            .body(Self::html_body(code))?)
    }

    fn transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(
            &self.settings.host,
        )?
        .port(self.settings.port);

        if let (Some(username), Some(password)) =
            (&self.settings.username, &self.settings.password)
        {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(builder.build())
    }
}

#[async_trait]
impl VerificationCodeSender for SmtpCodeSender {
    /// Sends the code to the user
    async fn send_code(&self, email: &str, code: &str) -> Result<()> {
        tracing::debug!(
            to = email,
            subject = %self.settings.subject,
            "Sending verification email"
        );

        let message = self.message(email, code)?;
        self.transport()?.send(message).await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn smtp_settings() -> settings::Smtp {
        settings::Smtp {
            host: "localhost".to_string(),
            port: 587,
            username: None,
            password: None,
            from_name: "Apula Responder".to_string(),
            from_address: "noreply@apula.example".to_string(),
            subject: "Your Verification Code".to_string(),
        }
    }

    #[test]
    fn test_message_carries_the_code_in_html() {
        let sender = SmtpCodeSender::new(smtp_settings());
        let message = sender.message("user@example.com", "123456").unwrap();

        let rendered = String::from_utf8_lossy(&message.formatted()).to_string();
        assert!(rendered.contains("123456"));
        assert!(rendered.contains("Your Verification Code"));
    }

    #[test]
    fn test_invalid_recipient_is_rejected() {
        let sender = SmtpCodeSender::new(smtp_settings());

        assert!(sender.message("not-an-email", "123456").is_err());
    }
}
