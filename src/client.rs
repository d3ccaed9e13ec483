use async_trait::async_trait;
use dotenv::dotenv;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::env;
use tracing::{debug, info};

use crate::auth::MailRelayAuth;
use crate::errors::{ServiceError, ServiceResult};
use crate::services::notifier::NotificationSink;

/// One outgoing message for the relay.
#[derive(Debug, Serialize)]
pub struct SendMessageRequest {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub text: String,
    pub html: String,
}

#[derive(Debug, Deserialize)]
pub struct SendMessageResponse {
    pub message_id: String,
    pub accepted: bool,
}

/// Client for the mail relay API that delivers rendered notifications.
pub struct MailRelayClient {
    client: Client,
    secret_id: String,
    secret_key: String,
    endpoint: String,
    sender: String,
}

impl MailRelayClient {
    /// Create a new mail relay client from environment variables
    pub fn new() -> Self {
        dotenv().ok();

        Self {
            client: Client::new(),
            secret_id: env::var("MAIL_RELAY_SECRET_ID")
                .expect("MAIL_RELAY_SECRET_ID must be set in environment"),
            secret_key: env::var("MAIL_RELAY_SECRET_KEY")
                .expect("MAIL_RELAY_SECRET_KEY must be set in environment"),
            endpoint: env::var("MAIL_RELAY_API_ENDPOINT")
                .unwrap_or_else(|_| "https://mail-relay.internal".to_string()),
            sender: env::var("MAIL_RELAY_SENDER")
                .unwrap_or_else(|_| "no-reply@example.com".to_string()),
        }
    }

    fn generate_signature(
        &self,
        method: &str,
        uri: &str,
        timestamp: i64,
        nonce: &str,
        body: &str,
    ) -> String {
        MailRelayAuth::generate_signature(
            &self.secret_id,
            &self.secret_key,
            method,
            uri,
            timestamp,
            nonce,
            body,
        )
    }

    /// Submit one message to the relay.
    pub async fn send_message(
        &self,
        request: &SendMessageRequest,
    ) -> ServiceResult<SendMessageResponse> {
        let method = "POST";
        let uri = "/v1/messages";
        let url = format!("{}{}", self.endpoint, uri);

        let timestamp = MailRelayAuth::get_timestamp();
        let nonce = MailRelayAuth::generate_nonce();
        let request_body = serde_json::to_string(request)
            .map_err(|e| ServiceError::store(format!("Failed to serialize message: {}", e)))?;

        let signature = self.generate_signature(method, uri, timestamp, &nonce, &request_body);

        info!("Submitting message to mail relay for {}", request.to);
        debug!("API URL: {}", url);

        let res = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .header("X-MR-Key", &self.secret_id)
            .header("X-MR-Timestamp", timestamp.to_string())
            .header("X-MR-Nonce", &nonce)
            .header("X-MR-Signature", signature)
            .body(request_body)
            .send()
            .await?;

        info!("Response received with status: {}", res.status());

        let response = res.error_for_status()?.json::<SendMessageResponse>().await?;
        Ok(response)
    }
}

impl Default for MailRelayClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NotificationSink for MailRelayClient {
    async fn send(
        &self,
        recipient_email: &str,
        subject: &str,
        text_body: &str,
        html_body: &str,
    ) -> ServiceResult<()> {
        let request = SendMessageRequest {
            from: self.sender.clone(),
            to: recipient_email.to_string(),
            subject: subject.to_string(),
            text: text_body.to_string(),
            html: html_body.to_string(),
        };

        let response = self.send_message(&request).await?;

        if !response.accepted {
            return Err(ServiceError::delivery(
                recipient_email,
                format!("relay rejected message {}", response.message_id),
            ));
        }

        Ok(())
    }
}
