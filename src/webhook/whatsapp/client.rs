//! # WhatsApp API Client
//!
//! Client for sending replies through the WhatsApp Business API.

use super::outgoing_schemas::{OutgoingTextMessage, WhatsAppMessageResponse};
use crate::config::AppConfig;
use anyhow::{Context, Result};

/// WhatsApp API client for sending messages
pub struct WhatsAppClient {
    /// HTTP client for making API requests
    client: reqwest::Client,
    /// WhatsApp Business API endpoint for sending messages
    endpoint: String,
    /// Authentication token
    auth_token: String,
}

impl WhatsAppClient {
    /// Creates a new WhatsApp client
    pub fn new(endpoint: String, auth_token: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
            auth_token,
        }
    }

    /// Creates a client for the configured business phone number
    pub fn from_config(app_config: &AppConfig) -> Self {
        Self::new(
            app_config.whatsapp_send_msg_endpoint(),
            app_config.whatsapp_business_auth.clone(),
        )
    }

    /// Sends a text message
    ///
    /// # Arguments
    /// * `to` - Recipient's WhatsApp ID (phone number with country code)
    /// * `body` - Message text
    pub async fn send_text_message(
        &self,
        to: String,
        body: String,
    ) -> Result<WhatsAppMessageResponse> {
        let message = OutgoingTextMessage::new(to, body);
        self.send_message(&message).await
    }

    async fn send_message<T: serde::Serialize>(
        &self,
        message: &T,
    ) -> Result<WhatsAppMessageResponse> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.auth_token)
            .json(message)
            .send()
            .await
            .context("Failed to send request to WhatsApp API")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read response body".to_string());

            anyhow::bail!("WhatsApp API returned error status {}: {}", status, body);
        }

        response
            .json()
            .await
            .context("Failed to parse WhatsApp API response")
    }
}
