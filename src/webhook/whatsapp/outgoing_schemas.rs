//! # WhatsApp Outgoing Message Schemas
//!
//! Payloads sent to the WhatsApp Business API `messages` endpoint and the
//! response it returns.

use serde::{Deserialize, Serialize};

/// Text message to send to WhatsApp
#[derive(Debug, Serialize, Deserialize)]
pub struct OutgoingTextMessage {
    /// Messaging product, always "whatsapp"
    pub messaging_product: String,
    /// Recipient's WhatsApp ID (phone number)
    pub to: String,
    /// Message type
    #[serde(rename = "type")]
    pub msg_type: String,
    /// Text content
    pub text: OutgoingTextContent,
}

impl OutgoingTextMessage {
    /// Creates a new text message
    pub fn new(to: String, body: String) -> Self {
        Self {
            messaging_product: "whatsapp".to_string(),
            to,
            msg_type: "text".to_string(),
            text: OutgoingTextContent { body },
        }
    }
}

/// Text content for outgoing messages
#[derive(Debug, Serialize, Deserialize)]
pub struct OutgoingTextContent {
    /// Message body text
    pub body: String,
}

/// Response from WhatsApp API after sending a message
#[derive(Debug, Serialize, Deserialize)]
pub struct WhatsAppMessageResponse {
    /// Messaging product
    pub messaging_product: String,
    /// Array of contacts (recipients)
    #[serde(default)]
    pub contacts: Vec<WhatsAppContact>,
    /// Array of messages sent
    #[serde(default)]
    pub messages: Vec<WhatsAppMessageStatus>,
}

/// Contact information in response
#[derive(Debug, Serialize, Deserialize)]
pub struct WhatsAppContact {
    /// WhatsApp ID of the contact
    pub wa_id: String,
    /// Input phone number
    pub input: String,
}

/// Message status in response
#[derive(Debug, Serialize, Deserialize)]
pub struct WhatsAppMessageStatus {
    /// Message ID
    pub id: String,
}
