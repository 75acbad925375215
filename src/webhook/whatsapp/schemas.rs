//! # WhatsApp Webhook Schemas
//!
//! Typed shape of the JSON envelope WhatsApp posts to the webhook:
//! `object → entry[] → changes[] → value`. A `value` carries either
//! `contacts[]`/`messages[]` (inbound messages) or `statuses[]` (delivery
//! receipts for messages the bot sent).
//!
//! Two views of the envelope live here:
//! - [`WebhookPayload`]: the message shape, one nominal type per level, so a
//!   non conforming body fails as a whole at parse time.
//! - [`DeliveryProbe`]: a tolerant partial view that only counts `statuses`
//!   and `messages` per change. It is used to classify a delivery before the
//!   message shape is attempted.

use serde::{Deserialize, de::IgnoredAny};

/// Root webhook payload from WhatsApp (message shape)
#[derive(Debug, Deserialize)]
pub struct WebhookPayload {
    /// The object type, typically "whatsapp_business_account"
    #[serde(default)]
    pub object: String,
    /// Array of entry objects containing the actual data
    pub entry: Vec<Entry>,
}

/// Entry object containing changes
#[derive(Debug, Deserialize)]
pub struct Entry {
    /// Business Account ID
    #[serde(default)]
    pub id: String,
    /// Array of changes that occurred
    pub changes: Vec<Change>,
}

/// Change object containing the actual webhook data
#[derive(Debug, Deserialize)]
pub struct Change {
    /// The field that changed (e.g., "messages")
    #[serde(default)]
    pub field: String,
    /// The value containing the actual data
    pub value: Value,
}

/// Value object containing messages and metadata
#[derive(Debug, Deserialize)]
pub struct Value {
    /// Messaging product (e.g., "whatsapp")
    #[serde(default)]
    pub messaging_product: String,
    /// Metadata about the phone number
    pub metadata: Option<Metadata>,
    /// Array of contacts (senders)
    #[serde(default)]
    pub contacts: Vec<Contact>,
    /// Array of messages received
    #[serde(default)]
    pub messages: Vec<Message>,
}

/// Metadata about the WhatsApp Business phone number
#[derive(Debug, Deserialize)]
pub struct Metadata {
    /// Display name of the business phone number
    pub display_phone_number: String,
    /// Phone number ID
    pub phone_number_id: String,
}

/// Contact information for the message sender
#[derive(Debug, Deserialize)]
pub struct Contact {
    /// Profile information
    pub profile: Option<Profile>,
    /// WhatsApp ID (phone number)
    pub wa_id: String,
}

/// Profile information
#[derive(Debug, Deserialize)]
pub struct Profile {
    /// Display name of the contact
    pub name: String,
}

/// Message object
#[derive(Debug, Deserialize)]
pub struct Message {
    /// Sender's WhatsApp ID (phone number)
    pub from: String,
    /// Message ID
    #[serde(default)]
    pub id: String,
    /// Seconds since epoch, as a decimal string
    #[serde(default)]
    pub timestamp: String,
    /// Message type (text, image, interactive, ...)
    #[serde(rename = "type", default)]
    pub msg_type: String,
    /// Text message content (if type is "text")
    pub text: Option<TextMessage>,
}

/// Text message content
#[derive(Debug, Deserialize)]
pub struct TextMessage {
    /// The text body of the message
    pub body: String,
}

/// Partial view of the envelope used for classification
#[derive(Debug, Default, Deserialize)]
pub struct DeliveryProbe {
    #[serde(default)]
    pub entry: Vec<ProbeEntry>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProbeEntry {
    #[serde(default)]
    pub changes: Vec<ProbeChange>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProbeChange {
    #[serde(default)]
    pub value: ProbeValue,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProbeValue {
    #[serde(default)]
    pub statuses: Vec<IgnoredAny>,
    #[serde(default)]
    pub messages: Vec<IgnoredAny>,
}

impl DeliveryProbe {
    fn values(&self) -> impl Iterator<Item = &ProbeValue> {
        self.entry
            .iter()
            .flat_map(|entry| &entry.changes)
            .map(|change| &change.value)
    }

    /// Number of status receipts carried by the delivery
    pub fn status_count(&self) -> usize {
        self.values().map(|value| value.statuses.len()).sum()
    }

    /// Number of inbound messages carried by the delivery
    pub fn message_count(&self) -> usize {
        self.values().map(|value| value.messages.len()).sum()
    }
}
