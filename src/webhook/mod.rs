//! Webhook handlers for external integrations
//!
//! ## Modules
//!
//! - [`whatsapp`] - WhatsApp Business API webhook: handshake, signature check
//!   and message admission
//! - [`routes`] - route registration
//! - [`errors`] - failures answered with an HTTP error status

pub mod errors;
pub mod routes;
pub mod whatsapp;

use crate::chat::{CheckoutInfo, ImplChatEngine};
use std::sync::Arc;

/// Process-wide values the webhook pipeline needs, fixed at startup
#[derive(Clone)]
pub struct WebhookSettings {
    /// Token expected in `hub.verify_token` during the handshake
    pub verify_token: String,
    /// Meta app secret, HMAC key of `X-Hub-Signature-256`
    pub app_secret: String,
    /// The bot's own phone number
    pub host_number: String,
    /// Messages at least this many minutes old are dropped
    pub stale_msg_timeout_mins: i64,
    /// Passed through to the chat engine
    pub is_auto_inc: bool,
}

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<WebhookSettings>,
    pub checkout: Arc<CheckoutInfo>,
    pub chat_engine: ImplChatEngine,
}
