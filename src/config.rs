//! Application configuration management with security considerations.
//!
//! All values are read once from the environment at startup and handed to the
//! web server through the application state; nothing reads the environment
//! after that.
//!
//! # Security Notes
//! - Sensitive fields are clearly marked and should never be logged
//! - `AppConfig` has no `Debug` implementation

use crate::{chat::CheckoutInfo, consts, webhook::WebhookSettings};
use anyhow::Context;
use envconfig::Envconfig;

/// Application configuration with security-aware field management.
///
/// # Security Requirements
/// - All `SENSITIVE` fields must be stored securely (encrypted at rest)
/// - Never log or expose sensitive values
#[derive(Envconfig, Clone)]
pub struct AppConfig {
    /// Environment name to deploy the app (NON-SENSITIVE)
    /// Values: "local", "dev", "staging", "prod"
    #[envconfig(default = "local")]
    pub env: String,

    /// Host address for web server binding (NON-SENSITIVE)
    #[envconfig(default = "0.0.0.0")]
    pub wep_server_host: String,

    /// Port for web server binding (NON-SENSITIVE)
    #[envconfig(from = "PORT")]
    pub wep_server_port: u16,

    /// Path to SSL private key file (SENSITIVE PATH)
    #[envconfig(default = "server.key")]
    pub private_key_path: String,

    /// Path to SSL certificate file (NON-SENSITIVE)
    #[envconfig(default = "server.crt")]
    pub certificate_path: String,

    /// SENSITIVE: Logfire write token, console only logging when absent
    pub logfire_token: Option<String>,

    /// SENSITIVE: Token WhatsApp echoes back during the webhook handshake
    #[envconfig(from = "VERIFY_TOKEN")]
    pub whatsapp_verify_token: String,

    /// SENSITIVE: Meta app secret used to sign webhook deliveries
    #[envconfig(from = "APP_SECRET")]
    pub whatsapp_app_secret: String,

    /// Phone number the bot sends from (SEMI-SENSITIVE)
    /// Deliveries coming from this number are treated as self-echoes.
    #[envconfig(from = "HOST_NUMBER")]
    pub whatsapp_host_number: String,

    /// Minutes after which an inbound message is no longer answered (NON-SENSITIVE)
    #[envconfig(default = "10")]
    pub stale_msg_timeout_mins: i64,

    /// WhatsApp Business phone number ID (SEMI-SENSITIVE)
    #[envconfig(from = "PHONE_ID")]
    pub whatsapp_business_phone_number_id: u64,

    /// SENSITIVE: WhatsApp Business authentication token
    #[envconfig(from = "WHATSAPP_TOKEN")]
    pub whatsapp_business_auth: String,

    /// Reply the default chat engine sends back (NON-SENSITIVE)
    #[envconfig(default = "Hi! We got your message and will get back to you shortly.")]
    pub chat_greeting: String,

    /// Public base URL used to build payment return links (NON-SENSITIVE)
    /// Example: "https://bot.example.com"
    #[envconfig(from = "HOMEBASEURL")]
    pub homebase_url: String,

    /// Payment gateway merchant ID (SEMI-SENSITIVE)
    #[envconfig(from = "MERCHANTID")]
    pub merchant_id: String,

    /// SENSITIVE: Payment gateway merchant key
    #[envconfig(from = "MERCHANTKEY")]
    pub merchant_key: String,

    /// SENSITIVE: Payment gateway signature passphrase
    #[envconfig(from = "PASSPHRASE")]
    pub passphrase: String,

    /// Payment gateway host (NON-SENSITIVE)
    #[envconfig(from = "PFHOST")]
    pub pf_host: String,
}

impl AppConfig {
    /// Checks if running in production environment
    pub fn is_prod(&self) -> bool {
        self.env.to_lowercase() == "prod"
    }

    /// Settings consumed by the webhook admission pipeline
    pub fn webhook_settings(&self) -> WebhookSettings {
        WebhookSettings {
            verify_token: self.whatsapp_verify_token.clone(),
            app_secret: self.whatsapp_app_secret.clone(),
            host_number: self.whatsapp_host_number.clone(),
            stale_msg_timeout_mins: self.stale_msg_timeout_mins,
            is_auto_inc: consts::IS_AUTO_INC,
        }
    }

    /// Checkout links and merchant credentials handed to the chat engine
    pub fn checkout_info(&self) -> CheckoutInfo {
        let base = self.homebase_url.trim_end_matches('/');

        CheckoutInfo {
            return_url: format!("{base}{}", consts::PAYMENT_RETURN_PATH),
            cancel_url: format!("{base}{}", consts::PAYMENT_CANCEL_PATH),
            notify_url: format!("{base}{}", consts::PAYMENT_NOTIFY_PATH),
            merchant_id: self.merchant_id.clone(),
            merchant_key: self.merchant_key.clone(),
            passphrase: self.passphrase.clone(),
            host_url: self.pf_host.clone(),
            item_name_prefix: consts::ITEM_NAME_PREFIX.to_string(),
        }
    }

    /// Constructs the WhatsApp Business API endpoint for sending messages
    pub fn whatsapp_send_msg_endpoint(&self) -> String {
        format!(
            "https://graph.facebook.com/v22.0/{id}/messages",
            id = self.whatsapp_business_phone_number_id
        )
    }
}

/// Loads the configuration from the environment.
///
/// Fails when a required variable is missing or the port / threshold can not
/// be parsed.
pub fn init_config() -> anyhow::Result<AppConfig> {
    let app_config = AppConfig::init_from_env()
        .context("Failed to load application configuration. Check environment variables.")?;

    if app_config.stale_msg_timeout_mins <= 0 {
        anyhow::bail!(
            "STALE_MSG_TIMEOUT_MINS must be a positive number of minutes, got {}",
            app_config.stale_msg_timeout_mins
        );
    }

    Ok(app_config)
}
