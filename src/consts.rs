pub const SIGNATURE_HEADER: &str = "X-Hub-Signature-256";
pub const SIGNATURE_PREFIX: &str = "sha256=";

/// Largest delivery body read before the signature is checked (1 MiB)
pub const MAX_BODY_SIZE: usize = 1_048_576;

pub const WEBHOOK_ACK_BODY: &str = "Success";
pub const WRONG_VERIFY_TOKEN_BODY: &str = "Error, wrong validation token.";

/// Sentinel the platform uses for a message without a timestamp
pub const MISSING_TIMESTAMP_SENTINEL: &str = "-1";

/// Whether the chat engine tables use auto-incrementing ids
pub const IS_AUTO_INC: bool = false;

pub const PAYMENT_RETURN_PATH: &str = "/payment_return";
pub const PAYMENT_CANCEL_PATH: &str = "/payment_canceled";
pub const PAYMENT_NOTIFY_PATH: &str = "/payment_notify";
pub const ITEM_NAME_PREFIX: &str = "Order";
