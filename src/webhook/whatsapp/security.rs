//! Security utilities for WhatsApp webhook verification
//!
//! Meta signs every webhook delivery with HMAC-SHA256 using the app secret and
//! sends the result in the `X-Hub-Signature-256` header as
//! `sha256=<hex_signature>`.
//!
//! # Important Notes
//!
//! - Meta computes the signature over its own JSON serialization of the
//!   payload, where every non-ASCII char is written as a `\uXXXX` escape.
//!   The raw body is escaped the same way before hashing, see
//!   [`escape_non_ascii`].
//! - The comparison is constant-time.
//! - Nothing here logs the app secret.

use crate::consts;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Extracts the hex signature from the `X-Hub-Signature-256` header value.
///
/// Returns `None` when the header carries no signature at all, in which case
/// no digest should be computed.
pub fn signature_from_header(header: &str) -> Option<&str> {
    let signature = header
        .trim()
        .strip_prefix(consts::SIGNATURE_PREFIX)
        .unwrap_or(header.trim());

    (!signature.is_empty()).then_some(signature)
}

/// Escapes every char above U+007F as `\uXXXX` (uppercase hex).
///
/// The char is upper-cased first when it has a single-char uppercase form.
/// Chars outside the Basic Multilingual Plane are written as their two UTF-16
/// surrogates, so every escape has exactly four hex digits.
pub fn escape_non_ascii(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    let mut units = [0u16; 2];

    for c in s.chars() {
        if c.is_ascii() {
            escaped.push(c);
            continue;
        }

        let mut upper = c.to_uppercase();
        let c = match (upper.next(), upper.next()) {
            (Some(single), None) => single,
            _ => c,
        };

        for unit in c.encode_utf16(&mut units).iter() {
            escaped.push_str(&format!("\\u{unit:04X}"));
        }
    }

    escaped
}

/// Computes the lowercase hex HMAC-SHA256 of `payload` keyed with `secret`
pub fn calculate_signature_sha256(payload: &[u8], secret: &[u8]) -> anyhow::Result<String> {
    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| anyhow::anyhow!("Failed to create HMAC instance: {e}"))?;
    mac.update(payload);

    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Verifies a hex signature against the raw request body
///
/// # Arguments
///
/// * `signature` - Hex signature, already stripped of the `sha256=` prefix
/// * `payload` - The raw request body bytes
/// * `app_secret` - The Meta app secret
///
/// # Returns
///
/// `true` only if the signature matches the escaped body byte for byte.
pub fn verify_signature(signature: &str, payload: &[u8], app_secret: &str) -> bool {
    let escaped = escape_non_ascii(&String::from_utf8_lossy(payload));

    let calculated = match calculate_signature_sha256(escaped.as_bytes(), app_secret.as_bytes()) {
        Ok(sig) => sig,
        Err(e) => {
            logfire::error!("{error}", error = e.to_string());
            return false;
        }
    };

    let is_valid: bool = calculated.as_bytes().ct_eq(signature.as_bytes()).into();

    if !is_valid {
        logfire::warn!("Webhook signature verification failed: signatures do not match");
    }

    is_valid
}
