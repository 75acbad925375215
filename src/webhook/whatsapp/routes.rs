//! WhatsApp webhook endpoint handlers
//!
//! # Security
//!
//! The POST endpoint authenticates every delivery with the
//! `X-Hub-Signature-256` header before the body is parsed. Once the signature
//! matches the delivery is acknowledged with `200 Success` right away and the
//! admission pipeline runs in a detached task, so WhatsApp's retry behaviour
//! never depends on how long the chat engine takes or whether it fails.

use super::{
    handler::{self, Admission, DeliveryError},
    security,
};
use crate::{
    consts, metric,
    webhook::{AppState, errors},
};
use chrono::Utc;
use futures::StreamExt;
use ntex::{
    util::{Bytes, BytesMut},
    web,
};
use serde::Deserialize;
use tracing::Instrument;

/// Query parameters for webhook verification
#[derive(Debug, Deserialize)]
pub struct VerifyQuery {
    /// The mode parameter, "subscribe" when set
    #[serde(rename = "hub.mode")]
    pub mode: Option<String>,
    /// The verification token from WhatsApp
    #[serde(rename = "hub.verify_token", default)]
    pub verify_token: String,
    /// The challenge string to echo back
    #[serde(rename = "hub.challenge", default)]
    pub challenge: String,
}

/// Webhook verification endpoint (GET)
///
/// WhatsApp sends a GET request to verify the webhook URL.
///
/// # Returns
/// - 200 with the challenge string if the token matches
/// - 403 if it does not
#[web::get("/webhook")]
pub async fn verify(
    query: web::types::Query<VerifyQuery>,
    app_state: web::types::State<AppState>,
) -> Result<impl web::Responder, web::Error> {
    if query.verify_token != app_state.settings.verify_token {
        metric::incr_handshake_statds("rejected");
        return Err(errors::WebhookError::WrongVerifyToken.into());
    }

    logfire::info!(
        "Webhook verified. mode={mode}",
        mode = query.mode.clone().unwrap_or_default()
    );
    metric::incr_handshake_statds("verified");

    Ok(web::HttpResponse::Ok()
        .content_type("text/plain")
        .body(query.challenge.clone()))
}

/// Webhook receiver endpoint (POST)
///
/// # Returns
/// - 403 if the signature is missing or does not match the body
/// - 413 if the body is larger than [`consts::MAX_BODY_SIZE`]
/// - 500 if the body could not be read
/// - 200 `Success` otherwise, whatever the admission pipeline decides later
#[web::post("/webhook")]
pub async fn receive(
    req: web::HttpRequest,
    mut payload: web::types::Payload,
    app_state: web::types::State<AppState>,
) -> Result<impl web::Responder, web::Error> {
    let signature = req
        .headers()
        .get(consts::SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(security::signature_from_header)
        .map(str::to_string)
        .ok_or(errors::WebhookError::MissingSignature)?;

    let mut body = BytesMut::new();
    while let Some(chunk) = payload.next().await {
        let chunk = chunk.map_err(|e| errors::WebhookError::BodyRead(e.to_string()))?;
        if body.len() + chunk.len() > consts::MAX_BODY_SIZE {
            metric::incr_delivery_statds("payload_too_large");
            return Err(errors::WebhookError::PayloadTooLarge.into());
        }
        body.extend_from_slice(&chunk);
    }
    let body = body.freeze();

    if !security::verify_signature(&signature, &body, &app_state.settings.app_secret) {
        metric::incr_delivery_statds("rejected_signature");
        return Err(errors::WebhookError::SignatureMismatch.into());
    }

    let app_state = AppState::clone(&app_state);
    ntex::rt::spawn(
        admit_delivery(body, app_state).instrument(logfire::span!("whatsapp_webhook")),
    );

    Ok(web::HttpResponse::Ok()
        .content_type("text/plain")
        .body(consts::WEBHOOK_ACK_BODY))
}

/// Runs the admission pipeline for an acknowledged delivery and reports the
/// outcome. Nothing is returned to WhatsApp from here.
async fn admit_delivery(body: Bytes, app_state: AppState) {
    let admission = handler::process_delivery(
        &body,
        &app_state.settings,
        &app_state.checkout,
        app_state.chat_engine.as_ref(),
        Utc::now(),
    )
    .await;

    match admission {
        Ok(Admission::StatusUpdate) => metric::incr_delivery_statds("status_update"),
        Ok(Admission::SelfEcho) => metric::incr_delivery_statds("self_echo"),
        Ok(Admission::Forwarded) => metric::incr_delivery_statds("forwarded"),
        Err(e @ DeliveryError::ChatEngine(_)) => {
            logfire::error!("Failed to handle message: {error}", error = e.to_string());
            metric::incr_delivery_statds("chat_engine_failed");
        }
        Err(e) => {
            logfire::warn!("Message was invalid: {error}", error = e.to_string());
            metric::incr_delivery_statds("invalid");
        }
    }
}
