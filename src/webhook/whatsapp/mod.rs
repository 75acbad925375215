//! WhatsApp webhook integration module
//!
//! ## Submodules
//!
//! - [`routes`] - HTTP endpoint handlers (handshake and receiver)
//! - [`security`] - `X-Hub-Signature-256` verification
//! - [`handler`] - admission pipeline run after the delivery is acknowledged
//! - [`schemas`] - incoming webhook payloads
//! - [`client`] / [`outgoing_schemas`] - WhatsApp API client for replies

pub mod client;
pub mod handler;
pub mod outgoing_schemas;
pub mod routes;
pub mod schemas;
pub mod security;

pub use routes::{receive, verify};
