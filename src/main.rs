//! # WhatsApp Webhook Service
//!
//! Main entry point of the WhatsApp bot webhook. Loads the configuration,
//! sets up logging and metrics, and serves the webhook routes.

pub mod chat;
pub mod config;
pub mod consts;
pub mod metric;
pub mod webhook;

use logfire::config::{MetricsOptions, SendToLogfire};
use ntex::web;
use openssl::ssl::{SslAcceptor, SslFiletype, SslMethod};
use std::sync::Arc;

#[ntex::main]
async fn main() -> anyhow::Result<()> {
    let app_config = config::init_config()?;

    // Initialize logging and metrics, console only without a token
    let mut logfire_config = logfire::configure()
        .install_panic_handler()
        .with_metrics(Some(MetricsOptions::default()))
        .send_to_logfire(SendToLogfire::IfTokenPresent);
    if let Some(token) = &app_config.logfire_token {
        logfire_config = logfire_config.with_token(token.clone());
    }
    let shutdown_handler = logfire_config.finish()?;

    let chat_engine: chat::ImplChatEngine = Arc::new(chat::whatsapp::WhatsAppChatClient {
        client: webhook::whatsapp::client::WhatsAppClient::from_config(&app_config),
        greeting: app_config.chat_greeting.clone(),
    });
    let app_state = webhook::AppState {
        settings: Arc::new(app_config.webhook_settings()),
        checkout: Arc::new(app_config.checkout_info()),
        chat_engine,
    };

    configure_and_run_server(&app_config, app_state).await?;

    shutdown_handler.shutdown()?;

    Ok(())
}

/// Configures SSL acceptor for production environments
fn setup_ssl_acceptor(
    app_config: &config::AppConfig,
) -> anyhow::Result<openssl::ssl::SslAcceptorBuilder> {
    let mut ssl_acceptor = SslAcceptor::mozilla_intermediate(SslMethod::tls_server())
        .map_err(|e| anyhow::anyhow!("Failed to create SSL acceptor: {}", e))?;

    ssl_acceptor
        .set_private_key_file(&app_config.private_key_path, SslFiletype::PEM)
        .map_err(|e| {
            anyhow::anyhow!(
                "Failed to load private key from {}: {}",
                app_config.private_key_path,
                e
            )
        })?;

    ssl_acceptor
        .set_certificate_file(&app_config.certificate_path, SslFiletype::PEM)
        .map_err(|e| {
            anyhow::anyhow!(
                "Failed to load certificate from {}: {}",
                app_config.certificate_path,
                e
            )
        })?;

    Ok(ssl_acceptor)
}

/// Answers every unknown route with a plain 404
async fn serve_not_found() -> web::HttpResponse {
    web::HttpResponse::NotFound().finish()
}

/// Configures and starts the web server with appropriate SSL settings
async fn configure_and_run_server(
    app_config: &config::AppConfig,
    app_state: webhook::AppState,
) -> anyhow::Result<()> {
    let server_addr = (
        app_config.wep_server_host.clone(),
        app_config.wep_server_port,
    );

    let server = web::server(move || {
        web::App::new()
            .wrap(web::middleware::Logger::default())
            .state(app_state.clone())
            .configure(webhook::routes::whatsapp)
            .default_service(web::route().to(serve_not_found))
    });

    let bound_server = if app_config.is_prod() {
        let ssl_acceptor = setup_ssl_acceptor(app_config)?;
        server.bind_openssl(server_addr, ssl_acceptor)?
    } else {
        server.bind(server_addr)?
    };

    logfire::info!(
        "Server is running on port {port}",
        port = i64::from(app_config.wep_server_port)
    );

    bound_server
        .run()
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))
}
