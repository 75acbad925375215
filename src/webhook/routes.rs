use ntex::web;

/// Configures the WhatsApp webhook routes.
///
/// These routes are public endpoints; deliveries are authenticated by their
/// signature, not by a session.
///
/// # Routes
/// - `GET /webhook` - WhatsApp webhook verification
/// - `POST /webhook` - WhatsApp webhook receiver
pub fn whatsapp(cfg: &mut web::ServiceConfig) {
    cfg.service((super::whatsapp::verify, super::whatsapp::receive));
}
