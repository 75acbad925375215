use crate::consts;
use derive_more::{Display, Error};
use ntex::{http, web};

/// Failures surfaced to WhatsApp as an HTTP status
#[derive(Debug, Display, Error)]
pub enum WebhookError {
    #[display("error, signature is missing")]
    MissingSignature,
    #[display("error signatures do not match")]
    SignatureMismatch,
    #[display("{}", consts::WRONG_VERIFY_TOKEN_BODY)]
    WrongVerifyToken,
    #[display("error reading request body: {_0}")]
    BodyRead(#[error(not(source))] String),
    #[display("error, request body exceeds {} bytes", consts::MAX_BODY_SIZE)]
    PayloadTooLarge,
}

impl WebhookError {
    /// Text sent back to the caller; read failures hide the underlying cause
    fn response_body(&self) -> String {
        match self {
            WebhookError::BodyRead(_) => "error reading request body.".to_string(),
            _ => self.to_string(),
        }
    }
}

impl web::error::WebResponseError for WebhookError {
    fn error_response(&self, _: &web::HttpRequest) -> web::HttpResponse {
        logfire::warn!("{error}", error = self.to_string());

        web::HttpResponse::build(self.status_code())
            .content_type("text/plain; charset=utf-8")
            .body(self.response_body())
    }

    fn status_code(&self) -> http::StatusCode {
        match *self {
            WebhookError::MissingSignature
            | WebhookError::SignatureMismatch
            | WebhookError::WrongVerifyToken => http::StatusCode::FORBIDDEN,
            WebhookError::BodyRead(_) => http::StatusCode::INTERNAL_SERVER_ERROR,
            WebhookError::PayloadTooLarge => http::StatusCode::PAYLOAD_TOO_LARGE,
        }
    }
}
