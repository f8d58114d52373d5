use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Validation failures raised while decoding wire text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("expected a locator matching ^0x[0-9a-fA-F]+$ that fits in {bits} bits", bits = usize::BITS)]
    MalformedLocator,

    #[error("expected a timestamp of 1 to 10 decimal digits")]
    InvalidFormat,

    #[error("timestamp exceeds the maximum of 2147483647")]
    OutOfRange,
}

/// Errors surfaced by the time service to HTTP callers.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Unsupported content type, only 'text/plain' is allowed")]
    UnsupportedMediaType,

    #[error("Not valid data: {0}")]
    Codec(#[from] CodecError),

    #[error("Time has not been set yet.")]
    NotFound,

    #[error("Payload Too Large")]
    PayloadTooLarge,

    #[error("transport failure: {0}")]
    TransportFailure(String),
}

impl ServiceError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServiceError::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ServiceError::Codec(_) => StatusCode::BAD_REQUEST,
            ServiceError::NotFound => StatusCode::NOT_FOUND,
            ServiceError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ServiceError::TransportFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Internal details stay in the log.
        if status.is_server_error() {
            tracing::error!("time service: {self}");
            return plain_error(status, status.canonical_reason().unwrap_or_default());
        }

        plain_error(status, &self.to_string())
    }
}

/// Plain-text error response: one line of text, no sniffing.
pub fn plain_error(status: StatusCode, message: &str) -> Response {
    (
        status,
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
        ],
        format!("{message}\n"),
    )
        .into_response()
}

/// Failures of the client-side handshake.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("unexpected status {0}")]
    Status(StatusCode),

    #[error("response did not decode: {0}")]
    Codec(#[from] CodecError),

    #[error("server returned locator {received}, expected {sent}")]
    LocatorMismatch { sent: String, received: String },

    #[error("server did not accept connections in time")]
    NotReady,
}

/// Startup failures.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("cannot load {path}: {reason}")]
    Config { path: String, reason: String },

    #[error("cannot bind {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(std::io::Error),

    #[error("server task failed: {0}")]
    ServerTask(#[from] tokio::task::JoinError),

    #[error("handshake failed: {0}")]
    Handshake(#[from] ClientError),
}
