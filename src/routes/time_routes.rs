use std::error::Error as _;
use std::sync::Arc;

use axum::{
    body::to_bytes,
    extract::{Request, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use http_body_util::LengthLimitError;

use crate::codec::Codec;
use crate::errors::{plain_error, ServiceError};
use crate::services::time_service::{accept_content_type, ValueService, TEXT_PLAIN};

/// Shared handler state: the service plus the body cap.
pub struct TimeState<C: Codec> {
    pub service: ValueService<C>,
    pub max_body_bytes: usize,
}

/// Build the /time routes for one codec.
pub fn routes<C: Codec>(state: Arc<TimeState<C>>) -> Router {
    Router::new()
        .route("/time", get(read_time::<C>).post(update_time::<C>))
        .with_state(state)
}

//
// ─────────────────────────────────────────────────────────────
// POST /time
// Replace the stored value
// ─────────────────────────────────────────────────────────────
//
async fn update_time<C: Codec>(
    State(state): State<Arc<TimeState<C>>>,
    request: Request,
) -> Result<StatusCode, ServiceError>
{
    accept_content_type(request.headers())?;

    let body = to_bytes(request.into_body(), state.max_body_bytes)
        .await
        .map_err(body_error)?;

    // Non-UTF-8 bytes become U+FFFD and fail validation like any other junk.
    state.service.update(&String::from_utf8_lossy(&body))?;
    Ok(StatusCode::OK)
}

/// An over-long body is the caller's fault; anything else is a transport failure.
fn body_error(err: axum::Error) -> ServiceError {
    let mut source = err.source();
    while let Some(cause) = source {
        if cause.is::<LengthLimitError>() {
            return ServiceError::PayloadTooLarge;
        }
        source = cause.source();
    }
    ServiceError::TransportFailure(format!("time service - update: {err}"))
}

//
// ─────────────────────────────────────────────────────────────
// GET /time
// Return the stored value as text/plain
// ─────────────────────────────────────────────────────────────
//
async fn read_time<C: Codec>(
    State(state): State<Arc<TimeState<C>>>,
) -> Result<impl IntoResponse, ServiceError>
{
    let text = state.service.read()?;
    Ok(([(header::CONTENT_TYPE, TEXT_PLAIN)], text))
}

/// Fallback for every unmatched route.
pub async fn not_found() -> Response {
    plain_error(StatusCode::NOT_FOUND, "Not Found")
}
