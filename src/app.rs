use std::sync::Arc;

use axum::Router;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::codec::{Codec, LocatorCodec, TimestampCodec, CodecKind};
use crate::config::AppConfig;
use crate::routes::time_routes;
use crate::routes::time_routes::TimeState;
use crate::services::time_service::ValueService;

/// Build the complete Axum application:
/// - /time     (read / replace the stored value)
/// - anything else answers 404
///
/// The codec is fixed here for the lifetime of the router.
pub fn build_app<C: Codec>(codec: C, cfg: AppConfig) -> Router {
    tracing::debug!("building app with {} codec", C::KIND);

    let state = Arc::new(TimeState {
        service: ValueService::new(codec),
        max_body_bytes: cfg.max_body_bytes,
    });

    time_routes::routes(state)
        // Unmatched routes
        .fallback(time_routes::not_found)

        // Logging middleware
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}

/// Build the application for the codec named in the configuration.
pub fn build_configured_app(cfg: AppConfig) -> Router {
    match cfg.codec {
        CodecKind::Locator => build_app(LocatorCodec, cfg),
        CodecKind::Timestamp => build_app(TimestampCodec, cfg),
    }
}
