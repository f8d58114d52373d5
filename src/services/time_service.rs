use axum::http::{header, HeaderMap};

use crate::codec::Codec;
use crate::errors::ServiceError;
use crate::state::slot::Slot;

/// The only media type accepted on writes.
pub const TEXT_PLAIN: &str = "text/plain";

/// One slot bound to one codec.
pub struct ValueService<C: Codec> {
    slot: Slot<C::Payload>,
    codec: C,
}

impl<C: Codec> ValueService<C> {
    /// Create a service with an empty slot.
    pub fn new(codec: C) -> Self {
        Self {
            slot: Slot::new(),
            codec,
        }
    }

    /// Decode `body` and replace the slot content.
    ///
    /// A body that fails to decode leaves the slot untouched.
    pub fn update(&self, body: &str) -> Result<(), ServiceError> {
        let payload = self.codec.decode(body).map_err(|e| {
            tracing::debug!("time service - update rejected {} byte body: {e}", body.len());
            e
        })?;

        self.slot.store(payload);
        Ok(())
    }

    /// Encode the current slot content.
    pub fn read(&self) -> Result<String, ServiceError> {
        match self.slot.load() {
            Some(payload) => Ok(self.codec.encode(&payload)),
            None => self.codec.encode_absent().ok_or(ServiceError::NotFound),
        }
    }
}

/// Writes must declare exactly `text/plain`.
pub fn accept_content_type(headers: &HeaderMap) -> Result<(), ServiceError> {
    match headers.get(header::CONTENT_TYPE) {
        Some(value) if value.as_bytes() == TEXT_PLAIN.as_bytes() => Ok(()),
        _ => Err(ServiceError::UnsupportedMediaType),
    }
}
