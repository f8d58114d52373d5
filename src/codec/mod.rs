//! Wire encodings for the time slot.
//!
//! A [`Codec`] owns all validation of incoming text and the rendering of
//! stored payloads. One codec is chosen per running service and never
//! changes afterwards.

pub mod locator;
pub mod timestamp;

use std::fmt;

use serde::Deserialize;

use crate::errors::CodecError;

pub use locator::{Locator, LocatorCodec};
pub use timestamp::TimestampCodec;

/// Conversion between wire text and the payload held in the slot.
pub trait Codec: Send + Sync + 'static {
    /// What the slot stores for this encoding.
    type Payload: Clone + Send + Sync + 'static;

    /// Which variant this is.
    const KIND: CodecKind;

    /// Validate `text` and turn it into a payload.
    fn decode(&self, text: &str) -> Result<Self::Payload, CodecError>;

    /// Render a payload as wire text.
    fn encode(&self, payload: &Self::Payload) -> String;

    /// Text served when nothing has been stored yet.
    ///
    /// `None` means a read of an empty slot is a not-found error.
    fn encode_absent(&self) -> Option<String> {
        None
    }
}

/// Selects the wire encoding at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodecKind {
    /// Hexadecimal in-process addresses. Only meaningful within one process.
    Locator,
    /// Decimal Unix timestamps bounded by `i32::MAX`.
    #[default]
    Timestamp,
}

impl fmt::Display for CodecKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecKind::Locator => f.write_str("locator"),
            CodecKind::Timestamp => f.write_str("timestamp"),
        }
    }
}
