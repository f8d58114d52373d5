//! Address-as-payload encoding.
//!
//! The wire text is a hexadecimal address (`0x...`) of a value living in the
//! *same process*. The slot stores the address itself; whoever reads it back
//! is responsible for dereferencing it while the pointee is still alive. This
//! is a demonstration of address-space-local exchange, not a transport-safe
//! or durable format.

use std::fmt;

use crate::codec::{Codec, CodecKind};
use crate::errors::CodecError;

/// A machine-word-sized memory address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Locator(usize);

impl Locator {
    pub const NULL: Locator = Locator(0);

    /// Address of `value`.
    pub fn of<T>(value: &T) -> Self {
        Locator(value as *const T as usize)
    }

    /// Reinterpret the address as a reference to `T`.
    ///
    /// Returns `None` for the null locator.
    ///
    /// # Safety
    ///
    /// The address must point to a live, properly aligned `T` in this
    /// process for all of `'a`. Nothing here can check that.
    pub unsafe fn resolve<'a, T>(self) -> Option<&'a T> {
        (self.0 as *const T).as_ref()
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Codec for [`Locator`] payloads. An empty slot reads as `0x0`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocatorCodec;

impl Codec for LocatorCodec {
    type Payload = Locator;

    const KIND: CodecKind = CodecKind::Locator;

    fn decode(&self, text: &str) -> Result<Locator, CodecError> {
        let digits = match text.strip_prefix("0x") {
            Some(digits) if !digits.is_empty() => digits,
            _ => return Err(CodecError::MalformedLocator),
        };

        // from_str_radix alone would also accept a leading '+'.
        if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(CodecError::MalformedLocator);
        }

        usize::from_str_radix(digits, 16)
            .map(Locator)
            .map_err(|_| CodecError::MalformedLocator)
    }

    fn encode(&self, payload: &Locator) -> String {
        payload.to_string()
    }

    fn encode_absent(&self) -> Option<String> {
        Some(self.encode(&Locator::NULL))
    }
}
