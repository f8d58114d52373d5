use std::fmt;

use chrono::{DateTime, Utc};

use crate::codec::{Codec, CodecKind};
use crate::errors::CodecError;

/// Longest accepted timestamp text.
const MAX_DIGITS: usize = 10;

/// Largest accepted timestamp, the 32-bit signed maximum.
const MAX_SECONDS: u64 = i32::MAX as u64;

/// A validated Unix timestamp, kept as the exact text it was written with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timestamp(String);

impl Timestamp {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn seconds(&self) -> i64 {
        // Validated digits bounded by i32::MAX always parse.
        self.0.parse().unwrap_or_default()
    }

    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.seconds(), 0)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Codec for decimal [`Timestamp`]s.
///
/// Leading zeros are accepted and preserved; reads return the written text
/// byte for byte.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimestampCodec;

impl TimestampCodec {
    /// The current time as a timestamp payload.
    pub fn now(&self) -> Result<Timestamp, CodecError> {
        self.decode(&Utc::now().timestamp().to_string())
    }
}

impl Codec for TimestampCodec {
    type Payload = Timestamp;

    const KIND: CodecKind = CodecKind::Timestamp;

    fn decode(&self, text: &str) -> Result<Timestamp, CodecError> {
        if text.is_empty() || text.len() > MAX_DIGITS || !text.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CodecError::InvalidFormat);
        }

        // Ten digits always fit in a u64.
        let value: u64 = text.parse().map_err(|_| CodecError::InvalidFormat)?;
        if value > MAX_SECONDS {
            return Err(CodecError::OutOfRange);
        }

        Ok(Timestamp(text.to_owned()))
    }

    fn encode(&self, payload: &Timestamp) -> String {
        payload.as_str().to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_values_up_to_the_bound() {
        let codec = TimestampCodec;

        for text in ["0", "7", "1732483484", "2147483647", "0000000001", "999999999"] {
            assert_eq!(codec.decode(text).unwrap().as_str(), text);
        }
    }

    #[test]
    fn rejects_bad_shapes() {
        let codec = TimestampCodec;

        for text in ["", "21474836470", "12a", "-1", "+1", " 1", "1.0", "١٢٣"] {
            assert_eq!(
                codec.decode(text),
                Err(CodecError::InvalidFormat),
                "{text:?} should be rejected"
            );
        }
    }

    #[test]
    fn bound_is_numeric_not_per_digit() {
        let codec = TimestampCodec;

        assert_eq!(codec.decode("2147483648"), Err(CodecError::OutOfRange));
        assert_eq!(codec.decode("9999999999"), Err(CodecError::OutOfRange));
        assert_eq!(codec.decode("3000000000"), Err(CodecError::OutOfRange));

        // A digit-by-digit comparison would reject these: each has a digit
        // larger than the one at the same position in 2147483647.
        assert!(codec.decode("2099999999").is_ok());
        assert!(codec.decode("1999999999").is_ok());
        assert!(codec.decode("2147399999").is_ok());
    }

    #[test]
    fn encode_is_identity() {
        let codec = TimestampCodec;
        let decoded = codec.decode("0001732483").unwrap();

        assert_eq!(codec.encode(&decoded), "0001732483");
        assert_eq!(codec.decode(&codec.encode(&decoded)).unwrap(), decoded);
        assert_eq!(codec.encode_absent(), None);
    }

    #[test]
    fn converts_to_datetime() {
        let ts = TimestampCodec.decode("1732483484").unwrap();

        assert_eq!(ts.seconds(), 1_732_483_484);
        assert_eq!(
            ts.to_datetime().unwrap().to_rfc3339(),
            "2024-11-24T21:24:44+00:00"
        );
    }

    #[test]
    fn now_is_a_valid_timestamp() {
        let now = TimestampCodec.now().unwrap();
        assert!(now.seconds() > 1_700_000_000);
    }
}
