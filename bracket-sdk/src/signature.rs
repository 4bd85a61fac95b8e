//! Body signature for event webhooks.
//!
//! Every webhook delivery carries an HMAC-SHA256 tag of its body, bound to
//! the time it was signed:
//!
//! ```text
//! Bracket-Signature: {unix_timestamp}.{base64_tag}
//! tag = HMAC-SHA256(secret, "{unix_timestamp}.{json_body}")
//! ```
//!
//! Receivers reject tags older than [`MAX_SIGNATURE_AGE`] and tags dated
//! more than [`MAX_SIGNATURE_AGE`] into the future.

use std::fmt;
use std::str::FromStr;

use ring::hmac;

/// Header name for the HMAC signature.
pub const SIGNATURE_HEADER: &str = "Bracket-Signature";

/// Accepted clock distance between signer and receiver (in seconds).
pub const MAX_SIGNATURE_AGE: i64 = 5 * 60;

/// Marker trait for payloads that travel as signed webhook bodies.
pub trait Signature: for<'de> serde::Deserialize<'de> + serde::Serialize {}

#[derive(Debug, thiserror::Error)]
pub enum SignatureError {
    #[error("invalid header format")]
    InvalidFormat,
    #[error("invalid base64 encoding")]
    InvalidBase64,
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid signature")]
    SignatureMismatch,
    #[error("signature timestamp {timestamp} outside the accepted window")]
    Expired { timestamp: i64 },
}

/// HMAC-SHA256 key derived from the shared webhook secret.
pub struct SigningKey(hmac::Key);

impl SigningKey {
    pub fn new(secret: &[u8]) -> Self {
        Self(hmac::Key::new(hmac::HMAC_SHA256, secret))
    }

    fn tag(&self, timestamp: i64, json: &str) -> Box<[u8]> {
        let tag = hmac::sign(&self.0, signed_message(timestamp, json).as_bytes());
        tag.as_ref().into()
    }

    fn verify(&self, header: &SignatureHeader, json: &str) -> Result<(), SignatureError> {
        hmac::verify(
            &self.0,
            signed_message(header.timestamp, json).as_bytes(),
            &header.tag,
        )
        .map_err(|_| SignatureError::SignatureMismatch)
    }
}

fn signed_message(timestamp: i64, json: &str) -> String {
    format!("{timestamp}.{json}")
}

/// Parsed value of the `Bracket-Signature` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    /// Unix seconds at signing time.
    pub timestamp: i64,
    pub tag: Box<[u8]>,
}

impl SignatureHeader {
    /// Reject timestamps further than [`MAX_SIGNATURE_AGE`] from `now`.
    pub fn check_fresh(&self, now: i64) -> Result<(), SignatureError> {
        if now.abs_diff(self.timestamp) > MAX_SIGNATURE_AGE.unsigned_abs() {
            return Err(SignatureError::Expired {
                timestamp: self.timestamp,
            });
        }
        Ok(())
    }
}

impl FromStr for SignatureHeader {
    type Err = SignatureError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (timestamp, tag) = value
            .trim()
            .split_once('.')
            .ok_or(SignatureError::InvalidFormat)?;
        let timestamp = timestamp
            .parse()
            .map_err(|_| SignatureError::InvalidFormat)?;
        let tag = fast32::base64::RFC4648_NOPAD
            .decode_str(tag)
            .map_err(|_| SignatureError::InvalidBase64)?;
        Ok(Self {
            timestamp,
            tag: tag.into_boxed_slice(),
        })
    }
}

impl fmt::Display for SignatureHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}",
            self.timestamp,
            fast32::base64::RFC4648_NOPAD.encode(&self.tag)
        )
    }
}

/// A webhook body together with the exact JSON that was signed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedObject<T: Signature> {
    pub body: T,
    pub json: String,
    pub header: SignatureHeader,
}

impl<T: Signature> SignedObject<T> {
    /// Sign `body` with the current time.
    pub fn new(body: T, secret: &[u8]) -> Result<Self, serde_json::Error> {
        let now = time::OffsetDateTime::now_utc().unix_timestamp();
        Self::sign_at(body, &SigningKey::new(secret), now)
    }

    pub fn sign_at(body: T, key: &SigningKey, timestamp: i64) -> Result<Self, serde_json::Error> {
        let json = serde_json::to_string(&body)?;
        let tag = key.tag(timestamp, &json);
        Ok(Self {
            body,
            json,
            header: SignatureHeader { timestamp, tag },
        })
    }

    /// Parse a received header and body. Nothing is authenticated until
    /// [`verify`](Self::verify) succeeds.
    pub fn from_header_and_body(header: &str, json: String) -> Result<Self, SignatureError> {
        let header = header.parse()?;
        let body = serde_json::from_str(&json)?;
        Ok(Self { body, json, header })
    }

    /// Check the tag and the timestamp window, returning the payload.
    pub fn verify(self, secret: &[u8]) -> Result<T, SignatureError> {
        let now = time::OffsetDateTime::now_utc().unix_timestamp();
        self.verify_at(&SigningKey::new(secret), now)
    }

    pub fn verify_at(self, key: &SigningKey, now: i64) -> Result<T, SignatureError> {
        key.verify(&self.header, &self.json)?;
        self.header.check_fresh(now)?;
        Ok(self.body)
    }

    /// Value for the [`SIGNATURE_HEADER`] header.
    pub fn to_header(&self) -> String {
        self.header.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::EventPayload;
    use uuid::Uuid;

    const SIGNED_AT: i64 = 1_700_000_000;

    fn payload() -> EventPayload {
        EventPayload::MatchCompleted {
            tournament_id: Uuid::nil(),
            match_id: 1,
            round: 1,
            winner_id: "alice".to_string(),
            timestamp: SIGNED_AT,
        }
    }

    fn received(signed: &SignedObject<EventPayload>) -> SignedObject<EventPayload> {
        SignedObject::from_header_and_body(&signed.to_header(), signed.json.clone()).unwrap()
    }

    #[test]
    fn test_round_trip_through_header() {
        let key = SigningKey::new(b"secret");
        let signed = SignedObject::sign_at(payload(), &key, SIGNED_AT).unwrap();
        assert!(signed.to_header().starts_with("1700000000."));
        assert_eq!(received(&signed).verify_at(&key, SIGNED_AT + 10).unwrap(), payload());
    }

    #[test]
    fn test_rejects_other_key_and_tampered_body() {
        let signed = SignedObject::sign_at(payload(), &SigningKey::new(b"secret"), SIGNED_AT).unwrap();
        let err = received(&signed)
            .verify_at(&SigningKey::new(b"other"), SIGNED_AT)
            .unwrap_err();
        assert!(matches!(err, SignatureError::SignatureMismatch));

        let tampered = signed.json.replace("alice", "mallory");
        let forged =
            SignedObject::<EventPayload>::from_header_and_body(&signed.to_header(), tampered).unwrap();
        let err = forged
            .verify_at(&SigningKey::new(b"secret"), SIGNED_AT)
            .unwrap_err();
        assert!(matches!(err, SignatureError::SignatureMismatch));
    }

    #[test]
    fn test_timestamp_window_is_symmetric() {
        let key = SigningKey::new(b"secret");
        let signed = SignedObject::sign_at(payload(), &key, SIGNED_AT).unwrap();
        for now in [SIGNED_AT + MAX_SIGNATURE_AGE + 1, SIGNED_AT - MAX_SIGNATURE_AGE - 1] {
            let err = received(&signed).verify_at(&key, now).unwrap_err();
            assert!(matches!(err, SignatureError::Expired { timestamp: SIGNED_AT }));
        }
        assert!(received(&signed).verify_at(&key, SIGNED_AT - MAX_SIGNATURE_AGE).is_ok());
    }

    #[test]
    fn test_header_parsing_rejects_garbage() {
        assert!(matches!(
            "no-dot-here".parse::<SignatureHeader>(),
            Err(SignatureError::InvalidFormat)
        ));
        assert!(matches!(
            "abc.AAAA".parse::<SignatureHeader>(),
            Err(SignatureError::InvalidFormat)
        ));
        assert!(matches!(
            "12.!!!".parse::<SignatureHeader>(),
            Err(SignatureError::InvalidBase64)
        ));
    }
}
