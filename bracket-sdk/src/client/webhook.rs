//! Webhook signature verification helper.
//!
//! Convenience wrapper around [`SignedObject`] for verifying incoming
//! event webhooks sent by the bracket server.

use crate::signature::{Signature, SignatureError, SignedObject};

/// Verify and deserialize an incoming event webhook.
///
/// * `signature_header` – value of the `Bracket-Signature` request header.
/// * `body` – raw JSON request body string.
/// * `secret` – the HMAC secret shared with the bracket server.
///
/// # Example
///
/// ```ignore
/// use bracket_sdk::client::verify_webhook;
/// use bracket_sdk::objects::EventPayload;
///
/// let event: EventPayload = verify_webhook(signature_header, &body, secret)?;
/// ```
pub fn verify_webhook<T: Signature>(
    signature_header: &str,
    body: &str,
    secret: &[u8],
) -> Result<T, SignatureError> {
    SignedObject::<T>::from_header_and_body(signature_header, body.to_owned())?
        .verify(secret)
}
