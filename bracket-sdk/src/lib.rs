//! SDK for the bracket engine.
//!
//! Contains the wire objects shared by the server and its clients, the
//! HMAC body signature used for event webhooks, and (behind the `client`
//! feature) a typed HTTP / WebSocket client.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![forbid(unsafe_code)]

pub mod objects;
pub mod signature;

#[cfg(feature = "client")]
pub mod client;
