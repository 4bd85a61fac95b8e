//! WebSocket message types for the tournament event stream.
//!
//! The `GET /tournaments/{tournament_id}/ws` endpoint upgrades to a
//! WebSocket connection and pushes [`WsServerMessage`] JSON frames.
//!
//! # Protocol
//!
//! 1. The server sends a [`WsServerMessage::Bracket`] with the current
//!    bracket right after the upgrade, if one has been generated.
//! 2. Every event of the tournament is forwarded as a
//!    [`WsServerMessage::Event`] frame.
//! 3. After `tournament_finished` the server sends a normal close frame.
//! 4. If the tournament does not exist the server sends an error followed by
//!    a close frame with an application-defined code (see [`WsCloseCode`]).

use serde::{Deserialize, Serialize};

use super::bracket::BracketResponse;
use super::webhook::EventPayload;

/// Server-to-client WebSocket message.
///
/// ```json
/// {"type":"bracket","bracket":{ ... }}
/// {"type":"event","event":{"event_type":"match_completed", ... }}
/// {"type":"error","code":4004,"reason":"tournament not found"}
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsServerMessage {
    /// Full bracket snapshot.
    Bracket { bracket: BracketResponse },

    /// A single bracket event.
    Event { event: EventPayload },

    /// A server-side error. The server may send a close frame afterwards.
    Error { code: u16, reason: String },
}

/// Well-known WebSocket close codes used by the event stream.
pub struct WsCloseCode;

impl WsCloseCode {
    /// Normal closure after the tournament finished.
    pub const NORMAL: u16 = 1000;

    /// An unexpected server-side error prevented the connection from
    /// continuing.
    pub const INTERNAL_ERROR: u16 = 1011;

    /// The requested tournament does not exist.
    pub const TOURNAMENT_NOT_FOUND: u16 = 4004;
}
