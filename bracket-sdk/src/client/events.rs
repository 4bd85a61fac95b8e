//! WebSocket event stream client.

use futures_util::StreamExt;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use url::Url;

use super::ClientError;
use crate::objects::WsServerMessage;

/// A connected tournament event stream.
///
/// Yields decoded [`WsServerMessage`] frames until the server closes the
/// connection. The close code is kept for [`close_code`](Self::close_code).
pub struct EventStream {
    socket: WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>,
    close_code: Option<u16>,
}

impl EventStream {
    pub(super) async fn connect(url: Url) -> Result<Self, ClientError> {
        let (socket, _response) = connect_async(url.as_str()).await?;
        Ok(Self {
            socket,
            close_code: None,
        })
    }

    /// Wait for the next server message.
    ///
    /// Returns `Ok(None)` once the server has closed the stream.
    pub async fn next_message(&mut self) -> Result<Option<WsServerMessage>, ClientError> {
        while let Some(frame) = self.socket.next().await {
            match frame? {
                Message::Text(text) => return Ok(Some(serde_json::from_str(&text)?)),
                Message::Close(frame) => {
                    self.close_code = frame.map(|f| u16::from(f.code));
                    return Ok(None);
                }
                _ => continue,
            }
        }
        Ok(None)
    }

    /// Code of the close frame sent by the server, once the stream ended.
    /// See [`WsCloseCode`](crate::objects::WsCloseCode).
    pub fn close_code(&self) -> Option<u16> {
        self.close_code
    }
}
