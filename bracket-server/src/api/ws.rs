use axum::{
    extract::{
        Path, State,
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use bracket_core::BracketError;
use bracket_core::entities::TournamentId;
use bracket_core::events::BracketEvent;
use bracket_sdk::objects::{BracketResponse, WsCloseCode, WsServerMessage};
use tokio::sync::broadcast::error::RecvError;
use uuid::Uuid;

use crate::state::AppState;

/// `GET /tournaments/{tournament_id}/ws`: WebSocket event stream.
///
/// Upgrades the HTTP connection and pushes [`WsServerMessage`] JSON frames:
/// the current bracket first (once generated), then every event of this
/// tournament. The connection is closed after `tournament_finished`.
pub(super) async fn tournament_ws(
    State(state): State<AppState>,
    Path(tournament_id): Path<Uuid>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_tournament_ws(socket, state, TournamentId(tournament_id)))
}

/// Background task that drives a single WebSocket connection.
async fn handle_tournament_ws(mut socket: WebSocket, state: AppState, tournament_id: TournamentId) {
    // Subscribe before reading the bracket so that an event racing with the
    // read is still captured in the receiver's buffer.
    let mut event_rx = state.service.subscribe();

    match send_bracket(&mut socket, &state, tournament_id).await {
        Ok(true) => {
            let _ = close(&mut socket, WsCloseCode::NORMAL, "tournament finished").await;
            return;
        }
        Ok(false) => {}
        Err(WsFailure::Disconnected) => return,
        Err(WsFailure::Bracket(BracketError::TournamentNotFound(_))) => {
            let _ = send_error(&mut socket, WsCloseCode::TOURNAMENT_NOT_FOUND, "tournament not found").await;
            return;
        }
        Err(WsFailure::Bracket(e)) => {
            tracing::error!(error = %e, %tournament_id, "WS: failed to read bracket");
            let _ = send_error(&mut socket, WsCloseCode::INTERNAL_ERROR, "internal error").await;
            return;
        }
    }

    loop {
        tokio::select! {
            result = event_rx.recv() => match result {
                Ok(event) if event.tournament_id() == tournament_id => {
                    let finished = matches!(event, BracketEvent::TournamentFinished { .. });
                    let payload = event.to_payload(time::OffsetDateTime::now_utc().unix_timestamp());
                    if send_json(&mut socket, &WsServerMessage::Event { event: payload }).await.is_err() {
                        return;
                    }
                    if finished {
                        let _ = close(&mut socket, WsCloseCode::NORMAL, "tournament finished").await;
                        return;
                    }
                }
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(
                        %tournament_id,
                        skipped,
                        "WS: broadcast receiver lagged, resending bracket"
                    );
                    match send_bracket(&mut socket, &state, tournament_id).await {
                        Ok(false) => {}
                        Ok(true) => {
                            let _ = close(&mut socket, WsCloseCode::NORMAL, "tournament finished").await;
                            return;
                        }
                        Err(_) => return,
                    }
                }
                Err(RecvError::Closed) => break,
            },

            msg = socket.recv() => match msg {
                Some(Ok(Message::Close(_))) | None | Some(Err(_)) => return,
                Some(Ok(_)) => {}
            },
        }
    }

    let _ = socket.send(Message::Close(None)).await;
}

enum WsFailure {
    Disconnected,
    Bracket(BracketError),
}

/// Send the current bracket, if generated. Returns whether the tournament
/// is already finished.
async fn send_bracket(
    socket: &mut WebSocket,
    state: &AppState,
    tournament_id: TournamentId,
) -> Result<bool, WsFailure> {
    match state.service.bracket(tournament_id).await {
        Ok(bracket) => {
            let msg = WsServerMessage::Bracket {
                bracket: BracketResponse::from(&bracket),
            };
            send_json(socket, &msg)
                .await
                .map_err(|_| WsFailure::Disconnected)?;
            Ok(bracket.finished)
        }
        Err(BracketError::BracketNotGenerated(_)) => Ok(false),
        Err(e) => Err(WsFailure::Bracket(e)),
    }
}

async fn send_error(socket: &mut WebSocket, code: u16, reason: &str) -> Result<(), ()> {
    send_json(
        socket,
        &WsServerMessage::Error {
            code,
            reason: reason.to_string(),
        },
    )
    .await?;
    close(socket, code, reason).await
}

async fn close(socket: &mut WebSocket, code: u16, reason: &str) -> Result<(), ()> {
    socket
        .send(Message::Close(Some(CloseFrame {
            code,
            reason: reason.into(),
        })))
        .await
        .map_err(|_| ())
}

/// Serialize `value` as JSON and send it as a text WebSocket frame.
///
/// Returns `Err(())` if the send fails (client disconnected).
async fn send_json<T: serde::Serialize>(socket: &mut WebSocket, value: &T) -> Result<(), ()> {
    let json = serde_json::to_string(value).map_err(|_| ())?;
    socket
        .send(Message::Text(json.into()))
        .await
        .map_err(|_| ())
}
