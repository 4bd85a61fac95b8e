//! HTTP API handlers.
//!
//! # Endpoints
//!
//! - `GET  /tournaments`                                   – list tournaments
//! - `POST /tournaments`                                   – create a tournament
//! - `GET  /tournaments/{tournament_id}`                   – fetch a tournament
//! - `POST /tournaments/{tournament_id}/join`              – join the roster
//! - `POST /tournaments/{tournament_id}/leave`             – leave the roster
//! - `POST /tournaments/{tournament_id}/bracket/generate`  – generate the bracket
//! - `GET  /tournaments/{tournament_id}/bracket`           – fetch the bracket
//! - `POST /tournaments/{tournament_id}/matches/{match_id}/report` – report a result
//! - `GET  /tournaments/{tournament_id}/ws`                – event stream
//! - `GET  /participants/{participant_id}/matches`         – a participant's matches
//! - `GET  /rankings`                                      – ranking board

mod bracket;
mod participants;
mod rankings;
mod tournaments;
mod ws;

use axum::{
    Json, Router,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use bracket_core::BracketError;
use serde::Serialize;

use crate::state::AppState;

/// Build the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/tournaments",
            get(tournaments::list_tournaments).post(tournaments::create_tournament),
        )
        .route("/tournaments/{tournament_id}", get(tournaments::get_tournament))
        .route("/tournaments/{tournament_id}/join", post(tournaments::join))
        .route("/tournaments/{tournament_id}/leave", post(tournaments::leave))
        .route(
            "/tournaments/{tournament_id}/bracket/generate",
            post(bracket::generate),
        )
        .route("/tournaments/{tournament_id}/bracket", get(bracket::get_bracket))
        .route(
            "/tournaments/{tournament_id}/matches/{match_id}/report",
            post(bracket::report_result),
        )
        .route("/tournaments/{tournament_id}/ws", get(ws::tournament_ws))
        .route(
            "/participants/{participant_id}/matches",
            get(participants::list_matches),
        )
        .route("/rankings", get(rankings::get_rankings))
}

/// Errors returned by API handlers.
#[derive(Debug)]
pub enum ApiError {
    Bracket(BracketError),
    BadRequest(&'static str),
}

impl From<BracketError> for ApiError {
    fn from(value: BracketError) -> Self {
        Self::Bracket(value)
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

fn status_of(error: &BracketError) -> StatusCode {
    match error {
        BracketError::TournamentNotFound(_)
        | BracketError::MatchNotFound(_)
        | BracketError::NotJoined(_) => StatusCode::NOT_FOUND,
        BracketError::InsufficientParticipants { .. }
        | BracketError::RosterTooLarge { .. }
        | BracketError::AlreadyGenerated(_)
        | BracketError::BracketNotGenerated(_)
        | BracketError::MatchAlreadyCompleted { .. }
        | BracketError::MatchNotReady(_)
        | BracketError::AlreadyJoined(_)
        | BracketError::TournamentFull { .. }
        | BracketError::RosterLocked => StatusCode::CONFLICT,
        BracketError::InvalidWinner { .. } | BracketError::InvalidMaxParticipants { .. } => {
            StatusCode::BAD_REQUEST
        }
        BracketError::Timeout(_) => StatusCode::SERVICE_UNAVAILABLE,
        BracketError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            ApiError::Bracket(e) => {
                let status = status_of(&e);
                if status.is_server_error() {
                    tracing::error!(error = %e, "Bracket API request failed");
                }
                let message = match e {
                    BracketError::Internal(_) => "internal server error".to_string(),
                    e => e.to_string(),
                };
                (status, message)
            }
            ApiError::BadRequest(reason) => (StatusCode::BAD_REQUEST, reason.to_string()),
        };
        (status, Json(ErrorBody { error: message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::build_router;
    use axum::body::Body;
    use axum::http::{Request, Response};
    use bracket_core::BracketService;
    use bracket_core::config::{ConfigStore, EngineConfig, NotifierConfig};
    use bracket_core::entities::{MatchId, NewTournament, TournamentId};
    use bracket_core::processors::RankingBoard;
    use bracket_sdk::client::{BracketClient, EventStream};
    use bracket_sdk::objects::{
        BracketResponse, EventPayload, MatchResponse, SlotView, TournamentFormat,
        TournamentResponse, WsCloseCode, WsServerMessage,
    };
    use serde::de::DeserializeOwned;
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    fn state_with(config: EngineConfig) -> AppState {
        AppState::new(
            BracketService::new(config),
            Arc::new(RankingBoard::new()),
            ConfigStore::new(NotifierConfig::new(vec![], Box::default())),
        )
    }

    fn app() -> Router {
        build_router(state_with(EngineConfig::default()))
    }

    /// Serve the router on an ephemeral port.
    async fn serve(state: AppState) -> BracketClient {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, build_router(state)).await.unwrap();
        });
        BracketClient::new(url::Url::parse(&format!("http://{addr}")).unwrap())
    }

    async fn next(stream: &mut EventStream) -> Option<WsServerMessage> {
        tokio::time::timeout(Duration::from_secs(5), stream.next_message())
            .await
            .expect("no websocket message within 5s")
            .unwrap()
    }

    async fn generated(service: &BracketService, ids: &[&str]) -> TournamentId {
        let tournament = service
            .create_tournament(NewTournament {
                format: TournamentFormat::SingleElimination,
                max_participants: 8,
                created_by: "organizer".into(),
            })
            .await
            .unwrap();
        for id in ids {
            service.join(tournament.id, (*id).into()).await.unwrap();
        }
        service.generate(tournament.id).await.unwrap();
        tournament.id
    }

    async fn report(service: &BracketService, tid: TournamentId, match_id: u32, winner: &str) {
        service
            .report_result(tid, MatchId(match_id), winner.into(), None)
            .await
            .unwrap();
    }

    fn completed_match(message: Option<WsServerMessage>) -> u32 {
        match message {
            Some(WsServerMessage::Event {
                event: EventPayload::MatchCompleted { match_id, .. },
            }) => match_id,
            other => panic!("expected match_completed, got {other:?}"),
        }
    }

    fn bracket(message: Option<WsServerMessage>) -> BracketResponse {
        match message {
            Some(WsServerMessage::Bracket { bracket }) => bracket,
            other => panic!("expected bracket, got {other:?}"),
        }
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<&str>) -> Response<Body> {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(body.map_or_else(Body::empty, |b| Body::from(b.to_string())))
            .unwrap();
        app.clone().oneshot(request).await.unwrap()
    }

    async fn json<T: DeserializeOwned>(response: Response<Body>) -> T {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn create_with(app: &Router, participants: &[&str]) -> uuid::Uuid {
        let response = send(
            app,
            "POST",
            "/api/v1/tournaments",
            Some(r#"{"max_participants":8,"created_by":"organizer"}"#),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let tournament: TournamentResponse = json(response).await;
        for id in participants {
            let body = format!(r#"{{"participant_id":"{id}"}}"#);
            let uri = format!("/api/v1/tournaments/{}/join", tournament.tournament_id);
            let response = send(app, "POST", &uri, Some(&body)).await;
            assert_eq!(response.status(), StatusCode::OK);
        }
        tournament.tournament_id
    }

    #[tokio::test]
    async fn test_play_out_over_http() {
        let app = app();
        let tid = create_with(&app, &["A", "B", "C"]).await;

        let response = send(&app, "POST", &format!("/api/v1/tournaments/{tid}/bracket/generate"), None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let bracket: BracketResponse = json(response).await;
        assert_eq!(bracket.total_rounds, 2);

        let report = |match_id: u32, winner: &str| {
            (
                format!("/api/v1/tournaments/{tid}/matches/{match_id}/report"),
                format!(r#"{{"winner_id":"{winner}"}}"#),
            )
        };
        let (uri, body) = report(1, "A");
        let response = send(&app, "POST", &uri, Some(&body)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let (uri, body) = report(3, "C");
        let response = send(&app, "POST", &uri, Some(&body)).await;
        let final_match: MatchResponse = json(response).await;
        assert_eq!(final_match.winner.as_deref(), Some("C"));

        let response = send(&app, "GET", &format!("/api/v1/tournaments/{tid}"), None).await;
        let tournament: TournamentResponse = json(response).await;
        assert!(tournament.finished);
        assert_eq!(tournament.champion.as_deref(), Some("C"));
        assert_eq!(tournament.runner_up.as_deref(), Some("A"));
    }

    #[tokio::test]
    async fn test_error_status_codes() {
        let app = app();
        let unknown = uuid::Uuid::nil();
        let response = send(&app, "GET", &format!("/api/v1/tournaments/{unknown}"), None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let tid = create_with(&app, &["A", "B"]).await;
        let generate = format!("/api/v1/tournaments/{tid}/bracket/generate");
        assert_eq!(send(&app, "POST", &generate, None).await.status(), StatusCode::OK);
        assert_eq!(send(&app, "POST", &generate, None).await.status(), StatusCode::CONFLICT);

        let report = format!("/api/v1/tournaments/{tid}/matches/1/report");
        let response = send(&app, "POST", &report, Some(r#"{"winner_id":"Z"}"#)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = send(&app, "POST", &report, Some(r#"{"winner_id":"A"}"#)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let response = send(&app, "POST", &report, Some(r#"{"winner_id":"A"}"#)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let response = send(&app, "POST", &report, Some(r#"{"winner_id":"B"}"#)).await;
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let join = format!("/api/v1/tournaments/{tid}/join");
        let response = send(&app, "POST", &join, Some(r#"{"participant_id":"C"}"#)).await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_empty_participant_rejected() {
        let app = app();
        let tid = create_with(&app, &[]).await;
        let join = format!("/api/v1/tournaments/{tid}/join");
        let response = send(&app, "POST", &join, Some(r#"{"participant_id":"  "}"#)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_participant_matches_over_http() {
        let app = app();
        let tid = create_with(&app, &["A", "B"]).await;
        let generate = format!("/api/v1/tournaments/{tid}/bracket/generate");
        assert_eq!(send(&app, "POST", &generate, None).await.status(), StatusCode::OK);

        let response = send(&app, "GET", "/api/v1/participants/A/matches", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let matches: Vec<MatchResponse> = json(response).await;
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].tournament_id, tid);
        assert_eq!(matches[0].player1, SlotView::Participant { id: "A".into() });

        let response = send(&app, "GET", "/api/v1/participants/Z/matches", None).await;
        let matches: Vec<MatchResponse> = json(response).await;
        assert!(matches.is_empty());

        let response = send(&app, "GET", "/api/v1/participants/%20/matches", None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_ws_unknown_tournament_closes_with_error() {
        let client = serve(state_with(EngineConfig::default())).await;
        let mut stream = client.events(uuid::Uuid::nil()).await.unwrap();

        match next(&mut stream).await {
            Some(WsServerMessage::Error { code, .. }) => {
                assert_eq!(code, WsCloseCode::TOURNAMENT_NOT_FOUND)
            }
            other => panic!("expected error, got {other:?}"),
        }
        assert!(next(&mut stream).await.is_none());
        assert_eq!(stream.close_code(), Some(WsCloseCode::TOURNAMENT_NOT_FOUND));
    }

    #[tokio::test]
    async fn test_ws_streams_own_tournament_until_finished() {
        let state = state_with(EngineConfig::default());
        let service = state.service.clone();
        let client = serve(state).await;
        let tid = generated(&service, &["A", "B", "C"]).await;
        let other = generated(&service, &["X", "Y"]).await;

        let mut stream = client.events(tid.0).await.unwrap();
        let initial = bracket(next(&mut stream).await);
        assert_eq!(initial.tournament_id, tid.0);
        assert!(!initial.finished);

        report(&service, other, 1, "X").await;
        report(&service, tid, 1, "A").await;
        report(&service, tid, 3, "C").await;

        assert_eq!(completed_match(next(&mut stream).await), 1);
        assert_eq!(completed_match(next(&mut stream).await), 3);
        match next(&mut stream).await {
            Some(WsServerMessage::Event {
                event:
                    EventPayload::TournamentFinished {
                        tournament_id,
                        champion_id,
                        runner_up_id,
                        ..
                    },
            }) => {
                assert_eq!(tournament_id, tid.0);
                assert_eq!(champion_id, "C");
                assert_eq!(runner_up_id.as_deref(), Some("A"));
            }
            other => panic!("expected tournament_finished, got {other:?}"),
        }
        assert!(next(&mut stream).await.is_none());
        assert_eq!(stream.close_code(), Some(WsCloseCode::NORMAL));
    }

    #[tokio::test]
    async fn test_ws_finished_tournament_sends_bracket_and_closes() {
        let state = state_with(EngineConfig::default());
        let service = state.service.clone();
        let client = serve(state).await;
        let tid = generated(&service, &["A", "B"]).await;
        report(&service, tid, 1, "B").await;

        let mut stream = client.events(tid.0).await.unwrap();
        let final_bracket = bracket(next(&mut stream).await);
        assert!(final_bracket.finished);
        assert_eq!(final_bracket.champion.as_deref(), Some("B"));
        assert!(next(&mut stream).await.is_none());
        assert_eq!(stream.close_code(), Some(WsCloseCode::NORMAL));
    }

    #[tokio::test]
    async fn test_ws_resends_bracket_after_lag() {
        // A one-slot buffer: two events published back to back overflow it.
        let state = state_with(EngineConfig {
            event_buffer: 1,
            ..EngineConfig::default()
        });
        let service = state.service.clone();
        let client = serve(state).await;
        let tid = generated(&service, &["A", "B", "C", "D"]).await;

        let mut stream = client.events(tid.0).await.unwrap();
        bracket(next(&mut stream).await);

        // Uncontended service calls complete without yielding to the
        // connection task on this single-threaded runtime.
        report(&service, tid, 1, "A").await;
        report(&service, tid, 2, "C").await;

        let resent = bracket(next(&mut stream).await);
        let final_match = &resent.rounds[1].matches[0];
        assert_eq!(final_match.player1, SlotView::Participant { id: "A".into() });
        assert_eq!(final_match.player2, SlotView::Participant { id: "C".into() });
        assert_eq!(completed_match(next(&mut stream).await), 2);

        report(&service, tid, 3, "A").await;
        let finished = bracket(next(&mut stream).await);
        assert!(finished.finished);
        assert!(next(&mut stream).await.is_none());
        assert_eq!(stream.close_code(), Some(WsCloseCode::NORMAL));
    }
}
