//! Tournament registry handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use bracket_core::entities::{NewTournament, ParticipantId, TournamentId};
use bracket_sdk::objects::{CreateTournamentRequest, RosterChangeRequest, TournamentResponse};
use uuid::Uuid;

use super::ApiError;
use crate::state::AppState;

/// `GET /tournaments`
pub(super) async fn list_tournaments(State(state): State<AppState>) -> impl IntoResponse {
    let tournaments = state.service.list_tournaments().await;
    Json(
        tournaments
            .iter()
            .map(TournamentResponse::from)
            .collect::<Vec<_>>(),
    )
}

/// `POST /tournaments`
pub(super) async fn create_tournament(
    State(state): State<AppState>,
    Json(request): Json<CreateTournamentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let created_by = participant(request.created_by)?;
    let tournament = state
        .service
        .create_tournament(NewTournament {
            format: request.format,
            max_participants: request.max_participants,
            created_by,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(TournamentResponse::from(&tournament))))
}

/// `GET /tournaments/{tournament_id}`
pub(super) async fn get_tournament(
    State(state): State<AppState>,
    Path(tournament_id): Path<Uuid>,
) -> Result<Json<TournamentResponse>, ApiError> {
    let tournament = state.service.tournament(TournamentId(tournament_id)).await?;
    Ok(Json(TournamentResponse::from(&tournament)))
}

/// `POST /tournaments/{tournament_id}/join`
pub(super) async fn join(
    State(state): State<AppState>,
    Path(tournament_id): Path<Uuid>,
    Json(request): Json<RosterChangeRequest>,
) -> Result<Json<TournamentResponse>, ApiError> {
    let participant = participant(request.participant_id)?;
    let tournament = state
        .service
        .join(TournamentId(tournament_id), participant)
        .await?;
    Ok(Json(TournamentResponse::from(&tournament)))
}

/// `POST /tournaments/{tournament_id}/leave`
pub(super) async fn leave(
    State(state): State<AppState>,
    Path(tournament_id): Path<Uuid>,
    Json(request): Json<RosterChangeRequest>,
) -> Result<Json<TournamentResponse>, ApiError> {
    let participant = participant(request.participant_id)?;
    let tournament = state
        .service
        .leave(TournamentId(tournament_id), participant)
        .await?;
    Ok(Json(TournamentResponse::from(&tournament)))
}

/// Participant handles come from the identity provider; only blank ones
/// are rejected here.
pub(super) fn participant(id: String) -> Result<ParticipantId, ApiError> {
    if id.trim().is_empty() {
        return Err(ApiError::BadRequest("participant id must not be empty"));
    }
    Ok(ParticipantId::from(id))
}
