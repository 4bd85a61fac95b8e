//! Bracket generation and result reporting.

use axum::{
    Json,
    extract::{Path, State},
};
use bracket_core::entities::{EvidenceRef, MatchId, TournamentId};
use bracket_sdk::objects::{BracketResponse, MatchResponse, ReportResultRequest};
use uuid::Uuid;

use super::ApiError;
use super::tournaments::participant;
use crate::state::AppState;

/// `POST /tournaments/{tournament_id}/bracket/generate`
///
/// Freezes the roster. Bye walkovers are already resolved in the returned
/// bracket.
pub(super) async fn generate(
    State(state): State<AppState>,
    Path(tournament_id): Path<Uuid>,
) -> Result<Json<BracketResponse>, ApiError> {
    let bracket = state.service.generate(TournamentId(tournament_id)).await?;
    Ok(Json(BracketResponse::from(&bracket)))
}

/// `GET /tournaments/{tournament_id}/bracket`
pub(super) async fn get_bracket(
    State(state): State<AppState>,
    Path(tournament_id): Path<Uuid>,
) -> Result<Json<BracketResponse>, ApiError> {
    let bracket = state.service.bracket(TournamentId(tournament_id)).await?;
    Ok(Json(BracketResponse::from(&bracket)))
}

/// `POST /tournaments/{tournament_id}/matches/{match_id}/report`
///
/// Reporting the already-recorded winner again answers 200 with the
/// unchanged match.
pub(super) async fn report_result(
    State(state): State<AppState>,
    Path((tournament_id, match_id)): Path<(Uuid, u32)>,
    Json(request): Json<ReportResultRequest>,
) -> Result<Json<MatchResponse>, ApiError> {
    let winner = participant(request.winner_id)?;
    let evidence = request
        .evidence
        .filter(|e| !e.trim().is_empty())
        .map(EvidenceRef::new);
    let m = state
        .service
        .report_result(TournamentId(tournament_id), MatchId(match_id), winner, evidence)
        .await?;
    Ok(Json(MatchResponse::from(&m)))
}
