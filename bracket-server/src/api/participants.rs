use axum::{
    Json,
    extract::{Path, State},
};
use bracket_sdk::objects::MatchResponse;

use super::ApiError;
use super::tournaments::participant;
use crate::state::AppState;

/// `GET /participants/{participant_id}/matches`
///
/// Every match the participant was placed in, newest tournament first.
/// Unknown participants get an empty list.
pub(super) async fn list_matches(
    State(state): State<AppState>,
    Path(participant_id): Path<String>,
) -> Result<Json<Vec<MatchResponse>>, ApiError> {
    let participant = participant(participant_id)?;
    let matches = state.service.matches_of(&participant).await;
    Ok(Json(matches.iter().map(MatchResponse::from).collect()))
}
