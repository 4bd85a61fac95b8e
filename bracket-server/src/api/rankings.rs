use axum::{Json, extract::State};
use bracket_sdk::objects::RankingEntry;

use crate::state::AppState;

/// `GET /rankings` – standings, highest points first.
pub(super) async fn get_rankings(State(state): State<AppState>) -> Json<Vec<RankingEntry>> {
    Json(state.rankings.standings().await)
}
