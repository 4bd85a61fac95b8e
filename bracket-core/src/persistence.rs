//! Snapshot persistence.
//!
//! The in-memory state of every tournament can be written to a JSON file on
//! shutdown and loaded again on startup. Writes go to a temporary file that
//! is renamed over the target, so a crash mid-write keeps the old snapshot.

use crate::engine::BracketLayout;
use crate::entities::{Match, Tournament, TournamentId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed snapshot: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported snapshot version {0}, expected {SNAPSHOT_VERSION}")]
    UnsupportedVersion(u32),
    #[error("invalid snapshot for tournament {tournament_id}: {reason}")]
    Invalid {
        tournament_id: TournamentId,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BracketRecord {
    pub layout: BracketLayout,
    pub matches: Vec<Match>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TournamentRecord {
    pub tournament: Tournament,
    pub bracket: Option<BracketRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u32,
    /// Unix seconds.
    pub taken_at: i64,
    pub tournaments: Vec<TournamentRecord>,
}

impl Snapshot {
    pub fn new(tournaments: Vec<TournamentRecord>) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            taken_at: time::OffsetDateTime::now_utc().unix_timestamp(),
            tournaments,
        }
    }

    /// Load a snapshot. A missing file yields `None`.
    pub async fn load(path: &Path) -> Result<Option<Self>, PersistenceError> {
        let content = match tokio::fs::read(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let snapshot: Snapshot = serde_json::from_slice(&content)?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(PersistenceError::UnsupportedVersion(snapshot.version));
        }
        Ok(Some(snapshot))
    }

    pub async fn save(&self, path: &Path) -> Result<(), PersistenceError> {
        let content = serde_json::to_vec_pretty(self)?;
        let tmp_path = path.with_extension("tmp");
        tokio::fs::write(&tmp_path, content).await?;
        tokio::fs::rename(&tmp_path, path).await?;
        tracing::debug!(path = %path.display(), "Snapshot written");
        Ok(())
    }

    /// Check the structural invariants a restored bracket relies on.
    pub fn validate(&self) -> Result<(), PersistenceError> {
        let mut seen = HashSet::new();
        for record in &self.tournaments {
            let tournament_id = record.tournament.id;
            let invalid = |reason: String| PersistenceError::Invalid {
                tournament_id,
                reason,
            };
            if !seen.insert(tournament_id) {
                return Err(invalid("duplicate tournament".to_string()));
            }
            let Some(bracket) = &record.bracket else {
                continue;
            };
            if !record.tournament.roster.is_locked() {
                return Err(invalid("bracket present but roster not locked".to_string()));
            }
            let mut ids = HashSet::new();
            for m in &bracket.matches {
                if m.tournament_id != tournament_id {
                    return Err(invalid(format!("match {} belongs elsewhere", m.id)));
                }
                if bracket.layout.position(m.id) != Some((m.round, m.slot)) {
                    return Err(invalid(format!("match {} is out of position", m.id)));
                }
                if !ids.insert(m.id) {
                    return Err(invalid(format!("match {} appears twice", m.id)));
                }
                if m.is_completed() && !m.winner.as_ref().is_some_and(|w| m.has_participant(w)) {
                    return Err(invalid(format!("match {} has an invalid winner", m.id)));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{MatchStore, Progression, build};
    use crate::entities::{MatchId, NewTournament, ParticipantId};
    use bracket_sdk::objects::TournamentFormat;

    fn record(participants: &[&str]) -> TournamentRecord {
        let mut tournament = Tournament::new(
            TournamentId::generate(),
            NewTournament {
                format: TournamentFormat::SingleElimination,
                max_participants: 16,
                created_by: "organizer".into(),
            },
        );
        let ids: Vec<ParticipantId> = participants.iter().map(|p| (*p).into()).collect();
        for id in &ids {
            tournament.roster.join(id.clone(), 16).unwrap();
        }
        tournament.roster.lock();
        let round1 = build(tournament.id, &ids).unwrap();
        let layout = round1.layout;
        let empty = MatchStore::new();
        let changes = Progression::new(tournament.id, layout, &empty)
            .seed(round1)
            .unwrap();
        TournamentRecord {
            tournament,
            bracket: Some(BracketRecord {
                layout,
                matches: changes.matches,
            }),
        }
    }

    #[test]
    fn test_validate_accepts_generated_bracket() {
        let snapshot = Snapshot::new(vec![record(&["A", "B", "C"])]);
        snapshot.validate().unwrap();
    }

    #[test]
    fn test_validate_rejects_misplaced_match() {
        let mut rec = record(&["A", "B", "C", "D"]);
        rec.bracket.as_mut().unwrap().matches[0].id = MatchId(3);
        let err = Snapshot::new(vec![rec]).validate().unwrap_err();
        assert!(matches!(err, PersistenceError::Invalid { .. }));
    }

    #[test]
    fn test_validate_rejects_unlocked_roster_with_bracket() {
        let mut rec = record(&["A", "B"]);
        rec.tournament.roster = Default::default();
        let err = Snapshot::new(vec![rec]).validate().unwrap_err();
        assert!(matches!(err, PersistenceError::Invalid { .. }));
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let dir = std::env::temp_dir().join(format!("bracket-snapshot-{}", uuid::Uuid::now_v7()));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let path = dir.join("state.json");

        assert!(Snapshot::load(&path).await.unwrap().is_none());

        let snapshot = Snapshot::new(vec![record(&["A", "B", "C", "D", "E"])]);
        snapshot.save(&path).await.unwrap();
        let loaded = Snapshot::load(&path).await.unwrap().unwrap();
        assert_eq!(loaded, snapshot);

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn test_load_rejects_other_versions() {
        let dir = std::env::temp_dir().join(format!("bracket-snapshot-{}", uuid::Uuid::now_v7()));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let path = dir.join("state.json");
        tokio::fs::write(&path, r#"{"version":99,"taken_at":0,"tournaments":[]}"#)
            .await
            .unwrap();

        let err = Snapshot::load(&path).await.unwrap_err();
        assert!(matches!(err, PersistenceError::UnsupportedVersion(99)));
        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }
}
