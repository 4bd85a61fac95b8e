pub mod bracket;
pub mod rankings;
pub mod tournament;
pub mod webhook;
pub mod ws;

pub use bracket::{
    BracketResponse, MatchResponse, MatchStatus, ReportResultRequest, RoundResponse, SlotView,
};
pub use rankings::RankingEntry;
pub use tournament::{
    CreateTournamentRequest, RosterChangeRequest, TournamentFormat, TournamentResponse,
};
pub use webhook::EventPayload;
pub use ws::{WsCloseCode, WsServerMessage};
