//! Tournament API client.

use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;
use uuid::Uuid;

use super::ClientError;
use super::events::EventStream;
use crate::objects::{
    BracketResponse, CreateTournamentRequest, MatchResponse, RankingEntry, ReportResultRequest,
    RosterChangeRequest, TournamentResponse,
};

/// Typed HTTP client for the bracket server API.
#[derive(Debug, Clone)]
pub struct BracketClient {
    http: Client,
    base_url: Url,
}

impl BracketClient {
    /// Create a new `BracketClient`.
    ///
    /// * `base_url` – root URL of the bracket server (e.g. `https://brackets.example.com`).
    pub fn new(base_url: Url) -> Self {
        Self {
            http: Client::new(),
            base_url,
        }
    }

    /// Replace the default `reqwest::Client` with a custom one (e.g. to
    /// configure timeouts or a proxy).
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    /// `POST /api/v1/tournaments` – create a tournament.
    pub async fn create_tournament(
        &self,
        request: &CreateTournamentRequest,
    ) -> Result<TournamentResponse, ClientError> {
        self.post_json("/api/v1/tournaments", request).await
    }

    /// `GET /api/v1/tournaments/{id}` – fetch a tournament.
    pub async fn get_tournament(
        &self,
        tournament_id: Uuid,
    ) -> Result<TournamentResponse, ClientError> {
        let url = self
            .base_url
            .join(&format!("/api/v1/tournaments/{tournament_id}"))?;
        parse_response(self.http.get(url).send().await?).await
    }

    /// `POST /api/v1/tournaments/{id}/join` – add a participant to the roster.
    pub async fn join(
        &self,
        tournament_id: Uuid,
        participant_id: impl Into<String>,
    ) -> Result<TournamentResponse, ClientError> {
        let body = RosterChangeRequest {
            participant_id: participant_id.into(),
        };
        self.post_json(&format!("/api/v1/tournaments/{tournament_id}/join"), &body)
            .await
    }

    /// `POST /api/v1/tournaments/{id}/leave` – remove a participant from the
    /// roster.
    pub async fn leave(
        &self,
        tournament_id: Uuid,
        participant_id: impl Into<String>,
    ) -> Result<TournamentResponse, ClientError> {
        let body = RosterChangeRequest {
            participant_id: participant_id.into(),
        };
        self.post_json(&format!("/api/v1/tournaments/{tournament_id}/leave"), &body)
            .await
    }

    /// `POST /api/v1/tournaments/{id}/bracket/generate` – generate the bracket.
    pub async fn generate(&self, tournament_id: Uuid) -> Result<BracketResponse, ClientError> {
        let url = self
            .base_url
            .join(&format!("/api/v1/tournaments/{tournament_id}/bracket/generate"))?;
        parse_response(self.http.post(url).send().await?).await
    }

    /// `GET /api/v1/tournaments/{id}/bracket` – fetch the current bracket.
    pub async fn get_bracket(&self, tournament_id: Uuid) -> Result<BracketResponse, ClientError> {
        let url = self
            .base_url
            .join(&format!("/api/v1/tournaments/{tournament_id}/bracket"))?;
        parse_response(self.http.get(url).send().await?).await
    }

    /// `POST /api/v1/tournaments/{id}/matches/{match_id}/report` – report the
    /// winner of a match.
    ///
    /// Repeating a report with the same winner is safe and returns the
    /// recorded match.
    pub async fn report_result(
        &self,
        tournament_id: Uuid,
        match_id: u32,
        request: &ReportResultRequest,
    ) -> Result<MatchResponse, ClientError> {
        self.post_json(
            &format!("/api/v1/tournaments/{tournament_id}/matches/{match_id}/report"),
            request,
        )
        .await
    }

    /// `GET /api/v1/participants/{id}/matches` – every match a participant
    /// was placed in, newest tournament first.
    pub async fn participant_matches(
        &self,
        participant_id: &str,
    ) -> Result<Vec<MatchResponse>, ClientError> {
        let url = self
            .base_url
            .join(&format!("/api/v1/participants/{participant_id}/matches"))?;
        parse_response(self.http.get(url).send().await?).await
    }

    /// `GET /api/v1/rankings` – fetch the ranking board.
    pub async fn rankings(&self) -> Result<Vec<RankingEntry>, ClientError> {
        let url = self.base_url.join("/api/v1/rankings")?;
        parse_response(self.http.get(url).send().await?).await
    }

    /// Open the `GET /api/v1/tournaments/{id}/ws` event stream.
    pub async fn events(&self, tournament_id: Uuid) -> Result<EventStream, ClientError> {
        let mut url = self
            .base_url
            .join(&format!("/api/v1/tournaments/{tournament_id}/ws"))?;
        let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
        // Only fails for cannot-be-a-base URLs, which `join` never yields here.
        let _ = url.set_scheme(scheme);
        EventStream::connect(url).await
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let url = self.base_url.join(path)?;
        let resp = self
            .http
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(serde_json::to_string(body)?)
            .send()
            .await?;
        parse_response(resp).await
    }
}

async fn parse_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ClientError> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(ClientError::Api { status, body });
    }
    let bytes = resp.bytes().await?;
    serde_json::from_slice(&bytes).map_err(ClientError::Json)
}
