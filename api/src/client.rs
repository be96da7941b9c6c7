use crate::supabase::{LeagueRow, MatchRow, PlayerStatRow, RowId, SnapshotFile, TeamRow};
use crate::{League, LeagueSnapshot, Match, MatchStatus, PlayerStatLine, Team};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use log::{debug, warn};
use reqwest::{Client, Url};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

pub type ApiResult<T> = Result<T, ApiError>;

const REST_PATH: &str = "rest/v1";
const DEMO_LEAGUE_JSON: &str = include_str!("../../demo_league.json");

/// Read-only client for the league tables behind the federation portal.
#[derive(Debug, Clone)]
pub struct LeagueApi {
    client: Client,
    base_url: Option<String>,
    api_key: Option<String>,
    snapshot_path: Option<PathBuf>,
    timeout: Duration,
}

impl Default for LeagueApi {
    fn default() -> Self {
        Self {
            client: Client::builder()
                .user_agent("leaguetui/0.1 (terminal league portal)")
                .build()
                .unwrap_or_default(),
            base_url: None,
            api_key: None,
            snapshot_path: None,
            timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug)]
pub enum ApiError {
    Network(reqwest::Error, String),
    Api(reqwest::Error, String),
    /// 4xx from the database: missing table, bad filter, row-level security.
    Rejected(reqwest::Error, String),
    Parsing(reqwest::Error, String),
    Snapshot(String),
    NotFound(String),
    Other(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Network(e, url) => write!(f, "Network error for {url}: {e}"),
            ApiError::Api(e, url) => write!(f, "API error for {url}: {e}"),
            ApiError::Rejected(e, url) => write!(f, "Request rejected for {url}: {e}"),
            ApiError::Parsing(e, url) => write!(f, "Parse error for {url}: {e}"),
            ApiError::Snapshot(msg) => write!(f, "Snapshot error: {msg}"),
            ApiError::NotFound(msg) => write!(f, "Not found: {msg}"),
            ApiError::Other(msg) => write!(f, "Error: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl LeagueApi {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            base_url: Some(base_url.into().trim_end_matches('/').to_string()),
            api_key,
            ..Self::default()
        }
    }

    /// Build a client from the environment.
    ///
    /// `SUPABASE_URL` / `SUPABASE_ANON_KEY` (or the `VITE_` prefixed names the
    /// web frontend uses) select the hosted database; `LEAGUETUI_SNAPSHOT_JSON`
    /// points at a local snapshot that takes precedence over the network.
    pub fn from_env() -> Self {
        let base_url = env_first(&["SUPABASE_URL", "VITE_SUPABASE_URL"])
            .map(|u| u.trim_end_matches('/').to_string());
        let api_key = env_first(&["SUPABASE_ANON_KEY", "VITE_SUPABASE_ANON_KEY"]);
        let snapshot_path = env_first(&["LEAGUETUI_SNAPSHOT_JSON"]).map(PathBuf::from);
        Self {
            base_url,
            api_key,
            snapshot_path,
            ..Self::default()
        }
    }

    pub fn with_snapshot(mut self, path: impl Into<PathBuf>) -> Self {
        self.snapshot_path = Some(path.into());
        self
    }

    pub fn is_configured(&self) -> bool {
        self.base_url.is_some()
    }

    /// List the leagues shown in the league picker.
    ///
    /// Without a snapshot or a configured database, the embedded demo league
    /// is the only entry.
    pub async fn fetch_leagues(&self) -> ApiResult<Vec<League>> {
        if let Some(path) = &self.snapshot_path {
            return Ok(vec![load_snapshot_file(path)?.league]);
        }
        if !self.is_configured() {
            return Ok(vec![demo_snapshot()?.league]);
        }
        let rows: Vec<LeagueRow> = self
            .get("leagues", &[("select", "*"), ("order", "name.asc")])
            .await?;
        Ok(rows.into_iter().map(map_league).collect())
    }

    /// Load one league with its teams, matches and player statistics.
    ///
    /// Fallback chain:
    /// 1) `LEAGUETUI_SNAPSHOT_JSON`: local snapshot file, league id ignored.
    /// 2) Hosted database, when `SUPABASE_URL` is set.
    /// 3) Embedded demo league, when no database is configured.
    pub async fn fetch_snapshot(&self, league_id: &str) -> ApiResult<LeagueSnapshot> {
        if let Some(path) = &self.snapshot_path {
            let snapshot = load_snapshot_file(path)?;
            if snapshot.league.id != league_id {
                debug!(
                    "snapshot {} holds league {}, requested {league_id}",
                    path.display(),
                    snapshot.league.id
                );
            }
            return Ok(snapshot);
        }
        if !self.is_configured() {
            return demo_snapshot();
        }

        let filter = format!("eq.{league_id}");
        let league_rows: Vec<LeagueRow> = self
            .get("leagues", &[("select", "*"), ("id", filter.as_str())])
            .await?;
        let league = league_rows
            .into_iter()
            .next()
            .map(map_league)
            .ok_or_else(|| ApiError::NotFound(format!("league {league_id}")))?;

        let team_rows: Vec<TeamRow> = self
            .get(
                "teams",
                &[("select", "*"), ("league_id", filter.as_str()), ("order", "name.asc")],
            )
            .await?;
        let match_rows: Vec<MatchRow> = self.get("matches", &match_query(&filter)).await?;

        // Statistics are optional; a failure here should not hide the table.
        let player_stats = match self
            .get::<Vec<PlayerStatRow>>(
                "player_statistics",
                &[
                    ("select", "*,players(first_name,last_name)"),
                    ("league_id", filter.as_str()),
                ],
            )
            .await
        {
            Ok(rows) => rows.into_iter().map(map_player_stat).collect(),
            Err(e) => {
                warn!("player statistics unavailable: {e}");
                Vec::new()
            }
        };

        Ok(LeagueSnapshot {
            league,
            teams: team_rows.into_iter().map(map_team).collect(),
            matches: match_rows.into_iter().map(map_match).collect(),
            player_stats,
        })
    }

    /// Fetch the league's full match list, used by the periodic refresh.
    ///
    /// The result replaces the cached list, so a rejected request is an
    /// error here rather than an empty list.
    pub async fn fetch_matches(&self, league_id: &str) -> ApiResult<Vec<Match>> {
        if let Some(path) = &self.snapshot_path {
            return Ok(load_snapshot_file(path)?.matches);
        }
        if !self.is_configured() {
            return Ok(demo_snapshot()?.matches);
        }
        let filter = format!("eq.{league_id}");
        let rows: Vec<MatchRow> = self.request("matches", &match_query(&filter)).await?;
        Ok(rows.into_iter().map(map_match).collect())
    }

    /// One read against `table`. Query values are percent-encoded; a 4xx
    /// comes back as `ApiError::Rejected`.
    async fn request<T: serde::de::DeserializeOwned>(
        &self,
        table: &str,
        params: &[(&str, &str)],
    ) -> ApiResult<T> {
        let base = self
            .base_url
            .as_deref()
            .ok_or_else(|| ApiError::Other("SUPABASE_URL is not set".into()))?;
        let mut url = Url::parse(&format!("{base}/{REST_PATH}/{table}"))
            .map_err(|e| ApiError::Other(format!("invalid SUPABASE_URL {base}: {e}")))?;
        {
            let mut query = url.query_pairs_mut();
            for (key, value) in params {
                query.append_pair(key, value);
            }
        }
        let label = url.to_string();

        let mut request = self.client.get(url).timeout(self.timeout);
        if let Some(key) = &self.api_key {
            request = request.header("apikey", key).bearer_auth(key);
        }
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Network(e, label.clone()))?;

        match response.error_for_status() {
            Ok(res) => res
                .json::<T>()
                .await
                .map_err(|e| ApiError::Parsing(e, label)),
            Err(e) if e.status().is_some_and(|s| s.is_client_error()) => {
                Err(ApiError::Rejected(e, label))
            }
            Err(e) => Err(ApiError::Api(e, label)),
        }
    }

    /// Like `request`, but a rejected list read (missing table, row-level
    /// security) yields an empty value.
    async fn get<T: Default + serde::de::DeserializeOwned>(
        &self,
        table: &str,
        params: &[(&str, &str)],
    ) -> ApiResult<T> {
        match self.request(table, params).await {
            Err(ApiError::Rejected(e, url)) => {
                warn!("{url} rejected the request: {e}");
                Ok(T::default())
            }
            other => other,
        }
    }
}

fn match_query(filter: &str) -> [(&str, &str); 3] {
    [("select", "*"), ("league_id", filter), ("order", "match_date.asc")]
}

fn env_first(names: &[&str]) -> Option<String> {
    names
        .iter()
        .filter_map(|name| std::env::var(name).ok())
        .find(|v| !v.trim().is_empty())
}

// ---------------------------------------------------------------------------
// Snapshots
// ---------------------------------------------------------------------------

fn load_snapshot_file(path: &std::path::Path) -> ApiResult<LeagueSnapshot> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| ApiError::Snapshot(format!("could not read {}: {e}", path.display())))?;
    parse_snapshot(&content)
        .map_err(|e| ApiError::Snapshot(format!("invalid snapshot json at {}: {e}", path.display())))
}

fn demo_snapshot() -> ApiResult<LeagueSnapshot> {
    parse_snapshot(DEMO_LEAGUE_JSON)
        .map_err(|e| ApiError::Snapshot(format!("invalid embedded demo league: {e}")))
}

pub fn parse_snapshot(content: &str) -> Result<LeagueSnapshot, serde_json::Error> {
    let raw: SnapshotFile = serde_json::from_str(content)?;
    Ok(LeagueSnapshot {
        league: map_league(raw.league),
        teams: raw.teams.into_iter().map(map_team).collect(),
        matches: raw.matches.into_iter().map(map_match).collect(),
        player_stats: raw.player_statistics.into_iter().map(map_player_stat).collect(),
    })
}

// ---------------------------------------------------------------------------
// Mapping: database rows → clean domain types
// ---------------------------------------------------------------------------

fn map_league(row: LeagueRow) -> League {
    let id = row.id.to_string();
    League {
        name: row.name.unwrap_or_else(|| format!("League {id}")),
        id,
        season: row.season,
        status: row.status,
        start_date: row.start_date.as_deref().and_then(parse_date),
        end_date: row.end_date.as_deref().and_then(parse_date),
    }
}

fn map_team(row: TeamRow) -> Team {
    let id = row.id.to_string();
    Team {
        name: row.name.unwrap_or_else(|| id.clone()),
        id,
        short_name: row.short_name,
    }
}

fn map_match(row: MatchRow) -> Match {
    Match {
        id: row.id.to_string(),
        league_id: row.league_id.map(|id| id.to_string()).unwrap_or_default(),
        home_team_id: row.home_team_id.as_ref().map(RowId::to_string),
        away_team_id: row.away_team_id.as_ref().map(RowId::to_string),
        home_score: row.home_score.and_then(|s| u16::try_from(s).ok()),
        away_score: row.away_score.and_then(|s| u16::try_from(s).ok()),
        scheduled_at: row
            .match_date
            .as_deref()
            .and_then(|d| parse_match_datetime(d, row.match_time.as_deref())),
        status: row.status.as_deref().map(parse_status).unwrap_or_default(),
        venue: row.venue,
        notes: row.notes,
    }
}

fn map_player_stat(row: PlayerStatRow) -> PlayerStatLine {
    let player_id = row.player_id.map(|id| id.to_string()).unwrap_or_default();
    let player_name = row
        .players
        .map(|p| {
            [p.first_name, p.last_name]
                .into_iter()
                .flatten()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| format!("Player {player_id}"));
    let stat = |v: Option<i64>| v.and_then(|n| u16::try_from(n).ok()).unwrap_or_default();

    PlayerStatLine {
        player_id,
        player_name,
        team_id: row.team_id.as_ref().map(RowId::to_string),
        match_id: row.match_id.as_ref().map(RowId::to_string),
        points: stat(row.points),
        rebounds: stat(row.rebounds),
        assists: stat(row.assists),
    }
}

fn parse_status(s: &str) -> MatchStatus {
    match s.trim().to_lowercase().replace([' ', '-'], "_").as_str() {
        "completed" | "complete" | "finished" | "final" | "played" => MatchStatus::Completed,
        "live" | "in_progress" | "ongoing" => MatchStatus::Live,
        "postponed" => MatchStatus::Postponed,
        "cancelled" | "canceled" => MatchStatus::Cancelled,
        _ => MatchStatus::Scheduled,
    }
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    let head = s.get(..10).unwrap_or(s);
    NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}

/// Accepts RFC 3339, naive timestamps (read as UTC) and bare dates, with an
/// optional separate time-of-day column.
fn parse_match_datetime(date: &str, time: Option<&str>) -> Option<DateTime<Utc>> {
    let date = date.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(date) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(date, fmt) {
            return Some(naive.and_utc());
        }
    }
    let day = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
    let tip_off = time
        .map(str::trim)
        .and_then(|t| {
            NaiveTime::parse_from_str(t, "%H:%M:%S")
                .or_else(|_| NaiveTime::parse_from_str(t, "%H:%M"))
                .ok()
        })
        .unwrap_or(NaiveTime::MIN);
    Some(day.and_time(tip_off).and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use mockito::Matcher;

    #[test]
    fn status_strings_map_to_match_status() {
        assert_eq!(parse_status("completed"), MatchStatus::Completed);
        assert_eq!(parse_status("Finished"), MatchStatus::Completed);
        assert_eq!(parse_status("in progress"), MatchStatus::Live);
        assert_eq!(parse_status("in-progress"), MatchStatus::Live);
        assert_eq!(parse_status("postponed"), MatchStatus::Postponed);
        assert_eq!(parse_status("canceled"), MatchStatus::Cancelled);
        assert_eq!(parse_status("upcoming"), MatchStatus::Scheduled);
    }

    #[test]
    fn match_dates_accept_common_shapes() {
        let expected = Utc.with_ymd_and_hms(2025, 3, 1, 18, 30, 0).unwrap();
        assert_eq!(parse_match_datetime("2025-03-01T18:30:00+00:00", None), Some(expected));
        assert_eq!(parse_match_datetime("2025-03-01T20:30:00+02:00", None), Some(expected));
        assert_eq!(parse_match_datetime("2025-03-01T18:30:00", None), Some(expected));
        assert_eq!(parse_match_datetime("2025-03-01 18:30:00.000", None), Some(expected));
        assert_eq!(parse_match_datetime("2025-03-01", Some("18:30")), Some(expected));
        assert_eq!(parse_match_datetime("2025-03-01", Some("18:30:00")), Some(expected));
        assert_eq!(
            parse_match_datetime("2025-03-01", None),
            Some(Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(parse_match_datetime("next tuesday", None), None);
    }

    #[test]
    fn league_dates_tolerate_timestamps() {
        assert_eq!(parse_date("2025-01-15"), NaiveDate::from_ymd_opt(2025, 1, 15));
        assert_eq!(parse_date("2025-01-15T00:00:00Z"), NaiveDate::from_ymd_opt(2025, 1, 15));
        assert_eq!(parse_date("soon"), None);
    }

    #[test]
    fn match_row_maps_ids_scores_and_status() {
        let row: MatchRow = serde_json::from_str(
            r#"{"id": 42, "league_id": "l-1", "home_team_id": 7, "away_team_id": "t-9",
                "home_score": 81, "away_score": -1, "match_date": "2025-03-01",
                "status": "completed", "notes": "Semi Finals", "venue": "Nyayo Gym"}"#,
        )
        .unwrap();
        let m = map_match(row);
        assert_eq!(m.id, "42");
        assert_eq!(m.home_team_id.as_deref(), Some("7"));
        assert_eq!(m.away_team_id.as_deref(), Some("t-9"));
        assert_eq!(m.home_score, Some(81));
        assert_eq!(m.away_score, None, "negative scores are discarded");
        assert_eq!(m.status, MatchStatus::Completed);
        assert_eq!(m.notes.as_deref(), Some("Semi Finals"));
    }

    #[test]
    fn player_stat_name_falls_back_to_id() {
        let row: PlayerStatRow = serde_json::from_str(
            r#"{"player_id": 3, "points": 12, "players": {"first_name": " ", "last_name": null}}"#,
        )
        .unwrap();
        let line = map_player_stat(row);
        assert_eq!(line.player_name, "Player 3");
        assert_eq!(line.points, 12);
        assert_eq!(line.rebounds, 0);

        let row: PlayerStatRow = serde_json::from_str(
            r#"{"player_id": "p1", "players": {"first_name": "Tylor", "last_name": "Ongwae"}}"#,
        )
        .unwrap();
        assert_eq!(map_player_stat(row).player_name, "Tylor Ongwae");
    }

    #[test]
    fn embedded_demo_league_parses() {
        let snapshot = demo_snapshot().expect("demo league should parse");
        assert!(!snapshot.league.name.is_empty());
        assert!(snapshot.teams.len() >= 4);
        assert!(!snapshot.matches.is_empty());
        assert!(!snapshot.player_stats.is_empty());
    }

    #[test]
    fn snapshot_file_errors_name_the_path() {
        let err = load_snapshot_file(std::path::Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.json"));
    }

    #[tokio::test]
    async fn unconfigured_client_serves_demo_league() {
        let api = LeagueApi::default();
        let leagues = api.fetch_leagues().await.unwrap();
        assert_eq!(leagues.len(), 1);
        let snapshot = api.fetch_snapshot(&leagues[0].id).await.unwrap();
        assert_eq!(snapshot.league.id, leagues[0].id);
    }

    #[tokio::test]
    async fn fetch_matches_sends_key_and_filters_by_league() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/rest/v1/matches")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("league_id".into(), "eq.l1".into()),
                Matcher::UrlEncoded("order".into(), "match_date.asc".into()),
            ]))
            .match_header("apikey", "anon-key")
            .match_header("authorization", "Bearer anon-key")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"[{"id": "m1", "league_id": "l1", "home_team_id": "a", "away_team_id": "b",
                     "home_score": 70, "away_score": 64, "match_date": "2025-02-01T17:00:00+00:00",
                     "status": "completed"}]"#,
            )
            .create_async()
            .await;

        let api = LeagueApi::new(server.url(), Some("anon-key".into()));
        let matches = api.fetch_matches("l1").await.unwrap();
        mock.assert_async().await;

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].score(), Some((70, 64)));
        assert_eq!(matches[0].status, MatchStatus::Completed);
    }

    #[tokio::test]
    async fn client_errors_yield_empty_lists() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/rest/v1/leagues")
            .match_query(Matcher::Any)
            .with_status(401)
            .create_async()
            .await;

        let api = LeagueApi::new(server.url(), None);
        assert!(api.fetch_leagues().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn rejected_match_refresh_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/rest/v1/matches")
            .match_query(Matcher::Any)
            .with_status(403)
            .create_async()
            .await;

        let api = LeagueApi::new(server.url(), None);
        let err = api.fetch_matches("l1").await.unwrap_err();
        assert!(matches!(err, ApiError::Rejected(_, _)));
    }

    #[tokio::test]
    async fn league_id_is_encoded_in_filters() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/rest/v1/matches")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("league_id".into(), "eq.a&b#c".into()),
                Matcher::UrlEncoded("order".into(), "match_date.asc".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("[]")
            .create_async()
            .await;

        let api = LeagueApi::new(server.url(), None);
        assert!(api.fetch_matches("a&b#c").await.unwrap().is_empty());
        mock.assert_async().await;
    }

    #[test]
    fn undecided_side_maps_to_none() {
        let row: MatchRow = serde_json::from_str(
            r#"{"id": "m9", "home_team_id": "a", "away_team_id": null, "notes": "Final"}"#,
        )
        .unwrap();
        let m = map_match(row);
        assert_eq!(m.home_team_id.as_deref(), Some("a"));
        assert_eq!(m.away_team_id, None);
    }

    #[tokio::test]
    async fn server_errors_propagate() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/rest/v1/matches")
            .match_query(Matcher::Any)
            .with_status(503)
            .create_async()
            .await;

        let api = LeagueApi::new(server.url(), None);
        let err = api.fetch_matches("l1").await.unwrap_err();
        assert!(matches!(err, ApiError::Api(_, _)));
    }

    #[tokio::test]
    async fn missing_league_is_not_found() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/rest/v1/leagues")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("[]")
            .create_async()
            .await;

        let api = LeagueApi::new(server.url(), None);
        let err = api.fetch_snapshot("nope").await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn snapshot_tolerates_missing_statistics_table() {
        let mut server = mockito::Server::new_async().await;
        let _league = server
            .mock("GET", "/rest/v1/leagues")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"id": 1, "name": "Premier League", "season": "2025"}]"#)
            .create_async()
            .await;
        let _teams = server
            .mock("GET", "/rest/v1/teams")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"id": 10, "name": "Ulinzi Warriors"}, {"id": 11, "name": "KPA"}]"#)
            .create_async()
            .await;
        let _matches = server
            .mock("GET", "/rest/v1/matches")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"id": 100, "home_team_id": 10, "away_team_id": 11}]"#)
            .create_async()
            .await;
        let _stats = server
            .mock("GET", "/rest/v1/player_statistics")
            .match_query(Matcher::Any)
            .with_status(500)
            .create_async()
            .await;

        let api = LeagueApi::new(server.url(), None);
        let snapshot = api.fetch_snapshot("1").await.unwrap();
        assert_eq!(snapshot.league.name, "Premier League");
        assert_eq!(snapshot.teams.len(), 2);
        assert_eq!(snapshot.matches[0].home_team_id.as_deref(), Some("10"));
        assert!(snapshot.player_stats.is_empty());
    }
}
