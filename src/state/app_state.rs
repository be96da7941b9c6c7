use crate::app::MenuItem;
use chrono::{DateTime, Local, NaiveDate, Utc};
use league_api::fixtures::{FixtureOptions, generate_round_robin};
use league_api::standings::{compute_standings, is_completed};
use league_api::stats::league_leaders;
use league_api::{League, LeagueSnapshot, Match, PlayerLeader, PointsSystem, Schedule, Stage, StageTable, Team};
use serde::Serialize;

/// Players need this many games before they show up in the leaders list.
pub const LEADERS_MIN_GAMES: u32 = 1;

// ---------------------------------------------------------------------------
// League / standings state
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct LeagueState {
    pub leagues: Vec<League>,
    pub selected_league: usize,
    /// League id most recently requested from the network worker.
    pub requested: Option<String>,
    pub snapshot: Option<LeagueSnapshot>,
    pub tables: Vec<StageTable>,
    pub leaders: Vec<PlayerLeader>,
    /// Index into `tables`.
    pub selected_stage: usize,
    pub scroll_offset: u16,
    pub last_updated: Option<String>,
}

impl LeagueState {
    /// Store a freshly loaded league and open the stage currently in play.
    pub fn load(&mut self, snapshot: LeagueSnapshot, now: DateTime<Utc>) {
        if let Some(idx) = self.leagues.iter().position(|l| l.id == snapshot.league.id) {
            self.selected_league = idx;
        }
        self.snapshot = Some(snapshot);
        self.recompute(now);
        self.selected_stage = detect_active_stage(&self.tables, self.snapshot_matches(), now);
        self.scroll_offset = 0;
    }

    /// Take the refreshed match list and rebuild every derived table.
    pub fn replace_matches(&mut self, matches: Vec<Match>, now: DateTime<Utc>) {
        let Some(snapshot) = &mut self.snapshot else {
            return;
        };
        snapshot.replace_matches(matches);
        let stage = self.current_table().map(|t| t.stage);
        self.recompute(now);
        // Keep the user on the same stage if it still exists.
        if let Some(idx) = stage.and_then(|s| self.tables.iter().position(|t| t.stage == s)) {
            self.selected_stage = idx;
        } else {
            self.selected_stage = self.selected_stage.min(self.tables.len().saturating_sub(1));
        }
    }

    fn recompute(&mut self, now: DateTime<Utc>) {
        let Some(snapshot) = &self.snapshot else {
            self.tables.clear();
            self.leaders.clear();
            return;
        };
        self.tables = compute_standings(&snapshot.matches, &snapshot.teams, now, PointsSystem::default());
        self.leaders = league_leaders(&snapshot.player_stats, LEADERS_MIN_GAMES);
        self.last_updated = Some(Local::now().format("%H:%M").to_string());
    }

    fn snapshot_matches(&self) -> &[Match] {
        self.snapshot.as_ref().map(|s| s.matches.as_slice()).unwrap_or_default()
    }

    pub fn current_table(&self) -> Option<&StageTable> {
        self.tables.get(self.selected_stage)
    }

    pub fn next_stage(&mut self) {
        if self.selected_stage + 1 < self.tables.len() {
            self.selected_stage += 1;
            self.scroll_offset = 0;
        }
    }

    pub fn prev_stage(&mut self) {
        if self.selected_stage > 0 {
            self.selected_stage -= 1;
            self.scroll_offset = 0;
        }
    }

    pub fn scroll_down(&mut self) {
        let max = self.current_table().map(|t| t.rows.len()).unwrap_or(0).saturating_sub(1) as u16;
        self.scroll_offset = (self.scroll_offset + 1).min(max);
    }

    pub fn scroll_up(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_sub(1);
    }

    /// Pick the next league in the list; returns its id when it differs from
    /// the one already shown.
    pub fn cycle_league(&mut self) -> Option<String> {
        if self.leagues.len() < 2 {
            return None;
        }
        self.selected_league = (self.selected_league + 1) % self.leagues.len();
        let id = self.leagues[self.selected_league].id.clone();
        self.requested = Some(id.clone());
        Some(id)
    }

    pub fn league_name(&self) -> &str {
        self.snapshot
            .as_ref()
            .map(|s| s.league.name.as_str())
            .or_else(|| self.leagues.get(self.selected_league).map(|l| l.name.as_str()))
            .unwrap_or("No league")
    }

    pub fn teams(&self) -> &[Team] {
        self.snapshot.as_ref().map(|s| s.teams.as_slice()).unwrap_or_default()
    }

    /// Matches still to be played, soonest first; undated ones last.
    pub fn upcoming(&self, now: DateTime<Utc>) -> Vec<&Match> {
        let mut out: Vec<&Match> = self
            .snapshot_matches()
            .iter()
            .filter(|m| !is_completed(m, now))
            .collect();
        out.sort_by_key(|m| (m.scheduled_at.is_none(), m.scheduled_at));
        out
    }

    /// Completed matches, most recent first.
    pub fn results(&self, now: DateTime<Utc>) -> Vec<&Match> {
        let mut out: Vec<&Match> = self
            .snapshot_matches()
            .iter()
            .filter(|m| is_completed(m, now))
            .collect();
        out.sort_by(|a, b| b.scheduled_at.cmp(&a.scheduled_at));
        out
    }
}

/// The stage "in play": the latest stage with a completed match, or the
/// first stage when nothing has been played yet.
fn detect_active_stage(tables: &[StageTable], matches: &[Match], now: DateTime<Utc>) -> usize {
    let played: Vec<Stage> = matches
        .iter()
        .filter(|m| is_completed(m, now))
        .map(|m| league_api::standings::infer_stage(m.notes.as_deref()))
        .collect();
    tables
        .iter()
        .rposition(|t| played.contains(&t.stage))
        .unwrap_or(0)
}

// ---------------------------------------------------------------------------
// Scrollable list state (fixtures, results, leaders)
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct ListState {
    pub scroll_offset: u16,
}

impl ListState {
    pub fn scroll_down(&mut self, len: usize) {
        let max = len.saturating_sub(1) as u16;
        self.scroll_offset = (self.scroll_offset + 1).min(max);
    }

    pub fn scroll_up(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_sub(1);
    }
}

// ---------------------------------------------------------------------------
// Fixture generator state
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct GeneratorState {
    pub double_round_robin: bool,
    pub start_date: Option<NaiveDate>,
    pub schedule: Option<Schedule>,
    pub error: Option<String>,
    pub saved_to: Option<String>,
    pub scroll_offset: u16,
}

impl GeneratorState {
    pub fn regenerate(&mut self, teams: &[Team]) {
        let options = FixtureOptions {
            double_round_robin: self.double_round_robin,
            start_date: self.start_date,
            days_between_rounds: 7,
        };
        match generate_round_robin(teams, &options) {
            Ok(schedule) => {
                self.schedule = Some(schedule);
                self.error = None;
            }
            Err(e) => {
                self.schedule = None;
                self.error = Some(e.to_string());
            }
        }
        self.saved_to = None;
        self.scroll_offset = 0;
    }

    pub fn toggle_double(&mut self, teams: &[Team]) {
        self.double_round_robin = !self.double_round_robin;
        self.regenerate(teams);
    }

    pub fn scroll_down(&mut self) {
        let len = self.schedule.as_ref().map(|s| s.fixtures.len()).unwrap_or(0);
        let max = len.saturating_sub(1) as u16;
        self.scroll_offset = (self.scroll_offset + 1).min(max);
    }

    pub fn scroll_up(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_sub(1);
    }
}

/// File written by the generator's export.
#[derive(Debug, Serialize)]
pub struct ScheduleExport<'a> {
    pub league_id: &'a str,
    pub league_name: &'a str,
    pub generated_at: String,
    pub teams: &'a [Team],
    pub schedule: &'a Schedule,
}

// ---------------------------------------------------------------------------
// Root app state
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct AppState {
    pub active_tab: MenuItem,
    pub previous_tab: MenuItem,
    pub show_logs: bool,
    pub last_error: Option<String>,
    pub league: LeagueState,
    pub fixtures: ListState,
    pub results: ListState,
    pub leaders: ListState,
    pub generator: GeneratorState,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use league_api::MatchStatus;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn game(id: &str, home: &str, away: &str, score: Option<(u16, u16)>, days_ago: i64, notes: &str) -> Match {
        Match {
            id: id.into(),
            league_id: "l1".into(),
            home_team_id: Some(home.into()),
            away_team_id: Some(away.into()),
            home_score: score.map(|s| s.0),
            away_score: score.map(|s| s.1),
            scheduled_at: Some(now() - Duration::days(days_ago)),
            status: MatchStatus::Scheduled,
            venue: None,
            notes: Some(notes.into()),
        }
    }

    fn team(id: &str) -> Team {
        Team { id: id.into(), name: id.to_uppercase(), short_name: None }
    }

    fn snapshot(matches: Vec<Match>) -> LeagueSnapshot {
        LeagueSnapshot {
            league: League { id: "l1".into(), name: "Test League".into(), ..Default::default() },
            teams: vec![team("a"), team("b"), team("c"), team("d")],
            matches,
            player_stats: Vec::new(),
        }
    }

    #[test]
    fn load_opens_latest_played_stage() {
        let mut state = LeagueState::default();
        state.load(
            snapshot(vec![
                game("m1", "a", "b", Some((70, 60)), 10, "Group A"),
                game("m2", "c", "d", Some((70, 60)), 10, "Group A"),
                game("m3", "a", "c", Some((70, 60)), 2, "Semi Finals"),
                game("m4", "a", "c", None, -5, "Final"),
            ]),
            now(),
        );
        assert_eq!(state.tables.len(), 3);
        assert_eq!(state.current_table().map(|t| t.stage), Some(Stage::SemiFinals));
    }

    #[test]
    fn stage_navigation_is_clamped() {
        let mut state = LeagueState::default();
        state.load(
            snapshot(vec![
                game("m1", "a", "b", Some((70, 60)), 10, "Group A"),
                game("m2", "a", "b", None, -5, "Final"),
            ]),
            now(),
        );
        assert_eq!(state.selected_stage, 0);
        state.prev_stage();
        assert_eq!(state.selected_stage, 0);
        state.next_stage();
        state.next_stage();
        assert_eq!(state.current_table().map(|t| t.stage), Some(Stage::Final));
    }

    #[test]
    fn refresh_keeps_selected_stage_and_updates_rows() {
        let mut state = LeagueState::default();
        state.load(
            snapshot(vec![
                game("m1", "a", "b", Some((70, 60)), 10, "Group A"),
                game("m2", "c", "d", None, 1, "Group A"),
            ]),
            now(),
        );
        let before: u32 = state.tables[0].rows.iter().map(|r| r.played).sum();
        assert_eq!(before, 2);

        state.replace_matches(
            vec![
                game("m1", "a", "b", Some((70, 60)), 10, "Group A"),
                game("m2", "c", "d", Some((55, 66)), 1, "Group A"),
            ],
            now(),
        );
        let after: u32 = state.tables[0].rows.iter().map(|r| r.played).sum();
        assert_eq!(after, 4);
        assert_eq!(state.selected_stage, 0);
    }

    #[test]
    fn refresh_drops_matches_the_server_no_longer_lists() {
        let mut state = LeagueState::default();
        state.load(
            snapshot(vec![
                game("m1", "a", "b", Some((70, 60)), 10, "Group A"),
                game("m2", "a", "c", Some((70, 60)), 5, "Group A"),
            ]),
            now(),
        );
        state.replace_matches(vec![game("m1", "a", "b", Some((70, 60)), 10, "Group A")], now());

        assert_eq!(state.snapshot.as_ref().map(|s| s.matches.len()), Some(1));
        let a = state.tables[0].rows.iter().find(|r| r.team_id == "a").unwrap();
        assert_eq!(a.played, 1);
        assert_eq!(a.form.as_str(), "W----");
    }

    #[test]
    fn upcoming_and_results_are_split_and_ordered() {
        let mut state = LeagueState::default();
        let mut undated = game("m5", "a", "d", None, 0, "Group A");
        undated.scheduled_at = None;
        state.load(
            snapshot(vec![
                game("m1", "a", "b", Some((70, 60)), 10, "Group A"),
                game("m2", "c", "d", Some((70, 60)), 3, "Group A"),
                game("m3", "a", "c", None, -2, "Group A"),
                game("m4", "b", "d", None, -1, "Group A"),
                undated,
            ]),
            now(),
        );
        let upcoming: Vec<&str> = state.upcoming(now()).iter().map(|m| m.id.as_str()).collect();
        assert_eq!(upcoming, vec!["m4", "m3", "m5"]);
        let results: Vec<&str> = state.results(now()).iter().map(|m| m.id.as_str()).collect();
        assert_eq!(results, vec!["m2", "m1"]);
    }

    #[test]
    fn cycle_league_wraps_and_records_request() {
        let mut state = LeagueState {
            leagues: vec![
                League { id: "x".into(), name: "X".into(), ..Default::default() },
                League { id: "y".into(), name: "Y".into(), ..Default::default() },
            ],
            ..Default::default()
        };
        assert_eq!(state.cycle_league().as_deref(), Some("y"));
        assert_eq!(state.cycle_league().as_deref(), Some("x"));
        assert_eq!(state.requested.as_deref(), Some("x"));

        state.leagues.truncate(1);
        assert_eq!(state.cycle_league(), None);
    }

    #[test]
    fn generator_reports_errors_and_toggles_double() {
        let mut generator = GeneratorState::default();
        generator.regenerate(&[team("a")]);
        assert!(generator.schedule.is_none());
        assert!(generator.error.as_deref().unwrap_or_default().contains("at least 2"));

        let teams = vec![team("a"), team("b"), team("c"), team("d")];
        generator.regenerate(&teams);
        assert_eq!(generator.schedule.as_ref().map(|s| s.fixtures.len()), Some(6));
        generator.toggle_double(&teams);
        assert_eq!(generator.schedule.as_ref().map(|s| s.fixtures.len()), Some(12));
        assert!(generator.error.is_none());
    }
}
