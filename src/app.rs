use crate::state::app_settings::AppSettings;
use crate::state::app_state::{AppState, ScheduleExport};
use chrono::{Local, Utc};
use league_api::{League, LeagueSnapshot, Match};
use log::info;
use std::path::PathBuf;

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub enum MenuItem {
    #[default]
    Standings,
    Fixtures,
    Results,
    Leaders,
    Generator,
    Help,
}

pub struct App {
    pub settings: AppSettings,
    pub state: AppState,
}

impl App {
    pub fn new(settings: AppSettings) -> Self {
        let mut state = AppState::new();
        state.league.requested = settings.league_id.clone();

        let app = Self { state, settings };

        if let Some(level) = app.settings.log_level {
            log::set_max_level(level);
            tui_logger::set_default_level(level);
        }

        app
    }

    // -----------------------------------------------------------------------
    // Network response handlers, called from main_ui_loop
    // -----------------------------------------------------------------------

    /// Returns the league to load when nothing has been requested yet.
    pub fn on_leagues_loaded(&mut self, leagues: Vec<League>) -> Option<String> {
        self.state.league.leagues = leagues;
        if let Some(requested) = self.state.league.requested.as_deref() {
            if let Some(idx) = self.state.league.leagues.iter().position(|l| l.id == requested) {
                self.state.league.selected_league = idx;
            }
            return None;
        }
        let first = self.state.league.leagues.first()?.id.clone();
        self.state.league.selected_league = 0;
        self.state.league.requested = Some(first.clone());
        Some(first)
    }

    pub fn on_league_loaded(&mut self, snapshot: LeagueSnapshot) {
        self.state.last_error = None;
        self.state.generator.start_date = snapshot.league.start_date;
        self.state.league.load(snapshot, Utc::now());
        self.state.fixtures = Default::default();
        self.state.results = Default::default();
        self.state.leaders = Default::default();
        let teams = self.state.league.teams().to_vec();
        self.state.generator.regenerate(&teams);
    }

    pub fn on_matches_updated(&mut self, matches: Vec<Match>) {
        self.state.league.replace_matches(matches, Utc::now());
    }

    pub fn on_error(&mut self, message: String) {
        self.state.last_error = Some(message);
    }

    // -----------------------------------------------------------------------
    // Tab management
    // -----------------------------------------------------------------------

    pub fn update_tab(&mut self, next: MenuItem) {
        if self.state.active_tab == next {
            return;
        }
        self.state.previous_tab = self.state.active_tab;
        self.state.active_tab = next;
    }

    pub fn exit_help(&mut self) {
        if self.state.active_tab == MenuItem::Help {
            self.state.active_tab = self.state.previous_tab;
        }
    }

    pub fn toggle_show_logs(&mut self) {
        self.state.show_logs = !self.state.show_logs;
    }

    pub fn toggle_full_screen(&mut self) {
        self.settings.full_screen = !self.settings.full_screen;
    }

    // -----------------------------------------------------------------------
    // Navigation
    // -----------------------------------------------------------------------

    pub fn scroll_down(&mut self) {
        let now = Utc::now();
        match self.state.active_tab {
            MenuItem::Standings => self.state.league.scroll_down(),
            MenuItem::Fixtures => {
                let len = self.state.league.upcoming(now).len();
                self.state.fixtures.scroll_down(len);
            }
            MenuItem::Results => {
                let len = self.state.league.results(now).len();
                self.state.results.scroll_down(len);
            }
            MenuItem::Leaders => {
                let len = self.state.league.leaders.len();
                self.state.leaders.scroll_down(len);
            }
            MenuItem::Generator => self.state.generator.scroll_down(),
            MenuItem::Help => {}
        }
    }

    pub fn scroll_up(&mut self) {
        match self.state.active_tab {
            MenuItem::Standings => self.state.league.scroll_up(),
            MenuItem::Fixtures => self.state.fixtures.scroll_up(),
            MenuItem::Results => self.state.results.scroll_up(),
            MenuItem::Leaders => self.state.leaders.scroll_up(),
            MenuItem::Generator => self.state.generator.scroll_up(),
            MenuItem::Help => {}
        }
    }

    pub fn next_stage(&mut self) {
        self.state.league.next_stage();
    }

    pub fn prev_stage(&mut self) {
        self.state.league.prev_stage();
    }

    /// Returns the id of the league to load, if the picker moved.
    pub fn cycle_league(&mut self) -> Option<String> {
        self.state.league.cycle_league()
    }

    // -----------------------------------------------------------------------
    // Fixture generator
    // -----------------------------------------------------------------------

    pub fn generator_toggle_double(&mut self) {
        let teams = self.state.league.teams().to_vec();
        self.state.generator.toggle_double(&teams);
    }

    pub fn generator_save(&mut self) {
        match self.save_schedule_file() {
            Ok(path) => {
                info!("fixtures exported to {path}");
                self.state.generator.saved_to = Some(path);
            }
            Err(e) => self.state.last_error = Some(e),
        }
    }

    fn save_schedule_file(&self) -> Result<String, String> {
        let Some(snapshot) = self.state.league.snapshot.as_ref() else {
            return Err("Generator needs a loaded league".to_string());
        };
        let Some(schedule) = self.state.generator.schedule.as_ref() else {
            return Err("No fixtures generated".to_string());
        };
        let export = ScheduleExport {
            league_id: &snapshot.league.id,
            league_name: &snapshot.league.name,
            generated_at: Local::now().to_rfc3339(),
            teams: &snapshot.teams,
            schedule,
        };
        let path = fixtures_path(&snapshot.league.id);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| format!("create dir failed: {e}"))?;
        }
        let payload = serde_json::to_string_pretty(&export)
            .map_err(|e| format!("serialize fixtures failed: {e}"))?;
        std::fs::write(&path, payload).map_err(|e| format!("write fixtures failed: {e}"))?;
        Ok(path.display().to_string())
    }
}

fn fixtures_path(league_id: &str) -> PathBuf {
    let file_name = format!("fixtures_{}.json", sanitize_file_component(league_id));
    if let Ok(config_dir) = std::env::var("XDG_CONFIG_HOME")
        && !config_dir.trim().is_empty()
    {
        return PathBuf::from(config_dir).join("leaguetui").join(file_name);
    }
    if let Ok(home) = std::env::var("HOME")
        && !home.trim().is_empty()
    {
        return PathBuf::from(home)
            .join(".config")
            .join("leaguetui")
            .join(file_name);
    }
    PathBuf::from(file_name)
}

fn sanitize_file_component(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn league(id: &str) -> League {
        League { id: id.into(), name: id.to_uppercase(), ..Default::default() }
    }

    #[test]
    fn first_league_is_requested_when_none_configured() {
        let mut app = App::new(AppSettings::default());
        let next = app.on_leagues_loaded(vec![league("a"), league("b")]);
        assert_eq!(next.as_deref(), Some("a"));
        assert_eq!(app.state.league.requested.as_deref(), Some("a"));
    }

    #[test]
    fn configured_league_is_not_requested_twice() {
        let settings = AppSettings { league_id: Some("b".into()), ..Default::default() };
        let mut app = App::new(settings);
        assert_eq!(app.on_leagues_loaded(vec![league("a"), league("b")]), None);
        assert_eq!(app.state.league.selected_league, 1);
    }

    #[test]
    fn help_returns_to_previous_tab() {
        let mut app = App::new(AppSettings::default());
        app.update_tab(MenuItem::Results);
        app.update_tab(MenuItem::Help);
        app.exit_help();
        assert_eq!(app.state.active_tab, MenuItem::Results);
    }

    #[test]
    fn loading_a_league_fills_the_generator() {
        let mut app = App::new(AppSettings::default());
        let snapshot = league_api::client::parse_snapshot(include_str!("../demo_league.json")).unwrap();
        let teams = snapshot.teams.len();
        app.on_league_loaded(snapshot);
        let fixtures = app.state.generator.schedule.as_ref().map(|s| s.fixtures.len());
        assert_eq!(fixtures, Some(teams * (teams - 1) / 2));
        app.generator_toggle_double();
        let fixtures = app.state.generator.schedule.as_ref().map(|s| s.fixtures.len());
        assert_eq!(fixtures, Some(teams * (teams - 1)));
    }

    #[test]
    fn saving_without_league_reports_error() {
        let mut app = App::new(AppSettings::default());
        app.generator_save();
        assert!(app.state.generator.saved_to.is_none());
        assert!(app.state.last_error.is_some());
    }

    #[test]
    fn file_names_are_sanitized() {
        assert_eq!(sanitize_file_component("a/b c-1"), "a_b_c-1");
    }
}
