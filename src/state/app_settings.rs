use log::LevelFilter;

#[derive(Debug, Default, Clone)]
pub struct AppSettings {
    pub full_screen: bool,
    pub log_level: Option<LevelFilter>,
    /// League opened on startup; the first league listed when unset.
    pub league_id: Option<String>,
}

impl AppSettings {
    /// Read settings from the environment. `--league` on the command line
    /// overrides `LEAGUETUI_LEAGUE_ID`.
    pub fn load() -> Self {
        let log_level = std::env::var("LEAGUETUI_LOG_LEVEL")
            .ok()
            .and_then(|v| v.trim().parse::<LevelFilter>().ok());
        let league_id = std::env::var("LEAGUETUI_LEAGUE_ID")
            .ok()
            .filter(|v| !v.trim().is_empty());
        Self { full_screen: false, log_level, league_id }
    }

    pub fn with_league(mut self, league_id: Option<String>) -> Self {
        if league_id.is_some() {
            self.league_id = league_id;
        }
        self
    }
}
