use crate::state::network::LoadingState;
use crossterm::event::KeyEvent;
use league_api::{League, LeagueSnapshot, Match};

#[derive(Debug, Clone)]
pub enum NetworkRequest {
    LoadLeagues,
    LoadLeague { league_id: String },
    /// Re-fetch matches for whichever league was loaded last.
    RefreshMatches,
}

#[derive(Debug)]
pub enum NetworkResponse {
    LoadingStateChanged { loading_state: LoadingState },
    LeaguesLoaded { leagues: Vec<League> },
    LeagueLoaded { snapshot: LeagueSnapshot },
    MatchesUpdated { matches: Vec<Match> },
    Error { message: String },
}

#[derive(Debug, Clone)]
pub enum UiEvent {
    KeyPressed(KeyEvent),
    Resize,
    AppStarted,
}
