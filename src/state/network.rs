use crate::state::messages::{NetworkRequest, NetworkResponse};
use league_api::client::{ApiError, LeagueApi};
use log::{debug, error, info};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;

const SPINNER_CHARS: [char; 10] = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];
pub const ERROR_CHAR: char = '!';

#[derive(Debug, Copy, Clone)]
pub struct LoadingState {
    pub is_loading: bool,
    pub spinner_char: char,
}

impl Default for LoadingState {
    fn default() -> Self {
        Self { is_loading: false, spinner_char: ' ' }
    }
}

pub struct NetworkWorker {
    client: LeagueApi,
    requests: mpsc::Receiver<NetworkRequest>,
    responses: mpsc::Sender<NetworkResponse>,
    is_loading: Arc<AtomicBool>,
    current_league: Option<String>,
}

impl NetworkWorker {
    pub fn new(
        client: LeagueApi,
        requests: mpsc::Receiver<NetworkRequest>,
        responses: mpsc::Sender<NetworkResponse>,
    ) -> Self {
        Self {
            client,
            requests,
            responses,
            is_loading: Arc::new(AtomicBool::new(false)),
            current_league: None,
        }
    }

    pub async fn run(mut self) {
        while let Some(request) = self.requests.recv().await {
            if matches!(request, NetworkRequest::RefreshMatches) && self.current_league.is_none() {
                debug!("refresh skipped: no league loaded yet");
                continue;
            }

            self.start_loading_animation().await;

            let result = match request {
                NetworkRequest::LoadLeagues => self.handle_load_leagues().await,
                NetworkRequest::LoadLeague { league_id } => self.handle_load_league(league_id).await,
                NetworkRequest::RefreshMatches => self.handle_refresh_matches().await,
            };

            debug!("network request complete");
            self.stop_loading_animation(result.is_ok()).await;

            let response = result.unwrap_or_else(|err| NetworkResponse::Error {
                message: err.to_string(),
            });

            if let Err(e) = self.responses.send(response).await {
                error!("Failed to send network response: {e}");
                break;
            }
        }
    }

    async fn handle_load_leagues(&self) -> Result<NetworkResponse, ApiError> {
        debug!("loading league list");
        let leagues = self.client.fetch_leagues().await?;
        info!("{} league(s) available", leagues.len());
        Ok(NetworkResponse::LeaguesLoaded { leagues })
    }

    async fn handle_load_league(&mut self, league_id: String) -> Result<NetworkResponse, ApiError> {
        debug!("loading league {league_id}");
        let snapshot = self.client.fetch_snapshot(&league_id).await?;
        info!(
            "loaded {}: {} teams, {} matches",
            snapshot.league.name,
            snapshot.teams.len(),
            snapshot.matches.len()
        );
        self.current_league = Some(league_id);
        Ok(NetworkResponse::LeagueLoaded { snapshot })
    }

    async fn handle_refresh_matches(&self) -> Result<NetworkResponse, ApiError> {
        let Some(league_id) = self.current_league.as_deref() else {
            return Err(ApiError::Other("no league loaded".into()));
        };
        debug!("refreshing matches for league {league_id}");
        let matches = self.client.fetch_matches(league_id).await?;
        Ok(NetworkResponse::MatchesUpdated { matches })
    }

    async fn start_loading_animation(&self) {
        self.is_loading.store(true, Ordering::Relaxed);

        let mut loading_state =
            LoadingState { is_loading: true, spinner_char: SPINNER_CHARS[0] };
        let _ = self
            .responses
            .send(NetworkResponse::LoadingStateChanged { loading_state })
            .await;

        let responses = self.responses.clone();
        let is_loading = self.is_loading.clone();

        tokio::spawn(async move {
            let mut spinner_index = 1;
            let mut interval = tokio::time::interval(Duration::from_millis(33));
            loop {
                interval.tick().await;
                if !is_loading.load(Ordering::Relaxed) {
                    break;
                }
                loading_state.spinner_char = SPINNER_CHARS[spinner_index];
                spinner_index = (spinner_index + 1) % SPINNER_CHARS.len();
                let _ = responses
                    .send(NetworkResponse::LoadingStateChanged { loading_state })
                    .await;
            }
        });
    }

    async fn stop_loading_animation(&self, is_ok: bool) {
        self.is_loading.store(false, Ordering::Relaxed);
        tokio::time::sleep(Duration::from_millis(15)).await;

        let spinner_char = if is_ok { ' ' } else { ERROR_CHAR };
        let _ = self
            .responses
            .send(NetworkResponse::LoadingStateChanged {
                loading_state: LoadingState { is_loading: false, spinner_char },
            })
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn worker_loads_demo_league_and_refreshes() {
        let (req_tx, req_rx) = mpsc::channel(8);
        let (resp_tx, mut resp_rx) = mpsc::channel(64);
        let worker = NetworkWorker::new(LeagueApi::default(), req_rx, resp_tx);
        let handle = tokio::spawn(worker.run());

        req_tx.send(NetworkRequest::RefreshMatches).await.unwrap();
        req_tx
            .send(NetworkRequest::LoadLeague { league_id: "demo".into() })
            .await
            .unwrap();
        req_tx.send(NetworkRequest::RefreshMatches).await.unwrap();
        drop(req_tx);

        let mut loaded = false;
        let mut refreshed = false;
        while let Some(response) = resp_rx.recv().await {
            match response {
                NetworkResponse::LeagueLoaded { snapshot } => {
                    assert!(!refreshed, "refresh before load must be skipped");
                    assert!(!snapshot.teams.is_empty());
                    loaded = true;
                }
                NetworkResponse::MatchesUpdated { matches } => {
                    assert!(loaded);
                    assert!(!matches.is_empty());
                    refreshed = true;
                }
                NetworkResponse::Error { message } => panic!("unexpected error: {message}"),
                _ => {}
            }
        }
        handle.await.unwrap();
        assert!(loaded && refreshed);
    }
}
