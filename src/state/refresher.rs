use crate::state::messages::NetworkRequest;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::interval;

pub const REFRESH_INTERVAL: Duration = Duration::from_secs(60);

/// Periodic match refresh. Teams and statistics are loaded once per league;
/// only scores and statuses move during a matchday.
pub struct PeriodicRefresher {
    network_requests: mpsc::Sender<NetworkRequest>,
}

impl PeriodicRefresher {
    pub fn new(network_requests: mpsc::Sender<NetworkRequest>) -> Self {
        Self { network_requests }
    }

    pub async fn run(self) {
        let mut matches_interval = interval(REFRESH_INTERVAL);
        // Skip the immediate first tick so startup loading isn't double-triggered.
        matches_interval.tick().await;

        loop {
            matches_interval.tick().await;
            if self
                .network_requests
                .send(NetworkRequest::RefreshMatches)
                .await
                .is_err()
            {
                break;
            }
        }
    }
}
