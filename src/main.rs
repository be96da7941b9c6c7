mod app;
mod components;
mod draw;
mod keys;
mod state;
mod ui;

use crate::app::App;
use crate::state::app_settings::AppSettings;
use crate::state::messages::{NetworkRequest, NetworkResponse, UiEvent};
use crate::state::network::{LoadingState, NetworkWorker};
use crate::state::refresher::PeriodicRefresher;
use crossterm::event::{self as crossterm_event, Event};
use crossterm::{cursor, execute, terminal};
use league_api::client::LeagueApi;
use log::{error, info};
use std::io::Stdout;
use std::sync::Arc;
use std::{io, panic};
use tokio::sync::{Mutex, mpsc};
use tui::{Terminal, backend::CrosstermBackend};

#[derive(Debug, Default, PartialEq)]
struct CliArgs {
    league_id: Option<String>,
}

enum CliAction {
    Run(CliArgs),
    Exit,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = match handle_cli_args(std::env::args().skip(1)) {
        Ok(CliAction::Run(args)) => args,
        Ok(CliAction::Exit) => return Ok(()),
        Err(message) => {
            eprintln!("{message}\n\n{}", usage_text());
            std::process::exit(2);
        }
    };

    better_panic::install();

    let backend = CrosstermBackend::new(io::stdout());
    let terminal = Terminal::new(backend)?;

    setup_panic_hook();
    setup_terminal()?;

    tui_logger::init_logger(log::LevelFilter::Error)?;
    tui_logger::set_default_level(log::LevelFilter::Error);

    let settings = AppSettings::load().with_league(args.league_id);
    let app = Arc::new(Mutex::new(App::new(settings)));

    let client = LeagueApi::from_env();
    if client.is_configured() {
        info!("reading league data from the hosted database");
    } else {
        info!("no database configured, using bundled demo league");
    }

    let (ui_event_tx, ui_event_rx) = mpsc::channel::<UiEvent>(100);
    let (network_req_tx, network_req_rx) = mpsc::channel::<NetworkRequest>(100);
    let (network_resp_tx, network_resp_rx) = mpsc::channel::<NetworkResponse>(100);

    // Input handler thread
    let input_handler = tokio::spawn(input_handler_task(ui_event_tx.clone()));

    // Network thread
    let network_worker = NetworkWorker::new(client, network_req_rx, network_resp_tx);
    let network_task = tokio::spawn(network_worker.run());

    // Periodic match refresh thread
    let periodic_updater = PeriodicRefresher::new(network_req_tx.clone());
    let periodic_task = tokio::spawn(periodic_updater.run());

    // Trigger league load on startup
    let _ = ui_event_tx.send(UiEvent::AppStarted).await;

    main_ui_loop(terminal, app, ui_event_rx, network_req_tx, network_resp_rx).await;

    input_handler.abort();
    network_task.abort();
    periodic_task.abort();

    Ok(())
}

fn handle_cli_args(mut args: impl Iterator<Item = String>) -> Result<CliAction, String> {
    let mut parsed = CliArgs::default();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                println!("{}", usage_text());
                return Ok(CliAction::Exit);
            }
            "-V" | "--version" => {
                println!("leaguetui {}", env!("CARGO_PKG_VERSION"));
                return Ok(CliAction::Exit);
            }
            "-l" | "--league" => {
                let Some(id) = args.next().filter(|v| !v.trim().is_empty()) else {
                    return Err(format!("{arg} needs a league id"));
                };
                parsed.league_id = Some(id);
            }
            _ => {
                if let Some(id) = arg.strip_prefix("--league=") {
                    parsed.league_id = Some(id.to_string());
                } else {
                    return Err(format!("Unknown argument: {arg}"));
                }
            }
        }
    }
    Ok(CliAction::Run(parsed))
}

fn usage_text() -> &'static str {
    "leaguetui - basketball league portal terminal UI

Usage:
  leaguetui [--league <id>]
  leaguetui --help
  leaguetui --version

Environment:
  SUPABASE_URL             Project URL of the hosted league database
  SUPABASE_ANON_KEY        Public anon key for read-only access
  LEAGUETUI_SNAPSHOT_JSON  Path to a local league snapshot (skips the network)
  LEAGUETUI_LEAGUE_ID      League opened on startup (overridden by --league)
  LEAGUETUI_LOG_LEVEL      error, warn, info, debug or trace (default error)

Without SUPABASE_URL a bundled demo league is shown."
}

async fn main_ui_loop(
    mut terminal: Terminal<CrosstermBackend<Stdout>>,
    app: Arc<Mutex<App>>,
    mut ui_events: mpsc::Receiver<UiEvent>,
    network_requests: mpsc::Sender<NetworkRequest>,
    mut network_responses: mpsc::Receiver<NetworkResponse>,
) {
    let mut loading = LoadingState::default();

    loop {
        tokio::select! {
            Some(ui_event) = ui_events.recv() => {
                let should_redraw = handle_ui_event(ui_event, &app, &network_requests).await;
                if should_redraw && !loading.is_loading {
                    let mut app_guard = app.lock().await;
                    draw::draw(&mut terminal, &mut app_guard, loading);
                }
            }

            Some(response) = network_responses.recv() => {
                let should_redraw =
                    handle_network_response(response, &app, &network_requests, &mut loading).await;
                if should_redraw {
                    let mut app_guard = app.lock().await;
                    draw::draw(&mut terminal, &mut app_guard, loading);
                }
            }

            else => break,
        }
    }
}

async fn handle_ui_event(
    ui_event: UiEvent,
    app: &Arc<Mutex<App>>,
    network_requests: &mpsc::Sender<NetworkRequest>,
) -> bool {
    match ui_event {
        UiEvent::AppStarted => {
            let requested = app.lock().await.state.league.requested.clone();
            let _ = network_requests.send(NetworkRequest::LoadLeagues).await;
            if let Some(league_id) = requested {
                let _ = network_requests
                    .send(NetworkRequest::LoadLeague { league_id })
                    .await;
            }
            true
        }
        UiEvent::KeyPressed(key_event) => {
            keys::handle_key_bindings(key_event, app, network_requests).await;
            true
        }
        UiEvent::Resize => true,
    }
}

async fn handle_network_response(
    response: NetworkResponse,
    app: &Arc<Mutex<App>>,
    network_requests: &mpsc::Sender<NetworkRequest>,
    loading: &mut LoadingState,
) -> bool {
    match response {
        NetworkResponse::LoadingStateChanged { loading_state } => {
            *loading = loading_state;
            return true;
        }
        NetworkResponse::LeaguesLoaded { leagues } => {
            let mut guard = app.lock().await;
            let next = guard.on_leagues_loaded(leagues);
            drop(guard);
            if let Some(league_id) = next {
                let _ = network_requests
                    .send(NetworkRequest::LoadLeague { league_id })
                    .await;
            }
        }
        NetworkResponse::LeagueLoaded { snapshot } => {
            let mut guard = app.lock().await;
            guard.on_league_loaded(snapshot);
        }
        NetworkResponse::MatchesUpdated { matches } => {
            let mut guard = app.lock().await;
            guard.on_matches_updated(matches);
        }
        NetworkResponse::Error { message } => {
            error!("Network error: {message}");
            let mut guard = app.lock().await;
            guard.on_error(message);
        }
    }
    !loading.is_loading
}

async fn input_handler_task(ui_events: mpsc::Sender<UiEvent>) {
    loop {
        if let Ok(event) = crossterm_event::read() {
            let ui_event = match event {
                Event::Key(key_event) => Some(UiEvent::KeyPressed(key_event)),
                Event::Resize(_, _) => Some(UiEvent::Resize),
                _ => None,
            };

            if let Some(ui_event) = ui_event
                && ui_events.send(ui_event).await.is_err()
            {
                break;
            }
        }
    }
}

fn setup_terminal() -> io::Result<()> {
    let mut stdout = io::stdout();
    execute!(stdout, cursor::Hide)?;
    execute!(stdout, terminal::EnterAlternateScreen)?;
    execute!(stdout, terminal::Clear(terminal::ClearType::All))?;
    terminal::enable_raw_mode()
}

pub fn cleanup_terminal() {
    let mut stdout = io::stdout();
    // Best effort: this also runs from the panic hook.
    let _ = execute!(stdout, cursor::MoveTo(0, 0));
    let _ = execute!(stdout, terminal::Clear(terminal::ClearType::All));
    let _ = execute!(stdout, terminal::LeaveAlternateScreen);
    let _ = execute!(stdout, cursor::Show);
    let _ = terminal::disable_raw_mode();
}

fn setup_panic_hook() {
    panic::set_hook(Box::new(|panic_info| {
        cleanup_terminal();
        better_panic::Settings::auto().create_panic_handler()(panic_info);
    }));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Option<CliArgs>, String> {
        handle_cli_args(args.iter().map(|s| s.to_string())).map(|action| match action {
            CliAction::Run(args) => Some(args),
            CliAction::Exit => None,
        })
    }

    #[test]
    fn no_args_runs_with_defaults() {
        assert_eq!(parse(&[]), Ok(Some(CliArgs::default())));
    }

    #[test]
    fn league_flag_in_both_forms() {
        let expected = Some(CliArgs { league_id: Some("abc".into()) });
        assert_eq!(parse(&["--league", "abc"]), Ok(expected));
        let expected = Some(CliArgs { league_id: Some("abc".into()) });
        assert_eq!(parse(&["--league=abc"]), Ok(expected));
    }

    #[test]
    fn missing_league_value_is_an_error() {
        assert!(parse(&["--league"]).is_err());
    }

    #[test]
    fn unknown_argument_is_an_error() {
        assert_eq!(parse(&["--bogus"]), Err("Unknown argument: --bogus".to_string()));
    }
}
