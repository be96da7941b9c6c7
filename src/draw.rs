use chrono::{DateTime, Local, Utc};
use tui::backend::Backend;
use tui::layout::{Alignment, Constraint, Layout, Rect};
use tui::style::{Color, Modifier, Style};
use tui::text::{Line, Span};
use tui::widgets::{Block, BorderType, Borders, Cell, Paragraph, Row, Table, Tabs};
use tui::{Frame, Terminal};
use tui_logger::TuiLoggerWidget;

use crate::app::{App, MenuItem};
use crate::components::standings_table::StandingsTable;
use crate::state::network::{ERROR_CHAR, LoadingState};
use crate::ui::layout::LayoutAreas;
use league_api::{LeagueSnapshot, Match, MatchStatus};

static TABS: &[&str; 5] = &["Standings", "Fixtures", "Results", "Leaders", "Generator"];

const HELP_TEXT: &str = "\
Global
  1-5        switch tab            ?  help       Esc  close help
  L          next league           R  refresh    f    full screen
  \"          toggle log pane       q  quit

Standings
  h/l  ←/→   previous / next stage
  j/k  ↑/↓   scroll

Fixtures / Results / Leaders
  j/k  ↑/↓   scroll

Generator
  d          toggle double round-robin
  s          export fixtures to ~/.config/leaguetui
  j/k  ↑/↓   scroll";

pub fn draw<B>(terminal: &mut Terminal<B>, app: &mut App, loading: LoadingState)
where
    B: Backend,
{
    let current_size = terminal.size().unwrap_or_default();
    if current_size.width <= 10 || current_size.height <= 10 {
        return;
    }

    let mut layout = LayoutAreas::new(current_size);

    let _ = terminal.draw(|f| {
        layout.update(f.area(), app.settings.full_screen, app.state.show_logs);

        if !app.settings.full_screen {
            draw_tabs(f, layout.tab_bar, app);
        }

        match app.state.active_tab {
            MenuItem::Standings => draw_standings(f, layout.main, app),
            MenuItem::Fixtures => draw_fixtures(f, layout.main, app),
            MenuItem::Results => draw_results(f, layout.main, app),
            MenuItem::Leaders => draw_leaders(f, layout.main, app),
            MenuItem::Generator => draw_generator(f, layout.main, app),
            MenuItem::Help => draw_help(f, layout.main),
        }

        if app.state.show_logs {
            draw_logs(f, layout.logs);
        }

        draw_loading_spinner(f, f.area(), app, loading);
    });
}

pub fn default_border<'a>(color: Color) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(color))
}

fn draw_tabs(f: &mut Frame, tab_bar: [Rect; 2], app: &App) {
    let style = Style::default().fg(Color::White);
    let border_type = BorderType::Rounded;

    let tab_index = match app.state.active_tab {
        MenuItem::Standings => 0,
        MenuItem::Fixtures => 1,
        MenuItem::Results => 2,
        MenuItem::Leaders => 3,
        MenuItem::Generator => 4,
        MenuItem::Help => 0,
    };

    let titles: Vec<Line> = TABS.iter().map(|t| Line::from(*t)).collect();
    let tabs = Tabs::new(titles)
        .block(
            Block::default()
                .borders(Borders::LEFT | Borders::BOTTOM | Borders::TOP)
                .border_type(border_type),
        )
        .highlight_style(Style::default().add_modifier(Modifier::UNDERLINED))
        .select(tab_index)
        .style(style);
    f.render_widget(tabs, tab_bar[0]);

    let help = Paragraph::new("Help: ? ")
        .alignment(Alignment::Right)
        .block(
            Block::default()
                .borders(Borders::RIGHT | Borders::BOTTOM | Borders::TOP)
                .border_type(border_type),
        )
        .style(style);
    f.render_widget(help, tab_bar[1]);
}

/// Renders the "nothing loaded yet" message, or the last error. Returns the
/// snapshot when there is one to draw.
fn loaded_snapshot<'a>(f: &mut Frame, area: Rect, app: &'a App) -> Option<&'a LeagueSnapshot> {
    if let Some(snapshot) = app.state.league.snapshot.as_ref() {
        return Some(snapshot);
    }
    let msg = if let Some(err) = app.state.last_error.as_deref() {
        format!("League load failed:\n{err}")
    } else {
        "Loading league data...".to_string()
    };
    f.render_widget(
        Paragraph::new(msg)
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center),
        area,
    );
    None
}

fn header_line(app: &App, detail: &str) -> Line<'static> {
    let mut spans = vec![
        Span::styled(
            app.state.league.league_name().to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(" | {detail}")),
    ];
    if let Some(updated) = app.state.league.last_updated.as_deref() {
        spans.push(Span::styled(
            format!(" | updated {updated}"),
            Style::default().fg(Color::DarkGray),
        ));
    }
    if let Some(err) = app.state.last_error.as_deref() {
        spans.push(Span::styled(format!(" | {err}"), Style::default().fg(Color::Red)));
    }
    Line::from(spans)
}

fn draw_standings(f: &mut Frame, area: Rect, app: &App) {
    let block = default_border(Color::White).title(" Standings ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    if loaded_snapshot(f, inner, app).is_none() {
        return;
    }

    let [header, key_legend, content] =
        Layout::vertical([Constraint::Length(1), Constraint::Length(1), Constraint::Fill(1)]).areas(inner);

    let league = &app.state.league;
    let Some(table) = league.current_table() else {
        f.render_widget(header_line(app, "no matches"), header);
        f.render_widget(
            Paragraph::new("No matches recorded for this league yet")
                .style(Style::default().fg(Color::DarkGray))
                .alignment(Alignment::Center),
            content,
        );
        return;
    };

    let stage_label = format!(
        "{} ({}/{})",
        table.stage.label(),
        league.selected_stage + 1,
        league.tables.len()
    );
    f.render_widget(header_line(app, &stage_label), header);
    f.render_widget(
        Paragraph::new("Keys: h/l=stage  j/k=scroll  L=league  R=refresh  ?=help  q=quit")
            .style(Style::default().fg(Color::DarkGray)),
        key_legend,
    );

    let show_draws = table.rows.iter().any(|r| r.draws > 0);
    f.render_widget(
        StandingsTable {
            rows: &table.rows,
            scroll_offset: league.scroll_offset,
            show_draws,
        },
        content,
    );
}

fn draw_fixtures(f: &mut Frame, area: Rect, app: &App) {
    let block = default_border(Color::White).title(" Fixtures ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let Some(snapshot) = loaded_snapshot(f, inner, app) else {
        return;
    };
    let upcoming = app.state.league.upcoming(Utc::now());
    draw_match_list(
        f,
        inner,
        app,
        snapshot,
        &upcoming,
        app.state.fixtures.scroll_offset,
        &format!("{} upcoming", upcoming.len()),
        "No upcoming matches",
    );
}

fn draw_results(f: &mut Frame, area: Rect, app: &App) {
    let block = default_border(Color::White).title(" Results ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let Some(snapshot) = loaded_snapshot(f, inner, app) else {
        return;
    };
    let results = app.state.league.results(Utc::now());
    draw_match_list(
        f,
        inner,
        app,
        snapshot,
        &results,
        app.state.results.scroll_offset,
        &format!("{} played", results.len()),
        "No results yet",
    );
}

#[allow(clippy::too_many_arguments)]
fn draw_match_list(
    f: &mut Frame,
    area: Rect,
    app: &App,
    snapshot: &LeagueSnapshot,
    matches: &[&Match],
    scroll_offset: u16,
    summary: &str,
    empty_msg: &str,
) {
    let [header, content] = Layout::vertical([Constraint::Length(1), Constraint::Fill(1)]).areas(area);
    f.render_widget(header_line(app, summary), header);

    if matches.is_empty() {
        f.render_widget(
            Paragraph::new(empty_msg)
                .style(Style::default().fg(Color::DarkGray))
                .alignment(Alignment::Center),
            content,
        );
        return;
    }

    let rows = matches.iter().skip(scroll_offset as usize).map(|m| {
        let score = m
            .score()
            .map(|(h, a)| format!("{h:>3} - {a:<3}"))
            .unwrap_or_else(|| "  vs   ".to_string());
        let stage = league_api::standings::infer_stage(m.notes.as_deref());
        Row::new(vec![
            Cell::from(format_kickoff(m.scheduled_at)),
            Cell::from(Span::styled(m.status.short_label(), status_style(m.status))),
            Cell::from(
                Line::from(snapshot.side_name(m.home_team_id.as_deref()).to_string())
                    .alignment(Alignment::Right),
            ),
            Cell::from(score),
            Cell::from(snapshot.side_name(m.away_team_id.as_deref()).to_string()),
            Cell::from(Span::styled(stage.label(), Style::default().fg(Color::DarkGray))),
            Cell::from(Span::styled(
                m.venue.clone().unwrap_or_default(),
                Style::default().fg(Color::DarkGray),
            )),
        ])
    });

    let widths = [
        Constraint::Length(16),
        Constraint::Length(4),
        Constraint::Fill(1),
        Constraint::Length(9),
        Constraint::Fill(1),
        Constraint::Length(14),
        Constraint::Fill(1),
    ];
    f.render_widget(Table::new(rows, widths).column_spacing(1), content);
}

fn format_kickoff(at: Option<DateTime<Utc>>) -> String {
    at.map(|t| t.with_timezone(&Local).format("%a %d %b %H:%M").to_string())
        .unwrap_or_else(|| "TBD".to_string())
}

fn status_style(status: MatchStatus) -> Style {
    match status {
        MatchStatus::Live => Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        MatchStatus::Completed => Style::default().fg(Color::Gray),
        MatchStatus::Postponed | MatchStatus::Cancelled => Style::default().fg(Color::Red),
        MatchStatus::Scheduled => Style::default().fg(Color::DarkGray),
    }
}

fn draw_leaders(f: &mut Frame, area: Rect, app: &App) {
    let block = default_border(Color::White).title(" Leaders ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let Some(snapshot) = loaded_snapshot(f, inner, app) else {
        return;
    };

    let [header, content] = Layout::vertical([Constraint::Length(1), Constraint::Fill(1)]).areas(inner);
    let leaders = &app.state.league.leaders;
    f.render_widget(header_line(app, &format!("{} players", leaders.len())), header);

    if leaders.is_empty() {
        f.render_widget(
            Paragraph::new("No player statistics recorded")
                .style(Style::default().fg(Color::DarkGray))
                .alignment(Alignment::Center),
            content,
        );
        return;
    }

    let head = Row::new(["#", "Player", "Team", "GP", "PPG", "RPG", "APG"])
        .style(Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD));
    let offset = app.state.leaders.scroll_offset as usize;
    let rows = leaders.iter().enumerate().skip(offset).map(|(idx, l)| {
        let team = l
            .team_id
            .as_deref()
            .map(|id| snapshot.team_name(id).to_string())
            .unwrap_or_default();
        Row::new(vec![
            Cell::from((idx + 1).to_string()),
            Cell::from(l.player_name.clone()),
            Cell::from(team),
            Cell::from(l.games.to_string()),
            Cell::from(Span::styled(
                format!("{:.1}", l.points_per_game()),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Cell::from(format!("{:.1}", l.rebounds_per_game())),
            Cell::from(format!("{:.1}", l.assists_per_game())),
        ])
    });
    let widths = [
        Constraint::Length(4),
        Constraint::Fill(2),
        Constraint::Fill(1),
        Constraint::Length(4),
        Constraint::Length(6),
        Constraint::Length(6),
        Constraint::Length(6),
    ];
    f.render_widget(Table::new(rows, widths).header(head).column_spacing(1), content);
}

fn draw_generator(f: &mut Frame, area: Rect, app: &App) {
    let block = default_border(Color::White).title(" Fixture Generator ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let Some(snapshot) = loaded_snapshot(f, inner, app) else {
        return;
    };

    let [header, key_legend, status, content] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Fill(1),
    ])
    .areas(inner);

    let generator = &app.state.generator;
    let mode = if generator.double_round_robin { "double round-robin" } else { "single round-robin" };
    let detail = match generator.schedule.as_ref() {
        Some(s) => format!("{} teams | {mode} | {} rounds | {} fixtures", snapshot.teams.len(), s.rounds, s.fixtures.len()),
        None => format!("{} teams | {mode}", snapshot.teams.len()),
    };
    f.render_widget(header_line(app, &detail), header);
    f.render_widget(
        Paragraph::new("Keys: d=toggle double  s=export JSON  j/k=scroll")
            .style(Style::default().fg(Color::DarkGray)),
        key_legend,
    );

    let status_line = if let Some(err) = generator.error.as_deref() {
        Span::styled(err.to_string(), Style::default().fg(Color::Red))
    } else if let Some(path) = generator.saved_to.as_deref() {
        Span::styled(format!("Saved to {path}"), Style::default().fg(Color::Green))
    } else {
        Span::styled("Preview only, nothing is written to the league", Style::default().fg(Color::DarkGray))
    };
    f.render_widget(Paragraph::new(Line::from(status_line)), status);

    let Some(schedule) = generator.schedule.as_ref() else {
        return;
    };

    let mut lines: Vec<Line> = Vec::with_capacity(schedule.fixtures.len() + schedule.rounds as usize);
    for round in 1..=schedule.rounds {
        let mut fixtures = schedule.round(round).peekable();
        let date = fixtures
            .peek()
            .and_then(|fx| fx.date)
            .map(|d| format!("  {}", d.format("%a %d %b %Y")))
            .unwrap_or_default();
        lines.push(Line::from(Span::styled(
            format!("Round {round}{date}"),
            Style::default().fg(Color::Yellow),
        )));
        for fx in fixtures {
            lines.push(Line::from(format!(
                "  {:>20}  vs  {}",
                snapshot.team_name(&fx.home_team_id),
                snapshot.team_name(&fx.away_team_id)
            )));
        }
    }

    let offset = generator.scroll_offset as usize;
    let window: Vec<Line> = lines.into_iter().skip(offset).collect();
    f.render_widget(Paragraph::new(window), content);
}

fn draw_help(f: &mut Frame, area: Rect) {
    let block = default_border(Color::DarkGray).title(" Help ");
    let inner = block.inner(area);
    f.render_widget(block, area);
    f.render_widget(Paragraph::new(HELP_TEXT).style(Style::default().fg(Color::Gray)), inner);
}

fn draw_logs(f: &mut Frame, area: Rect) {
    if area.height == 0 {
        return;
    }
    let logs = TuiLoggerWidget::default()
        .block(default_border(Color::DarkGray).title(" Logs "))
        .style_error(Style::default().fg(Color::Red))
        .style_warn(Style::default().fg(Color::Yellow))
        .style_info(Style::default().fg(Color::Gray))
        .style_debug(Style::default().fg(Color::DarkGray));
    f.render_widget(logs, area);
}

fn draw_loading_spinner(f: &mut Frame, area: Rect, app: &App, loading: LoadingState) {
    if !loading.is_loading && loading.spinner_char != ERROR_CHAR {
        return;
    }
    let style = match loading.spinner_char {
        ERROR_CHAR => Style::default().fg(Color::Red),
        _ => Style::default().fg(Color::White),
    };
    let spinner = Paragraph::new(loading.spinner_char.to_string())
        .alignment(Alignment::Right)
        .style(style);
    let area = if app.settings.full_screen {
        Rect::new(area.width.saturating_sub(3), area.height.saturating_sub(2), 1, 1)
    } else {
        Rect::new(area.width.saturating_sub(11), 1, 1, 1)
    };
    f.render_widget(spinner, area);
}
