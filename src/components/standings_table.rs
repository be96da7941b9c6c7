use league_api::{Form, StandingRow};
use tui::buffer::Buffer;
use tui::layout::{Constraint, Rect};
use tui::style::{Color, Modifier, Style};
use tui::text::{Line, Span};
use tui::widgets::{Cell, Row, Table, Widget};

const HEADERS: [&str; 10] = ["#", "Team", "P", "W", "L", "PF", "PA", "Diff", "Pts", "Form"];

/// One stage's standings, ranked rows first.
pub struct StandingsTable<'a> {
    pub rows: &'a [StandingRow],
    /// First row shown; the header always stays visible.
    pub scroll_offset: u16,
    pub show_draws: bool,
}

impl Widget for StandingsTable<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }

        let mut headers: Vec<&str> = HEADERS.to_vec();
        let mut widths = vec![
            Constraint::Length(3),
            Constraint::Fill(1),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(5),
            Constraint::Length(5),
            Constraint::Length(5),
            Constraint::Length(4),
            Constraint::Length(6),
        ];
        if self.show_draws {
            headers.insert(5, "D");
            widths.insert(5, Constraint::Length(3));
        }

        let header = Row::new(headers.into_iter().map(Cell::from))
            .style(Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD));

        let rows = self
            .rows
            .iter()
            .skip(self.scroll_offset as usize)
            .map(|r| standing_row(r, self.show_draws));

        Widget::render(Table::new(rows, widths).header(header).column_spacing(1), area, buf);
    }
}

fn standing_row(row: &StandingRow, show_draws: bool) -> Row<'static> {
    let diff = row.point_differential();
    let diff_style = match diff.signum() {
        1 => Style::default().fg(Color::Green),
        -1 => Style::default().fg(Color::Red),
        _ => Style::default(),
    };

    let mut cells = vec![
        Cell::from(row.rank.to_string()),
        Cell::from(row.team_name.clone()),
        Cell::from(row.played.to_string()),
        Cell::from(row.wins.to_string()),
        Cell::from(row.losses.to_string()),
        Cell::from(row.points_for.to_string()),
        Cell::from(row.points_against.to_string()),
        Cell::from(Span::styled(format!("{diff:+}"), diff_style)),
        Cell::from(Span::styled(
            row.points.to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Cell::from(form_line(&row.form)),
    ];
    if show_draws {
        cells.insert(5, Cell::from(row.draws.to_string()));
    }

    let style = if row.rank == 1 {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    Row::new(cells).style(style)
}

fn form_line(form: &Form) -> Line<'static> {
    Line::from(
        form.as_str()
            .chars()
            .map(|c| Span::styled(c.to_string(), Style::default().fg(form_color(c))))
            .collect::<Vec<_>>(),
    )
}

fn form_color(letter: char) -> Color {
    match letter {
        'W' => Color::Green,
        'L' => Color::Red,
        'D' => Color::Yellow,
        _ => Color::DarkGray,
    }
}
