//! UI rendering for the TUI

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table},
    Frame,
};

use super::app::{App, Focus};
use super::components::{button, feedback, InputField, SelectList};
use crate::models::DraftField;

/// Main colors
const PRIMARY: Color = Color::Cyan;
const SUCCESS: Color = Color::Green;
const ERROR: Color = Color::Red;
const MUTED: Color = Color::DarkGray;

/// Draw the entire UI
pub fn draw(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),  // Header
            Constraint::Min(18),    // Form
            Constraint::Length(10), // Existing alerts
            Constraint::Length(1),  // Status bar
        ])
        .split(frame.size());

    draw_header(frame, app, chunks[0]);
    draw_form(frame, app, chunks[1]);
    draw_alerts(frame, app, chunks[2]);
    draw_status_bar(frame, app, chunks[3]);

    if app.show_help {
        draw_help_overlay(frame);
    }
}

fn draw_header(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(20), Constraint::Length(30)])
        .split(area);

    let title = Line::from(vec![
        Span::styled("Faultwatch", Style::default().fg(PRIMARY).bold()),
        Span::styled(" · Configure Alerts · ", Style::default().fg(MUTED)),
        Span::raw(app.backend.as_str()),
    ]);
    frame.render_widget(Paragraph::new(title), chunks[0]);

    let status = if app.connected {
        Span::styled("● Connected", Style::default().fg(SUCCESS))
    } else {
        Span::styled("○ Waiting for backend", Style::default().fg(ERROR))
    };
    frame.render_widget(Paragraph::new(status).alignment(Alignment::Right), chunks[1]);
}

fn draw_form(frame: &mut Frame, app: &App, area: Rect) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(area);

    draw_selectors(frame, app, columns[0]);
    draw_inputs(frame, app, columns[1]);
}

fn draw_selectors(frame: &mut Frame, app: &App, area: Rect) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
        ])
        .split(area);

    let state = app.state();

    SelectList::new("Database", &app.databases, state.database())
        .focused(app.focus == Focus::Database)
        .render(frame, rows[0], &app.databases_state);

    SelectList::new("Table", state.tables(), state.selected_table())
        .focused(app.focus == Focus::Table)
        .render(frame, rows[1], &app.tables_state);

    SelectList::new("Column", state.columns(), &state.draft().field_name)
        .focused(app.focus == Focus::Column)
        .render(frame, rows[2], &app.columns_state);
}

fn draw_inputs(frame: &mut Frame, app: &App, area: Rect) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Length(3), // Message
            Constraint::Length(3), // Field name
            Constraint::Length(3), // Bounds
            Constraint::Length(1), // Submit
            Constraint::Min(0),
        ])
        .split(area);

    let draft = app.state().draft();

    InputField::new(DraftField::Title.label(), &draft.alert_title)
        .focused(app.focus == Focus::Title)
        .render(frame, rows[0]);

    InputField::new(DraftField::Message.label(), &draft.alert_message)
        .focused(app.focus == Focus::Message)
        .render(frame, rows[1]);

    InputField::new(DraftField::FieldName.label(), &draft.field_name)
        .placeholder("pick a column")
        .render(frame, rows[2]);

    let bounds = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[3]);

    InputField::new(DraftField::LowerBound.label(), &draft.lower_bound)
        .focused(app.focus == Focus::LowerBound)
        .render(frame, bounds[0]);

    InputField::new(DraftField::HigherBound.label(), &draft.higher_bound)
        .focused(app.focus == Focus::HigherBound)
        .render(frame, bounds[1]);

    frame.render_widget(button("Add Alert", app.focus == Focus::Submit), rows[4]);
}

fn draw_alerts(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(format!("Alerts ({})", app.alerts.len()))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if app.focus == Focus::Alerts {
            PRIMARY
        } else {
            MUTED
        }));

    let header = Row::new(vec!["ID", "Title", "Field", "Lower", "Higher", "Message"])
        .style(Style::default().fg(PRIMARY).bold())
        .height(1);

    let rows: Vec<Row> = app
        .alerts
        .iter()
        .map(|alert| {
            Row::new(vec![
                Cell::from(alert.id.to_string()),
                Cell::from(truncate(&alert.alert_title, 24)),
                Cell::from(truncate(&alert.field_name, 20)),
                Cell::from(format_bound(alert.lower_bound)),
                Cell::from(format_bound(alert.higher_bound)),
                Cell::from(truncate(&alert.alert_message, 40)),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(6),
            Constraint::Percentage(20),
            Constraint::Percentage(18),
            Constraint::Length(10),
            Constraint::Length(10),
            Constraint::Min(10),
        ],
    )
    .header(header)
    .block(block)
    .highlight_style(Style::default().bg(Color::DarkGray));

    frame.render_stateful_widget(table, area, &mut app.alerts_state.clone());
}

fn draw_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(20), Constraint::Length(44)])
        .split(area);

    let left = match (feedback(app.state()), app.get_status()) {
        (Some(span), _) => Line::from(span),
        (None, Some(status)) => Line::from(Span::styled(status, Style::default().fg(PRIMARY))),
        (None, None) => Line::from(""),
    };
    frame.render_widget(Paragraph::new(left), chunks[0]);

    let hints = Paragraph::new("Tab: next  Enter: select  ?: help  q: quit")
        .style(Style::default().fg(MUTED))
        .alignment(Alignment::Right);
    frame.render_widget(hints, chunks[1]);
}

fn draw_help_overlay(frame: &mut Frame) {
    let area = centered_rect(60, 60, frame.size());

    let help = vec![
        Line::from(Span::styled("Keyboard Shortcuts", Style::default().fg(PRIMARY).bold())),
        Line::from(""),
        Line::from("Tab / Shift+Tab   Move between fields"),
        Line::from("↑↓ / j k          Move in a list"),
        Line::from("Enter             Select item / submit"),
        Line::from("Backspace         Delete character, clear table"),
        Line::from("Esc               Leave a text field"),
        Line::from("d                 Delete highlighted alert"),
        Line::from("r                 Reload alerts"),
        Line::from("?                 Toggle help"),
        Line::from("q / Ctrl+C        Quit"),
    ];

    let paragraph = Paragraph::new(help).block(
        Block::default()
            .title("Help")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(PRIMARY)),
    );

    frame.render_widget(Clear, area);
    frame.render_widget(paragraph, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup[1])[1]
}

fn format_bound(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        format!("{value}")
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{kept}…")
    }
}
