//! Reusable TUI components

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use crate::form::FormState;

const FOCUSED: Color = Color::Cyan;
const IDLE: Color = Color::DarkGray;

fn border(focused: bool) -> Style {
    Style::default().fg(if focused { FOCUSED } else { IDLE })
}

/// Single-line text input with a label
pub struct InputField<'a> {
    label: &'a str,
    value: &'a str,
    focused: bool,
    placeholder: Option<&'a str>,
}

impl<'a> InputField<'a> {
    pub fn new(label: &'a str, value: &'a str) -> Self {
        Self {
            label,
            value,
            focused: false,
            placeholder: None,
        }
    }

    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }

    pub fn placeholder(mut self, placeholder: &'a str) -> Self {
        self.placeholder = Some(placeholder);
        self
    }

    pub fn render(self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title(self.label)
            .borders(Borders::ALL)
            .border_style(border(self.focused));

        let content = match (self.value.is_empty(), self.placeholder) {
            (true, Some(placeholder)) => {
                Line::from(Span::styled(placeholder, Style::default().fg(IDLE)))
            }
            _ if self.focused => Line::from(vec![
                Span::raw(self.value),
                Span::styled("█", Style::default().fg(FOCUSED)),
            ]),
            _ => Line::from(self.value),
        };

        frame.render_widget(Paragraph::new(content).block(block), area);
    }
}

/// Pick list; `chosen` is marked, the highlight follows `state`
pub struct SelectList<'a> {
    title: &'a str,
    items: &'a [String],
    chosen: &'a str,
    focused: bool,
}

impl<'a> SelectList<'a> {
    pub fn new(title: &'a str, items: &'a [String], chosen: &'a str) -> Self {
        Self {
            title,
            items,
            chosen,
            focused: false,
        }
    }

    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }

    pub fn render(self, frame: &mut Frame, area: Rect, state: &ListState) {
        let items: Vec<ListItem> = self
            .items
            .iter()
            .map(|item| {
                if item == self.chosen {
                    ListItem::new(format!("● {item}"))
                        .style(Style::default().fg(Color::Green).add_modifier(Modifier::BOLD))
                } else {
                    ListItem::new(format!("  {item}"))
                }
            })
            .collect();

        let list = List::new(items)
            .block(
                Block::default()
                    .title(format!("{} ({})", self.title, self.items.len()))
                    .borders(Borders::ALL)
                    .border_style(border(self.focused)),
            )
            .highlight_style(Style::default().bg(IDLE));

        frame.render_stateful_widget(list, area, &mut state.clone());
    }
}

/// One-line button
pub fn button<'a>(label: &'a str, focused: bool) -> Paragraph<'a> {
    let style = if focused {
        Style::default().fg(Color::Black).bg(FOCUSED).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(FOCUSED)
    };
    Paragraph::new(Line::from(Span::styled(format!("[ {label} ]"), style)))
        .alignment(ratatui::layout::Alignment::Center)
}

/// Form feedback: error in red with its kind, success in green
pub fn feedback(state: &FormState) -> Option<Span<'_>> {
    if let Some(error) = state.error() {
        return Some(Span::styled(
            format!("✗ {} ({})", error.message, error.kind),
            Style::default().fg(Color::Red),
        ));
    }
    state
        .success()
        .map(|msg| Span::styled(format!("✓ {msg}"), Style::default().fg(Color::Green)))
}
