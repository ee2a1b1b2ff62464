//! Main TUI application state and logic

use std::sync::Arc;
use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::widgets::{ListState, TableState};
use tokio::sync::mpsc;
use tracing::{info, warn};

use super::event::{is_force_quit, Event, EventHandler};
use crate::client::FaultApi;
use crate::error::{Error, Result};
use crate::form::{Action, FormController, FormState};
use crate::models::{Alert, DraftField};

/// Focusable element of the page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Database,
    Table,
    Column,
    Title,
    Message,
    LowerBound,
    HigherBound,
    Submit,
    Alerts,
}

impl Focus {
    const ORDER: [Focus; 9] = [
        Self::Database,
        Self::Table,
        Self::Column,
        Self::Title,
        Self::Message,
        Self::LowerBound,
        Self::HigherBound,
        Self::Submit,
        Self::Alerts,
    ];

    pub fn index(self) -> usize {
        Self::ORDER.iter().position(|f| *f == self).unwrap_or(0)
    }

    pub fn next(self) -> Self {
        Self::ORDER[(self.index() + 1) % Self::ORDER.len()]
    }

    pub fn prev(self) -> Self {
        Self::ORDER[(self.index() + Self::ORDER.len() - 1) % Self::ORDER.len()]
    }

    /// Draft field edited as free text while this element has focus
    pub fn text_field(self) -> Option<DraftField> {
        match self {
            Self::Title => Some(DraftField::Title),
            Self::Message => Some(DraftField::Message),
            Self::LowerBound => Some(DraftField::LowerBound),
            Self::HigherBound => Some(DraftField::HigherBound),
            _ => None,
        }
    }
}

/// Characters a bound input accepts
fn is_numeric_char(c: char) -> bool {
    c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E')
}

/// Move a list highlight one step, clamped to the list
fn step(state: &mut ListState, len: usize, down: bool) {
    if len == 0 {
        state.select(None);
        return;
    }
    let next = match (state.selected(), down) {
        (None, _) => 0,
        (Some(i), true) => (i + 1).min(len - 1),
        (Some(i), false) => i.saturating_sub(1),
    };
    state.select(Some(next));
}

/// Main TUI application state
pub struct App {
    /// Whether the app should quit
    pub should_quit: bool,
    /// Focused element
    pub focus: Focus,
    /// The alert form
    pub form: FormController<dyn FaultApi>,
    /// Databases offered by the backend
    pub databases: Vec<String>,
    /// Alerts of the selected database
    pub alerts: Vec<Alert>,
    /// Database list highlight
    pub databases_state: ListState,
    /// Table list highlight
    pub tables_state: ListState,
    /// Column list highlight
    pub columns_state: ListState,
    /// Alerts table highlight
    pub alerts_state: TableState,
    /// Show help overlay
    pub show_help: bool,
    /// Status message
    pub status_message: Option<(String, Instant)>,
    /// Whether the backend has answered at least once
    pub connected: bool,
    /// Backend address, for the header
    pub backend: String,
    api: Arc<dyn FaultApi>,
    events: mpsc::UnboundedSender<Event>,
    initial_database: Option<String>,
}

impl App {
    /// Create the app. Background results are delivered through `events`.
    pub fn new(api: Arc<dyn FaultApi>, events: mpsc::UnboundedSender<Event>) -> Self {
        let refresh_tx = events.clone();
        let form = FormController::new(Arc::clone(&api)).on_refresh(move || {
            let _ = refresh_tx.send(Event::RefreshAlerts);
        });

        Self {
            should_quit: false,
            focus: Focus::default(),
            form,
            databases: Vec::new(),
            alerts: Vec::new(),
            databases_state: ListState::default(),
            tables_state: ListState::default(),
            columns_state: ListState::default(),
            alerts_state: TableState::default(),
            show_help: false,
            status_message: None,
            connected: false,
            backend: String::new(),
            api,
            events,
            initial_database: None,
        }
    }

    /// Preselect a database instead of the first one the backend lists
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.initial_database = Some(database.into());
        self
    }

    /// Set the backend address shown in the header
    pub fn with_backend(mut self, backend: impl Into<String>) -> Self {
        self.backend = backend.into();
        self
    }

    /// Form state shortcut
    pub fn state(&self) -> &FormState {
        self.form.state()
    }

    /// Whether keystrokes currently go into a text input
    pub fn editing(&self) -> bool {
        self.focus.text_field().is_some()
    }

    /// Make `database` the selected database
    pub fn select_database(&mut self, database: String) {
        info!(database = %database, "Database selected");
        self.form.dispatch(Action::DatabaseChanged(database));
        self.tables_state.select(None);
        self.columns_state.select(None);
        self.alerts.clear();
        self.alerts_state.select(None);
        self.load_alerts();
    }

    /// Request the database list
    pub fn load_databases(&self) {
        let api = Arc::clone(&self.api);
        let tx = self.events.clone();
        tokio::spawn(async move {
            let event = match api.list_databases().await {
                Ok(databases) => Event::DatabasesLoaded(databases),
                Err(e) => {
                    warn!(error = %e, "Failed to fetch databases");
                    Event::Error("Failed to fetch databases".to_string())
                }
            };
            let _ = tx.send(event);
        });
    }

    /// Request the alert list of the selected database
    pub fn load_alerts(&self) {
        let database = self.state().database().to_string();
        if database.is_empty() {
            return;
        }

        let api = Arc::clone(&self.api);
        let tx = self.events.clone();
        tokio::spawn(async move {
            let event = match api.list_alerts(&database).await {
                Ok(alerts) => Event::AlertsLoaded { database, alerts },
                Err(e) => {
                    warn!(database = %database, error = %e, "Failed to fetch alerts");
                    Event::Error("Failed to fetch alerts".to_string())
                }
            };
            let _ = tx.send(event);
        });
    }

    /// Delete the highlighted alert, then reload the list
    pub fn delete_selected_alert(&mut self) {
        let Some(alert) = self
            .alerts_state
            .selected()
            .and_then(|i| self.alerts.get(i))
        else {
            return;
        };

        let alert_id = alert.id;
        let database = self.state().database().to_string();
        let api = Arc::clone(&self.api);
        let tx = self.events.clone();
        self.set_status(format!("Removing alert {alert_id}..."));

        tokio::spawn(async move {
            let event = match api.remove_alert(&database, alert_id).await {
                Ok(()) => Event::RefreshAlerts,
                Err(e) => {
                    warn!(alert_id, error = %e, "Failed to remove alert");
                    Event::Error("Failed to remove alert".to_string())
                }
            };
            let _ = tx.send(event);
        });
    }

    /// Handle one event
    pub fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(key) => self.handle_key_event(key),
            Event::DatabasesLoaded(databases) => {
                self.connected = true;
                self.databases = databases;
                let current = self.state().database().to_string();
                if current.is_empty() {
                    if let Some(first) = self.databases.first().cloned() {
                        self.databases_state.select(Some(0));
                        self.select_database(first);
                    }
                } else {
                    let position = self.databases.iter().position(|d| *d == current);
                    self.databases_state.select(position);
                }
            }
            Event::AlertsLoaded { database, alerts } => {
                // A reply for a database that is no longer selected
                if database != self.state().database() {
                    return;
                }
                self.connected = true;
                self.alerts = alerts;
                let selected = self
                    .alerts_state
                    .selected()
                    .filter(|i| *i < self.alerts.len());
                self.alerts_state
                    .select(selected.or(if self.alerts.is_empty() { None } else { Some(0) }));
            }
            Event::RefreshAlerts => self.load_alerts(),
            Event::Error(message) => self.set_status(message),
            Event::Tick | Event::Resize => {}
        }
    }

    fn handle_key_event(&mut self, key: KeyEvent) {
        if is_force_quit(key) {
            self.should_quit = true;
            return;
        }
        self.handle_key(key.code, key.modifiers);
    }

    /// Handle key events
    pub fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers) {
        if self.show_help {
            if matches!(code, KeyCode::Esc | KeyCode::Char('?')) {
                self.show_help = false;
            }
            return;
        }

        match (code, modifiers) {
            (KeyCode::Tab, _) => self.focus = self.focus.next(),
            (KeyCode::BackTab, _) => self.focus = self.focus.prev(),
            (KeyCode::Char('q'), KeyModifiers::NONE) if !self.editing() => {
                self.should_quit = true;
            }
            (KeyCode::Char('?'), KeyModifiers::NONE) if !self.editing() => {
                self.show_help = true;
            }
            _ => self.handle_focus_key(code),
        }
    }

    fn handle_focus_key(&mut self, code: KeyCode) {
        if let Some(field) = self.focus.text_field() {
            self.handle_text_key(field, code);
            return;
        }

        let table_count = self.state().tables().len();
        let column_count = self.state().columns().len();

        match self.focus {
            Focus::Database => match code {
                KeyCode::Up | KeyCode::Char('k') => {
                    step(&mut self.databases_state, self.databases.len(), false);
                }
                KeyCode::Down | KeyCode::Char('j') => {
                    step(&mut self.databases_state, self.databases.len(), true);
                }
                KeyCode::Enter => {
                    if let Some(db) = self
                        .databases_state
                        .selected()
                        .and_then(|i| self.databases.get(i))
                        .cloned()
                    {
                        self.select_database(db);
                        self.focus = Focus::Table;
                    }
                }
                _ => {}
            },
            Focus::Table => match code {
                KeyCode::Up | KeyCode::Char('k') => {
                    step(&mut self.tables_state, table_count, false);
                }
                KeyCode::Down | KeyCode::Char('j') => {
                    step(&mut self.tables_state, table_count, true);
                }
                KeyCode::Enter => {
                    if let Some(table) = self
                        .tables_state
                        .selected()
                        .and_then(|i| self.state().tables().get(i))
                        .cloned()
                    {
                        self.columns_state.select(None);
                        self.form.dispatch(Action::TableChanged(table));
                        self.focus = Focus::Column;
                    }
                }
                KeyCode::Delete | KeyCode::Backspace => {
                    self.tables_state.select(None);
                    self.columns_state.select(None);
                    self.form.dispatch(Action::TableChanged(String::new()));
                }
                _ => {}
            },
            Focus::Column => match code {
                KeyCode::Up | KeyCode::Char('k') => {
                    step(&mut self.columns_state, column_count, false);
                }
                KeyCode::Down | KeyCode::Char('j') => {
                    step(&mut self.columns_state, column_count, true);
                }
                KeyCode::Enter => {
                    if let Some(column) = self
                        .columns_state
                        .selected()
                        .and_then(|i| self.state().columns().get(i))
                        .cloned()
                    {
                        self.form
                            .dispatch(Action::FieldEdited(DraftField::FieldName, column));
                        self.focus = Focus::Title;
                    }
                }
                _ => {}
            },
            Focus::Submit => {
                if matches!(code, KeyCode::Enter | KeyCode::Char(' ')) {
                    self.form.dispatch(Action::Submit);
                }
            }
            Focus::Alerts => match code {
                KeyCode::Up | KeyCode::Char('k') => {
                    let i = self.alerts_state.selected().unwrap_or(0);
                    self.alerts_state.select(Some(i.saturating_sub(1)));
                }
                KeyCode::Down | KeyCode::Char('j') => {
                    if !self.alerts.is_empty() {
                        let i = self.alerts_state.selected().map_or(0, |i| i + 1);
                        self.alerts_state.select(Some(i.min(self.alerts.len() - 1)));
                    }
                }
                KeyCode::Char('d') | KeyCode::Delete => self.delete_selected_alert(),
                KeyCode::Char('r') => self.load_alerts(),
                _ => {}
            },
            _ => {}
        }
    }

    fn handle_text_key(&mut self, field: DraftField, code: KeyCode) {
        let mut value = self.state().draft().get(field).to_string();
        match code {
            KeyCode::Char(c) => {
                if field.is_numeric() && !is_numeric_char(c) {
                    return;
                }
                value.push(c);
            }
            KeyCode::Backspace => {
                if value.pop().is_none() {
                    return;
                }
            }
            KeyCode::Enter => {
                self.focus = self.focus.next();
                return;
            }
            KeyCode::Esc => {
                self.focus = Focus::Submit;
                return;
            }
            _ => return,
        }
        self.form.dispatch(Action::FieldEdited(field, value));
    }

    /// Set a status message that expires after 3 seconds
    pub fn set_status(&mut self, message: String) {
        self.status_message = Some((message, Instant::now()));
    }

    /// Get current status message if not expired
    pub fn get_status(&self) -> Option<&str> {
        self.status_message.as_ref().and_then(|(msg, time)| {
            if time.elapsed() < Duration::from_secs(3) {
                Some(msg.as_str())
            } else {
                None
            }
        })
    }

    /// Run the TUI application
    pub async fn run(&mut self, mut events: EventHandler) -> Result<()> {
        use crossterm::{
            execute,
            terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
        };
        use ratatui::{backend::CrosstermBackend, Terminal};
        use std::io;

        // Setup terminal
        enable_raw_mode().map_err(|e| Error::Tui(e.to_string()))?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen).map_err(|e| Error::Tui(e.to_string()))?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).map_err(|e| Error::Tui(e.to_string()))?;

        events.start();
        self.load_databases();
        if let Some(database) = self.initial_database.take() {
            self.select_database(database);
        }

        // Main loop
        while !self.should_quit {
            terminal
                .draw(|frame| super::ui::draw(frame, self))
                .map_err(|e| Error::Tui(e.to_string()))?;

            let pending = self.form.in_flight() > 0;
            tokio::select! {
                event = events.next() => match event {
                    Some(event) => self.handle_event(event),
                    None => break,
                },
                _ = self.form.next_completion(), if pending => {}
            }
        }

        // Restore terminal
        disable_raw_mode().map_err(|e| Error::Tui(e.to_string()))?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)
            .map_err(|e| Error::Tui(e.to_string()))?;
        terminal.show_cursor().map_err(|e| Error::Tui(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::models::{NewAlert, Notification};
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;

    struct StaticApi;

    #[async_trait]
    impl FaultApi for StaticApi {
        async fn list_databases(&self) -> Result<Vec<String>> {
            Ok(vec!["database_sample_data".to_string()])
        }

        async fn list_tables(&self, _database: &str) -> Result<Vec<String>> {
            Ok(vec!["kpis".to_string(), "devices".to_string()])
        }

        async fn list_columns(&self, _database: &str, _table: &str) -> Result<Vec<String>> {
            Ok(vec!["Latency".to_string(), "Signal_Strength".to_string()])
        }

        async fn raw_data(
            &self,
            _database: &str,
            _table: &str,
        ) -> Result<Vec<Vec<serde_json::Value>>> {
            Ok(Vec::new())
        }

        async fn add_alert(&self, _database: &str, _alert: &NewAlert) -> Result<()> {
            Ok(())
        }

        async fn list_alerts(&self, _database: &str) -> Result<Vec<Alert>> {
            Ok(vec![Alert {
                id: 7,
                alert_title: "Latency".to_string(),
                alert_message: "Too slow".to_string(),
                field_name: "Latency".to_string(),
                lower_bound: 0.0,
                higher_bound: 50.0,
            }])
        }

        async fn remove_alert(&self, _database: &str, _alert_id: i64) -> Result<()> {
            Ok(())
        }

        async fn detect_faults(&self, _database: &str) -> Result<String> {
            Ok(String::new())
        }

        async fn list_notifications(&self) -> Result<Vec<Notification>> {
            Ok(Vec::new())
        }

        async fn remove_notification(&self, _id: i64) -> Result<()> {
            Ok(())
        }
    }

    fn app() -> (App, EventHandler) {
        let events = EventHandler::new(250);
        let app = App::new(Arc::new(StaticApi), events.sender());
        (app, events)
    }

    fn press(app: &mut App, code: KeyCode) {
        app.handle_key(code, KeyModifiers::NONE);
    }

    #[test]
    fn focus_cycles_both_ways() {
        assert_eq!(Focus::Database.prev(), Focus::Alerts);
        assert_eq!(Focus::Alerts.next(), Focus::Database);
        assert_eq!(Focus::Column.next(), Focus::Title);
    }

    #[tokio::test]
    async fn databases_loaded_selects_first_and_fetches_tables() {
        let (mut app, mut events) = app();

        app.handle_event(Event::DatabasesLoaded(vec!["database_sample_data".to_string()]));
        app.form.settle().await;

        assert_eq!(app.state().database(), "database_sample_data");
        assert_eq!(app.state().tables(), ["kpis".to_string(), "devices".to_string()]);

        // The alert list was requested alongside
        let event = events.next().await.unwrap();
        assert!(matches!(event, Event::AlertsLoaded { ref alerts, .. } if alerts.len() == 1));
    }

    #[tokio::test]
    async fn choosing_table_and_column_fills_field_name() {
        let (mut app, _events) = app();
        app.select_database("database_sample_data".to_string());
        app.form.settle().await;

        app.focus = Focus::Table;
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Enter);
        app.form.settle().await;
        assert_eq!(app.state().selected_table(), "kpis");
        assert_eq!(app.focus, Focus::Column);

        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.state().draft().field_name, "Signal_Strength");
        assert_eq!(app.focus, Focus::Title);
    }

    #[tokio::test]
    async fn bound_inputs_only_accept_numbers() {
        let (mut app, _events) = app();
        app.focus = Focus::LowerBound;

        for c in ['-', '1', 'x', '.', '5'] {
            press(&mut app, KeyCode::Char(c));
        }
        press(&mut app, KeyCode::Backspace);

        assert_eq!(app.state().draft().lower_bound, "-1.");
    }

    #[tokio::test]
    async fn q_types_into_text_fields_instead_of_quitting() {
        let (mut app, _events) = app();
        app.focus = Focus::Title;
        press(&mut app, KeyCode::Char('q'));
        assert!(!app.should_quit);
        assert_eq!(app.state().draft().alert_title, "q");

        app.focus = Focus::Submit;
        press(&mut app, KeyCode::Char('q'));
        assert!(app.should_quit);
    }

    #[tokio::test]
    async fn successful_submit_requests_alert_refresh() {
        let (mut app, mut events) = app();
        app.select_database("database_sample_data".to_string());
        app.form.settle().await;
        // Drain the initial alert load
        let _ = events.next().await;

        for (field, value) in [
            (DraftField::Title, "t"),
            (DraftField::Message, "m"),
            (DraftField::FieldName, "Latency"),
            (DraftField::LowerBound, "1"),
            (DraftField::HigherBound, "2"),
        ] {
            app.form.dispatch(Action::FieldEdited(field, value.to_string()));
        }
        app.focus = Focus::Submit;
        press(&mut app, KeyCode::Enter);
        app.form.settle().await;

        assert!(matches!(events.next().await, Some(Event::RefreshAlerts)));
        assert!(app.state().draft().is_empty());
    }

    #[tokio::test]
    async fn stale_alert_list_is_ignored() {
        let (mut app, _events) = app();
        app.select_database("b".to_string());

        app.handle_event(Event::AlertsLoaded {
            database: "a".to_string(),
            alerts: vec![],
        });
        app.handle_event(Event::AlertsLoaded {
            database: "b".to_string(),
            alerts: vec![Alert {
                id: 1,
                alert_title: "x".to_string(),
                alert_message: "y".to_string(),
                field_name: "Latency".to_string(),
                lower_bound: 0.0,
                higher_bound: 1.0,
            }],
        });

        assert_eq!(app.alerts.len(), 1);
        assert_eq!(app.alerts_state.selected(), Some(0));
    }
}
