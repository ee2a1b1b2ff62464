//! Event plumbing for the form page
//!
//! Keys come from a blocking crossterm reader, redraw ticks from a tokio
//! interval, and backend replies from tasks holding a [`EventHandler::sender`].
//! All of them arrive on one channel.

use std::time::Duration;

use crossterm::event::{self, Event as TerminalEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::warn;

use crate::models::Alert;

/// Input to the page
#[derive(Debug, Clone)]
pub enum Event {
    /// Redraw tick
    Tick,
    /// Key press
    Key(KeyEvent),
    /// Terminal was resized
    Resize,
    /// Database list arrived
    DatabasesLoaded(Vec<String>),
    /// Alert list for the selected database arrived
    AlertsLoaded {
        /// Database the list belongs to
        database: String,
        /// Its alerts
        alerts: Vec<Alert>,
    },
    /// The alert list is out of date
    RefreshAlerts,
    /// A background request failed
    Error(String),
}

/// Single queue the page reads its events from
pub struct EventHandler {
    tx: mpsc::UnboundedSender<Event>,
    rx: mpsc::UnboundedReceiver<Event>,
    tick_rate: Duration,
}

impl EventHandler {
    /// Queue with a redraw tick every `tick_rate_ms`
    pub fn new(tick_rate_ms: u64) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx,
            tick_rate: Duration::from_millis(tick_rate_ms.max(1)),
        }
    }

    /// Handle for background tasks to post replies
    pub fn sender(&self) -> mpsc::UnboundedSender<Event> {
        self.tx.clone()
    }

    /// Start the tick timer and the terminal reader.
    ///
    /// Both stop once the handler is dropped.
    pub fn start(&self) {
        spawn_ticks(self.tx.clone(), self.tick_rate);
        spawn_terminal_reader(self.tx.clone(), self.tick_rate);
    }

    /// Wait for the next event
    pub async fn next(&mut self) -> Option<Event> {
        self.rx.recv().await
    }
}

fn spawn_ticks(tx: mpsc::UnboundedSender<Event>, period: Duration) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            if tx.send(Event::Tick).is_err() {
                break;
            }
        }
    });
}

// `event::read` blocks, so the reader gets its own thread. Polling with a
// timeout lets it notice a closed queue.
fn spawn_terminal_reader(tx: mpsc::UnboundedSender<Event>, poll_timeout: Duration) {
    tokio::task::spawn_blocking(move || loop {
        match event::poll(poll_timeout) {
            Ok(true) => {}
            Ok(false) if tx.is_closed() => break,
            Ok(false) => continue,
            Err(e) => {
                warn!(error = %e, "Terminal input unavailable");
                break;
            }
        }

        let forwarded = match event::read() {
            Ok(TerminalEvent::Key(key)) if key.kind == KeyEventKind::Press => Event::Key(key),
            Ok(TerminalEvent::Resize(..)) => Event::Resize,
            Ok(_) => continue,
            Err(e) => {
                warn!(error = %e, "Failed to read terminal input");
                break;
            }
        };
        if tx.send(forwarded).is_err() {
            break;
        }
    });
}

/// Ctrl+C quits from anywhere, even inside a text input
pub fn is_force_quit(key: KeyEvent) -> bool {
    key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL)
}
