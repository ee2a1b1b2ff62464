//! Terminal User Interface for Faultwatch
//!
//! Hosts the alert form next to the alert list of the selected database.

mod app;
mod components;
mod event;
mod ui;

pub use app::{App, Focus};
pub use event::{Event, EventHandler};
