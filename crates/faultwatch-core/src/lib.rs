//! # Faultwatch
//!
//! Client for a fault-management backend that watches numeric columns of
//! monitored databases.
//!
//! Faultwatch configures threshold alerts: pick a database, a table and one
//! of its columns, give the alert a title, a message and an accepted range,
//! and submit it to the backend.
//!
//! ## Architecture
//!
//! - **Client**: HTTP wrapper and typed backend API
//! - **Form**: alert form state, reducer and async controller
//! - **TUI**: terminal page hosting the form
//!
//! ## Quick Start
//!
//! ```bash
//! # Open the alert form
//! faultwatch form --database database_sample_data
//!
//! # List alerts of a database
//! faultwatch alerts list --database database_sample_data
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod client;
pub mod config;
pub mod error;
pub mod form;
pub mod models;
#[cfg(feature = "tui")]
pub mod tui;

pub use config::Config;
pub use error::{Error, FailureKind, Result};

/// Re-exports for convenience
pub mod prelude {
    pub use crate::client::{FaultApi, FaultClient, HttpClient};
    pub use crate::config::Config;
    pub use crate::error::{Error, FailureKind, Result};
    pub use crate::form::{Action, Effect, FormController, FormState};
    pub use crate::models::*;
}
