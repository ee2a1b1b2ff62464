//! Alert configuration form
//!
//! The database -> tables -> columns cascade, the draft and its submission,
//! kept independent of any UI.

mod controller;
mod state;

pub use controller::FormController;
pub use state::{
    Action, Effect, FormError, FormState, ADD_ALERT_ERROR, ADD_ALERT_SUCCESS, COLUMNS_ERROR,
    NO_DATABASE_ERROR, TABLES_ERROR,
};
