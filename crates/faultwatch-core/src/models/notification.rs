//! Fault notifications raised by the backend's detector

use serde::{Deserialize, Serialize};

/// A recorded fault: one value of a watched column that fell outside an
/// alert's bounds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    /// Backend identifier
    pub id: i64,
    /// Alert that matched
    pub alert_id: i64,
    /// Title of that alert
    pub alert_title: String,
    /// Message of that alert
    pub alert_message: String,
    /// Column the value came from
    pub field_name: String,
    /// Offending value
    pub fault_value: f64,
    /// When the fault was recorded, as stored by the backend
    pub timestamp: Option<String>,
}
