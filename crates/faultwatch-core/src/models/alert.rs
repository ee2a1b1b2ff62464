//! Alert data models

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Editable field of an [`AlertDraft`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DraftField {
    /// Alert title
    Title,
    /// Message shown when the alert fires
    Message,
    /// Monitored column
    FieldName,
    /// Lower bound of the accepted range
    LowerBound,
    /// Upper bound of the accepted range
    HigherBound,
}

impl DraftField {
    /// All fields, in form order
    pub const ALL: [DraftField; 5] = [
        Self::Title,
        Self::Message,
        Self::FieldName,
        Self::LowerBound,
        Self::HigherBound,
    ];

    /// Whether the field only accepts a number
    pub fn is_numeric(self) -> bool {
        matches!(self, Self::LowerBound | Self::HigherBound)
    }

    /// Label shown next to the input
    pub fn label(self) -> &'static str {
        match self {
            Self::Title => "Alert Title",
            Self::Message => "Alert Message",
            Self::FieldName => "Field Name",
            Self::LowerBound => "Lower Bound",
            Self::HigherBound => "Higher Bound",
        }
    }
}

/// In-progress alert configuration, as entered by the user.
///
/// Bounds are kept as the raw text of the input and only parsed when the
/// draft is turned into a [`NewAlert`] on submit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlertDraft {
    /// Alert title
    pub alert_title: String,
    /// Alert message
    pub alert_message: String,
    /// Column the alert watches
    pub field_name: String,
    /// Lower bound, unparsed
    pub lower_bound: String,
    /// Higher bound, unparsed
    pub higher_bound: String,
}

impl AlertDraft {
    /// Current value of a field
    pub fn get(&self, field: DraftField) -> &str {
        match field {
            DraftField::Title => &self.alert_title,
            DraftField::Message => &self.alert_message,
            DraftField::FieldName => &self.field_name,
            DraftField::LowerBound => &self.lower_bound,
            DraftField::HigherBound => &self.higher_bound,
        }
    }

    /// Replace a field's value
    pub fn set(&mut self, field: DraftField, value: impl Into<String>) {
        let slot = match field {
            DraftField::Title => &mut self.alert_title,
            DraftField::Message => &mut self.alert_message,
            DraftField::FieldName => &mut self.field_name,
            DraftField::LowerBound => &mut self.lower_bound,
            DraftField::HigherBound => &mut self.higher_bound,
        };
        *slot = value.into();
    }

    /// True when every field is blank
    pub fn is_empty(&self) -> bool {
        DraftField::ALL.iter().all(|f| self.get(*f).is_empty())
    }

    /// Build the creation payload.
    ///
    /// Every field is required and both bounds must parse as finite numbers.
    pub fn to_payload(&self) -> Result<NewAlert> {
        for field in DraftField::ALL {
            if self.get(field).trim().is_empty() {
                return Err(Error::validation(format!("{} is required", field.label())));
            }
        }

        Ok(NewAlert {
            alert_title: self.alert_title.clone(),
            alert_message: self.alert_message.clone(),
            field_name: self.field_name.clone(),
            lower_bound: parse_bound(DraftField::LowerBound, &self.lower_bound)?,
            higher_bound: parse_bound(DraftField::HigherBound, &self.higher_bound)?,
        })
    }
}

fn parse_bound(field: DraftField, raw: &str) -> Result<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| Error::validation(format!("{} must be a number", field.label())))
}

/// Body of an alert creation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAlert {
    /// Alert title
    pub alert_title: String,
    /// Alert message
    pub alert_message: String,
    /// Column the alert watches
    pub field_name: String,
    /// Values below this raise a fault
    pub lower_bound: f64,
    /// Values above this raise a fault
    pub higher_bound: f64,
}

/// A stored alert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    /// Backend identifier
    pub id: i64,
    /// Alert title
    pub alert_title: String,
    /// Alert message
    pub alert_message: String,
    /// Column the alert watches
    pub field_name: String,
    /// Lower bound
    pub lower_bound: f64,
    /// Higher bound
    pub higher_bound: f64,
}
