//! Alert form state and its reducer
//!
//! [`FormState::apply`] is pure apart from debug logging: it folds one
//! [`Action`] into the state and returns the [`Effect`]s the caller must
//! perform. Every table and column request carries a sequence token; a
//! response is applied only while its token is still the latest one issued.

use tracing::debug;

use crate::error::{Error, FailureKind};
use crate::models::{AlertDraft, DraftField, NewAlert};

/// Shown when the table list cannot be loaded
pub const TABLES_ERROR: &str = "Failed to fetch tables";
/// Shown when the column list cannot be loaded
pub const COLUMNS_ERROR: &str = "Failed to fetch columns";
/// Shown when alert creation fails
pub const ADD_ALERT_ERROR: &str = "Failed to add alert";
/// Shown after an alert was created
pub const ADD_ALERT_SUCCESS: &str = "Alert added successfully";
/// Shown when submitting without a database
pub const NO_DATABASE_ERROR: &str = "Select a database first";

/// Something that happened to the form
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// The parent selected another database
    DatabaseChanged(String),
    /// The user selected another table (empty clears it)
    TableChanged(String),
    /// The user edited a draft field
    FieldEdited(DraftField, String),
    /// The user submitted the form
    Submit,
    /// A table fetch finished
    TablesResolved {
        /// Token the request was issued with
        seq: u64,
        /// Table names, or why the fetch failed
        result: Result<Vec<String>, FailureKind>,
    },
    /// A column fetch finished
    ColumnsResolved {
        /// Token the request was issued with
        seq: u64,
        /// Column names, or why the fetch failed
        result: Result<Vec<String>, FailureKind>,
    },
    /// An alert creation request finished
    SubmitResolved(Result<(), FailureKind>),
}

/// Work requested by the reducer
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Load the tables of `database`
    FetchTables {
        /// Sequence token to echo back
        seq: u64,
        /// Database to inspect
        database: String,
    },
    /// Load the columns of `table`
    FetchColumns {
        /// Sequence token to echo back
        seq: u64,
        /// Database the table lives in
        database: String,
        /// Table to inspect
        table: String,
    },
    /// Create an alert
    CreateAlert {
        /// Database the alert is scoped to
        database: String,
        /// Payload to send
        alert: NewAlert,
    },
    /// Tell the parent its alert list is out of date
    RefreshAlerts,
}

/// Error shown by the form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormError {
    /// What went wrong, coarsely
    pub kind: FailureKind,
    /// User-facing text
    pub message: String,
}

impl FormError {
    fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for FormError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

/// State of the alert configuration form
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormState {
    database: String,
    tables: Vec<String>,
    selected_table: String,
    columns: Vec<String>,
    draft: AlertDraft,
    error: Option<FormError>,
    success: Option<String>,
    tables_seq: u64,
    columns_seq: u64,
}

impl FormState {
    /// Empty form with no database selected
    pub fn new() -> Self {
        Self::default()
    }

    /// Selected database
    pub fn database(&self) -> &str {
        &self.database
    }

    /// Tables of the selected database
    pub fn tables(&self) -> &[String] {
        &self.tables
    }

    /// Selected table, empty when none
    pub fn selected_table(&self) -> &str {
        &self.selected_table
    }

    /// Columns of the selected table
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Draft being edited
    pub fn draft(&self) -> &AlertDraft {
        &self.draft
    }

    /// Current error, if any
    pub fn error(&self) -> Option<&FormError> {
        self.error.as_ref()
    }

    /// Current success message, if any
    pub fn success(&self) -> Option<&str> {
        self.success.as_deref()
    }

    /// Latest table request token
    pub fn tables_seq(&self) -> u64 {
        self.tables_seq
    }

    /// Latest column request token
    pub fn columns_seq(&self) -> u64 {
        self.columns_seq
    }

    /// Apply an action and return the effects to perform
    pub fn apply(&mut self, action: Action) -> Vec<Effect> {
        match action {
            Action::DatabaseChanged(database) => self.change_database(database),
            Action::TableChanged(table) => self.change_table(table),
            Action::FieldEdited(field, value) => {
                self.draft.set(field, value);
                Vec::new()
            }
            Action::Submit => self.submit(),
            Action::TablesResolved { seq, result } => {
                if seq != self.tables_seq {
                    debug!(seq, latest = self.tables_seq, "Discarding stale table list");
                    return Vec::new();
                }
                match result {
                    Ok(tables) => self.tables = tables,
                    Err(kind) => {
                        self.tables.clear();
                        self.error = Some(FormError::new(kind, TABLES_ERROR));
                    }
                }
                Vec::new()
            }
            Action::ColumnsResolved { seq, result } => {
                if seq != self.columns_seq {
                    debug!(seq, latest = self.columns_seq, "Discarding stale column list");
                    return Vec::new();
                }
                match result {
                    Ok(columns) => self.columns = columns,
                    Err(kind) => {
                        self.columns.clear();
                        self.error = Some(FormError::new(kind, COLUMNS_ERROR));
                    }
                }
                Vec::new()
            }
            Action::SubmitResolved(Ok(())) => {
                self.success = Some(ADD_ALERT_SUCCESS.to_string());
                self.draft = AlertDraft::default();
                vec![Effect::RefreshAlerts]
            }
            Action::SubmitResolved(Err(kind)) => {
                self.error = Some(FormError::new(kind, ADD_ALERT_ERROR));
                Vec::new()
            }
        }
    }

    fn change_database(&mut self, database: String) -> Vec<Effect> {
        if database == self.database {
            return Vec::new();
        }

        self.database = database;
        self.tables_seq += 1;
        self.tables.clear();
        self.selected_table.clear();
        // In-flight column requests belong to the old database
        self.columns_seq += 1;
        self.columns.clear();
        self.draft.field_name.clear();

        if self.database.is_empty() {
            return Vec::new();
        }

        vec![Effect::FetchTables {
            seq: self.tables_seq,
            database: self.database.clone(),
        }]
    }

    fn change_table(&mut self, table: String) -> Vec<Effect> {
        if table == self.selected_table {
            return Vec::new();
        }

        self.selected_table = table;
        self.columns_seq += 1;
        self.columns.clear();
        self.draft.field_name.clear();

        if self.selected_table.is_empty() || self.database.is_empty() {
            return Vec::new();
        }

        vec![Effect::FetchColumns {
            seq: self.columns_seq,
            database: self.database.clone(),
            table: self.selected_table.clone(),
        }]
    }

    fn submit(&mut self) -> Vec<Effect> {
        self.error = None;
        self.success = None;

        if self.database.is_empty() {
            self.error = Some(FormError::new(FailureKind::Validation, NO_DATABASE_ERROR));
            return Vec::new();
        }

        match self.draft.to_payload() {
            Ok(alert) => vec![Effect::CreateAlert {
                database: self.database.clone(),
                alert,
            }],
            Err(err) => {
                let message = match err {
                    Error::Validation(msg) => msg,
                    other => other.to_string(),
                };
                self.error = Some(FormError::new(FailureKind::Validation, message));
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn with_database(database: &str) -> FormState {
        let mut state = FormState::new();
        state.apply(Action::DatabaseChanged(database.to_string()));
        state
    }

    fn loaded(database: &str, table: &str) -> FormState {
        let mut state = with_database(database);
        let seq = state.tables_seq();
        state.apply(Action::TablesResolved {
            seq,
            result: Ok(vec![table.to_string()]),
        });
        state.apply(Action::TableChanged(table.to_string()));
        let seq = state.columns_seq();
        state.apply(Action::ColumnsResolved {
            seq,
            result: Ok(vec!["Latency".to_string(), "Signal_Strength".to_string()]),
        });
        state
    }

    fn fill_draft(state: &mut FormState) {
        for (field, value) in [
            (DraftField::Title, "High latency"),
            (DraftField::Message, "Latency out of range"),
            (DraftField::FieldName, "Latency"),
            (DraftField::LowerBound, "10"),
            (DraftField::HigherBound, "80"),
        ] {
            state.apply(Action::FieldEdited(field, value.to_string()));
        }
    }

    #[test]
    fn selecting_database_fetches_its_tables_once() {
        let mut state = FormState::new();
        let effects = state.apply(Action::DatabaseChanged("sensors".to_string()));
        assert_eq!(
            effects,
            vec![Effect::FetchTables {
                seq: 1,
                database: "sensors".to_string()
            }]
        );

        // Same value again is not a change
        assert!(state
            .apply(Action::DatabaseChanged("sensors".to_string()))
            .is_empty());
    }

    #[test]
    fn resolved_tables_populate_the_list() {
        let mut state = with_database("sensors");
        state.apply(Action::TablesResolved {
            seq: 1,
            result: Ok(vec!["readings".to_string()]),
        });
        assert_eq!(state.tables(), ["readings".to_string()]);
        assert!(state.error().is_none());
    }

    #[test]
    fn selecting_table_fetches_columns_for_database_and_table() {
        let mut state = with_database("sensors");
        let effects = state.apply(Action::TableChanged("readings".to_string()));
        assert_eq!(
            effects,
            vec![Effect::FetchColumns {
                seq: state.columns_seq(),
                database: "sensors".to_string(),
                table: "readings".to_string(),
            }]
        );
    }

    #[test]
    fn selecting_empty_table_fetches_nothing() {
        let mut state = loaded("sensors", "readings");
        state.apply(Action::FieldEdited(DraftField::FieldName, "Latency".to_string()));

        let effects = state.apply(Action::TableChanged(String::new()));

        assert!(effects.is_empty());
        assert!(state.columns().is_empty());
        assert_eq!(state.draft().field_name, "");
    }

    #[test]
    fn changing_database_clears_downstream_selection() {
        let mut state = loaded("sensors", "kpis");
        fill_draft(&mut state);

        state.apply(Action::DatabaseChanged("other".to_string()));

        assert_eq!(state.selected_table(), "");
        assert!(state.tables().is_empty());
        assert!(state.columns().is_empty());
        assert_eq!(state.draft().field_name, "");
        // Unrelated draft fields survive
        assert_eq!(state.draft().alert_title, "High latency");
    }

    #[test]
    fn empty_database_fetches_nothing() {
        let mut state = with_database("sensors");
        assert!(state.apply(Action::DatabaseChanged(String::new())).is_empty());
        assert_eq!(state.database(), "");
    }

    #[test]
    fn failed_table_fetch_shows_fixed_message() {
        let mut state = with_database("sensors");
        state.apply(Action::TablesResolved {
            seq: 1,
            result: Err(FailureKind::Server(500)),
        });

        assert!(state.tables().is_empty());
        let error = state.error().unwrap();
        assert_eq!(error.message, TABLES_ERROR);
        assert_eq!(error.kind, FailureKind::Server(500));
    }

    #[test]
    fn failed_column_fetch_shows_fixed_message() {
        let mut state = with_database("sensors");
        state.apply(Action::TableChanged("kpis".to_string()));
        let seq = state.columns_seq();
        state.apply(Action::ColumnsResolved {
            seq,
            result: Err(FailureKind::Network),
        });

        assert_eq!(state.error().unwrap().message, COLUMNS_ERROR);
    }

    #[test]
    fn stale_table_response_is_discarded() {
        let mut state = with_database("slow");
        state.apply(Action::DatabaseChanged("fast".to_string()));
        state.apply(Action::TablesResolved {
            seq: 2,
            result: Ok(vec!["fast_table".to_string()]),
        });

        let before = state.clone();
        state.apply(Action::TablesResolved {
            seq: 1,
            result: Ok(vec!["slow_table".to_string()]),
        });

        assert_eq!(state, before);
    }

    #[test]
    fn column_response_from_previous_database_is_discarded() {
        let mut state = with_database("a");
        state.apply(Action::TableChanged("t".to_string()));
        let old_seq = state.columns_seq();

        state.apply(Action::DatabaseChanged("b".to_string()));
        state.apply(Action::ColumnsResolved {
            seq: old_seq,
            result: Ok(vec!["x".to_string()]),
        });

        assert!(state.columns().is_empty());
    }

    #[test]
    fn submit_sends_exact_payload_for_selected_database() {
        let mut state = loaded("sensors", "kpis");
        fill_draft(&mut state);

        let effects = state.apply(Action::Submit);

        assert_eq!(
            effects,
            vec![Effect::CreateAlert {
                database: "sensors".to_string(),
                alert: NewAlert {
                    alert_title: "High latency".to_string(),
                    alert_message: "Latency out of range".to_string(),
                    field_name: "Latency".to_string(),
                    lower_bound: 10.0,
                    higher_bound: 80.0,
                },
            }]
        );
    }

    #[test]
    fn successful_submit_resets_draft_and_requests_refresh() {
        let mut state = loaded("sensors", "kpis");
        fill_draft(&mut state);
        state.apply(Action::Submit);

        let effects = state.apply(Action::SubmitResolved(Ok(())));

        assert_eq!(effects, vec![Effect::RefreshAlerts]);
        assert!(state.draft().is_empty());
        assert_eq!(state.success(), Some(ADD_ALERT_SUCCESS));
    }

    #[test]
    fn failed_submit_keeps_draft() {
        let mut state = loaded("sensors", "kpis");
        fill_draft(&mut state);
        state.apply(Action::Submit);

        let effects = state.apply(Action::SubmitResolved(Err(FailureKind::Server(422))));

        assert!(effects.is_empty());
        assert_eq!(state.error().unwrap().message, ADD_ALERT_ERROR);
        assert_eq!(state.draft().alert_title, "High latency");
    }

    #[test]
    fn submit_clears_previous_feedback() {
        let mut state = loaded("sensors", "kpis");
        fill_draft(&mut state);
        state.apply(Action::Submit);
        state.apply(Action::SubmitResolved(Err(FailureKind::Network)));

        fill_draft(&mut state);
        state.apply(Action::Submit);

        assert!(state.error().is_none());
        assert!(state.success().is_none());
    }

    #[test]
    fn incomplete_draft_is_not_submitted() {
        let mut state = loaded("sensors", "kpis");
        fill_draft(&mut state);
        state.apply(Action::FieldEdited(DraftField::LowerBound, "ten".to_string()));

        let effects = state.apply(Action::Submit);

        assert!(effects.is_empty());
        let error = state.error().unwrap();
        assert_eq!(error.kind, FailureKind::Validation);
        assert_eq!(error.message, "Lower Bound must be a number");
    }

    #[test]
    fn submit_without_database_is_rejected() {
        let mut state = FormState::new();
        fill_draft(&mut state);
        assert!(state.apply(Action::Submit).is_empty());
        assert_eq!(state.error().unwrap().message, NO_DATABASE_ERROR);
    }

    fn arb_action() -> impl Strategy<Value = Action> {
        let name = prop::sample::select(vec!["", "a", "b", "c"]).prop_map(str::to_string);
        let names = prop::collection::vec(name.clone(), 0..3);
        prop_oneof![
            name.clone().prop_map(Action::DatabaseChanged),
            name.clone().prop_map(Action::TableChanged),
            name.clone()
                .prop_map(|v| Action::FieldEdited(DraftField::FieldName, v)),
            Just(Action::Submit),
            (0u64..6, names.clone()).prop_map(|(seq, tables)| Action::TablesResolved {
                seq,
                result: Ok(tables),
            }),
            (0u64..6, names).prop_map(|(seq, columns)| Action::ColumnsResolved {
                seq,
                result: Ok(columns),
            }),
        ]
    }

    proptest! {
        #[test]
        fn database_change_always_resets_cascade(
            actions in prop::collection::vec(arb_action(), 0..20),
            database in "[d-f]",
        ) {
            let mut state = FormState::new();
            for action in actions {
                state.apply(action);
            }

            state.apply(Action::DatabaseChanged(database));

            prop_assert_eq!(state.selected_table(), "");
            prop_assert!(state.tables().is_empty());
            prop_assert!(state.columns().is_empty());
            prop_assert_eq!(state.draft().field_name.as_str(), "");
        }

        #[test]
        fn stale_responses_never_change_state(
            actions in prop::collection::vec(arb_action(), 0..20),
            lag in 1u64..4,
        ) {
            let mut state = FormState::new();
            state.apply(Action::DatabaseChanged("z".to_string()));
            for action in actions {
                state.apply(action);
            }

            let before = state.clone();
            state.apply(Action::TablesResolved {
                seq: state.tables_seq().saturating_sub(lag),
                result: Ok(vec!["stale".to_string()]),
            });
            state.apply(Action::ColumnsResolved {
                seq: state.columns_seq().saturating_sub(lag),
                result: Err(FailureKind::Network),
            });

            prop_assert_eq!(state, before);
        }
    }
}
