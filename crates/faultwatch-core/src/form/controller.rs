//! Drives a [`FormState`] against a backend

use std::future::Future;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::state::{Action, Effect, FormState};
use crate::client::FaultApi;

/// Owns the form state and performs the reducer's effects.
///
/// Requests run as independent tokio tasks; their results come back over a
/// channel and are applied by [`FormController::next_completion`], one at a
/// time.
pub struct FormController<A: ?Sized> {
    state: FormState,
    api: Arc<A>,
    tx: mpsc::UnboundedSender<Action>,
    rx: mpsc::UnboundedReceiver<Action>,
    in_flight: usize,
    on_refresh: Box<dyn FnMut() + Send>,
}

impl<A> FormController<A>
where
    A: FaultApi + ?Sized + 'static,
{
    /// Create a controller with an empty form
    pub fn new(api: Arc<A>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            state: FormState::new(),
            api,
            tx,
            rx,
            in_flight: 0,
            on_refresh: Box::new(|| {}),
        }
    }

    /// Callback invoked once per successfully created alert
    pub fn on_refresh(mut self, callback: impl FnMut() + Send + 'static) -> Self {
        self.on_refresh = Box::new(callback);
        self
    }

    /// Current form state
    pub fn state(&self) -> &FormState {
        &self.state
    }

    /// Number of requests that have not completed yet
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Apply an action and start whatever it requires
    pub fn dispatch(&mut self, action: Action) {
        for effect in self.state.apply(action) {
            self.perform(effect);
        }
    }

    /// Wait for one request to complete and apply its result.
    ///
    /// Returns `false` immediately when nothing is in flight.
    pub async fn next_completion(&mut self) -> bool {
        if self.in_flight == 0 {
            return false;
        }

        match self.rx.recv().await {
            Some(action) => {
                self.in_flight -= 1;
                self.dispatch(action);
                true
            }
            None => false,
        }
    }

    /// Apply completions until no request is in flight
    pub async fn settle(&mut self) {
        while self.next_completion().await {}
    }

    fn perform(&mut self, effect: Effect) {
        match effect {
            Effect::FetchTables { seq, database } => {
                let api = Arc::clone(&self.api);
                self.spawn(async move {
                    let result = api.list_tables(&database).await.map_err(|e| {
                        warn!(database = %database, error = %e, "Failed to fetch tables");
                        e.kind()
                    });
                    Action::TablesResolved { seq, result }
                });
            }
            Effect::FetchColumns {
                seq,
                database,
                table,
            } => {
                let api = Arc::clone(&self.api);
                self.spawn(async move {
                    let result = api.list_columns(&database, &table).await.map_err(|e| {
                        warn!(database = %database, table = %table, error = %e, "Failed to fetch columns");
                        e.kind()
                    });
                    Action::ColumnsResolved { seq, result }
                });
            }
            Effect::CreateAlert { database, alert } => {
                let api = Arc::clone(&self.api);
                self.spawn(async move {
                    let result = api.add_alert(&database, &alert).await.map_err(|e| {
                        warn!(database = %database, error = %e, "Failed to add alert");
                        e.kind()
                    });
                    Action::SubmitResolved(result)
                });
            }
            Effect::RefreshAlerts => {
                debug!("Requesting alert refresh");
                (self.on_refresh)();
            }
        }
    }

    fn spawn<F>(&mut self, request: F)
    where
        F: Future<Output = Action> + Send + 'static,
    {
        self.in_flight += 1;
        let tx = self.tx.clone();
        tokio::spawn(async move {
            // The receiver lives as long as the controller
            let _ = tx.send(request.await);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, FailureKind, Result};
    use crate::form::state::{ADD_ALERT_SUCCESS, TABLES_ERROR};
    use crate::models::{Alert, DraftField, NewAlert, Notification};
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tokio::sync::Notify;

    /// In-memory backend that records every call
    #[derive(Default)]
    struct FakeApi {
        tables: HashMap<String, Vec<String>>,
        columns: Vec<String>,
        gates: HashMap<String, Arc<Notify>>,
        fail_tables: bool,
        calls: Mutex<Vec<String>>,
        created: Mutex<Vec<(String, NewAlert)>>,
    }

    impl FakeApi {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl FaultApi for FakeApi {
        async fn list_databases(&self) -> Result<Vec<String>> {
            Ok(self.tables.keys().cloned().collect())
        }

        async fn list_tables(&self, database: &str) -> Result<Vec<String>> {
            self.calls.lock().unwrap().push(format!("tables:{database}"));
            if let Some(gate) = self.gates.get(database) {
                gate.notified().await;
            }
            if self.fail_tables {
                return Err(Error::Status {
                    status: 500,
                    body: "boom".to_string(),
                });
            }
            Ok(self.tables.get(database).cloned().unwrap_or_default())
        }

        async fn list_columns(&self, database: &str, table: &str) -> Result<Vec<String>> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("columns:{database}/{table}"));
            Ok(self.columns.clone())
        }

        async fn raw_data(
            &self,
            _database: &str,
            _table: &str,
        ) -> Result<Vec<Vec<serde_json::Value>>> {
            Ok(Vec::new())
        }

        async fn add_alert(&self, database: &str, alert: &NewAlert) -> Result<()> {
            self.created
                .lock()
                .unwrap()
                .push((database.to_string(), alert.clone()));
            Ok(())
        }

        async fn list_alerts(&self, _database: &str) -> Result<Vec<Alert>> {
            Ok(Vec::new())
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

    fn sensors_api() -> FakeApi {
        FakeApi {
            tables: HashMap::from([("sensors".to_string(), vec!["readings".to_string()])]),
            columns: vec!["Latency".to_string()],
            ..FakeApi::default()
        }
    }

    #[tokio::test]
    async fn database_selection_loads_tables() {
        let api = Arc::new(sensors_api());
        let mut form = FormController::new(Arc::clone(&api));

        form.dispatch(Action::DatabaseChanged("sensors".to_string()));
        form.settle().await;

        assert_eq!(form.state().tables(), ["readings".to_string()]);
        assert_eq!(api.calls(), vec!["tables:sensors".to_string()]);
    }

    #[tokio::test]
    async fn failed_table_fetch_is_contained() {
        let api = Arc::new(FakeApi {
            fail_tables: true,
            ..sensors_api()
        });
        let mut form = FormController::new(api);

        form.dispatch(Action::DatabaseChanged("sensors".to_string()));
        form.settle().await;

        assert!(form.state().tables().is_empty());
        let error = form.state().error().unwrap();
        assert_eq!(error.message, TABLES_ERROR);
        assert_eq!(error.kind, FailureKind::Server(500));
    }

    #[tokio::test]
    async fn newest_table_response_wins() {
        let slow_gate = Arc::new(Notify::new());
        let api = Arc::new(FakeApi {
            tables: HashMap::from([
                ("slow".to_string(), vec!["old".to_string()]),
                ("fast".to_string(), vec!["new".to_string()]),
            ]),
            gates: HashMap::from([("slow".to_string(), Arc::clone(&slow_gate))]),
            ..FakeApi::default()
        });
        let mut form = FormController::new(api);

        form.dispatch(Action::DatabaseChanged("slow".to_string()));
        form.dispatch(Action::DatabaseChanged("fast".to_string()));
        assert_eq!(form.in_flight(), 2);

        assert!(form.next_completion().await);
        assert_eq!(form.state().tables(), ["new".to_string()]);

        slow_gate.notify_one();
        form.settle().await;

        assert_eq!(form.state().tables(), ["new".to_string()]);
        assert_eq!(form.in_flight(), 0);
    }

    #[tokio::test]
    async fn full_cascade_creates_alert_and_refreshes_once() {
        let api = Arc::new(sensors_api());
        let refreshes = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&refreshes);
        let mut form = FormController::new(Arc::clone(&api)).on_refresh(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        form.dispatch(Action::DatabaseChanged("sensors".to_string()));
        form.settle().await;
        form.dispatch(Action::TableChanged("readings".to_string()));
        form.settle().await;
        assert_eq!(form.state().columns(), ["Latency".to_string()]);

        for (field, value) in [
            (DraftField::Title, "Slow"),
            (DraftField::Message, "Latency too high"),
            (DraftField::FieldName, "Latency"),
            (DraftField::LowerBound, "0"),
            (DraftField::HigherBound, "50"),
        ] {
            form.dispatch(Action::FieldEdited(field, value.to_string()));
        }
        form.dispatch(Action::Submit);
        form.settle().await;

        assert_eq!(refreshes.load(Ordering::SeqCst), 1);
        assert!(form.state().draft().is_empty());
        assert_eq!(form.state().success(), Some(ADD_ALERT_SUCCESS));

        let created = api.created.lock().unwrap().clone();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].0, "sensors");
        assert_eq!(created[0].1.higher_bound, 50.0);
        assert_eq!(
            api.calls(),
            vec![
                "tables:sensors".to_string(),
                "columns:sensors/readings".to_string()
            ]
        );
    }

    #[tokio::test]
    async fn idle_controller_does_not_block() {
        let mut form = FormController::new(Arc::new(FakeApi::default()));
        assert!(!form.next_completion().await);
    }
}
