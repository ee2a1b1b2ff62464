//! Typed access to the fault-management backend

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use super::http::HttpClient;
use crate::config::ApiConfig;
use crate::error::Result;
use crate::models::{Alert, NewAlert, Notification};

/// Operations the fault-management backend offers.
///
/// The form and the CLI only talk to the backend through this trait.
#[async_trait]
pub trait FaultApi: Send + Sync {
    /// Databases the backend can inspect
    async fn list_databases(&self) -> Result<Vec<String>>;

    /// Tables of `database`
    async fn list_tables(&self, database: &str) -> Result<Vec<String>>;

    /// Monitorable columns of `table`
    async fn list_columns(&self, database: &str, table: &str) -> Result<Vec<String>>;

    /// Rows of `table`, one JSON value per cell
    async fn raw_data(&self, database: &str, table: &str) -> Result<Vec<Vec<Value>>>;

    /// Create an alert scoped to `database`
    async fn add_alert(&self, database: &str, alert: &NewAlert) -> Result<()>;

    /// Alerts defined for `database`
    async fn list_alerts(&self, database: &str) -> Result<Vec<Alert>>;

    /// Delete an alert
    async fn remove_alert(&self, database: &str, alert_id: i64) -> Result<()>;

    /// Run fault detection for `database`, returning the backend's message
    async fn detect_faults(&self, database: &str) -> Result<String>;

    /// Faults recorded by the last detection run
    async fn list_notifications(&self) -> Result<Vec<Notification>>;

    /// Dismiss a recorded fault
    async fn remove_notification(&self, id: i64) -> Result<()>;
}

#[derive(Debug, Deserialize)]
struct DatabasesResponse {
    databases: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct TablesResponse {
    tables: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ColumnsResponse {
    columns: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawDataResponse {
    raw_data: Vec<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct AlertsResponse {
    alerts: Vec<Alert>,
}

#[derive(Debug, Deserialize)]
struct NotificationsResponse {
    notifications: Vec<Notification>,
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    message: String,
}

#[derive(Debug, Serialize)]
struct RemoveAlertRequest {
    alert_id: i64,
}

#[derive(Debug, Serialize)]
struct DetectFaultsRequest<'a> {
    database: &'a str,
}

#[derive(Debug, Serialize)]
struct RemoveNotificationRequest {
    id: i64,
}

/// [`FaultApi`] over HTTP
#[derive(Debug, Clone)]
pub struct FaultClient {
    http: HttpClient,
    prefix: String,
}

impl FaultClient {
    /// Create a client from API configuration
    pub fn new(config: &ApiConfig) -> Result<Self> {
        Ok(Self {
            http: HttpClient::new(&config.base_url)?,
            prefix: normalize_prefix(&config.prefix),
        })
    }

    /// Underlying HTTP wrapper
    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    fn route(&self, endpoint: &str) -> String {
        format!("{}/{}", self.prefix, endpoint)
    }
}

/// `fault_management/` becomes `/fault_management`; an empty prefix stays empty
fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}

#[async_trait]
impl FaultApi for FaultClient {
    async fn list_databases(&self) -> Result<Vec<String>> {
        let response: DatabasesResponse = self.http.get(&self.route("list_databases"), &[]).await?;
        Ok(response.databases)
    }

    async fn list_tables(&self, database: &str) -> Result<Vec<String>> {
        let response: TablesResponse = self
            .http
            .get(&self.route("tables_from_db"), &[("database", database)])
            .await?;
        Ok(response.tables)
    }

    async fn list_columns(&self, database: &str, table: &str) -> Result<Vec<String>> {
        let response: ColumnsResponse = self
            .http
            .get(
                &self.route("columns_from_db"),
                &[("database", database), ("table", table)],
            )
            .await?;
        Ok(response.columns)
    }

    async fn raw_data(&self, database: &str, table: &str) -> Result<Vec<Vec<Value>>> {
        let response: RawDataResponse = self
            .http
            .get(
                &self.route("raw_data"),
                &[("database", database), ("table", table)],
            )
            .await?;
        Ok(response.raw_data)
    }

    async fn add_alert(&self, database: &str, alert: &NewAlert) -> Result<()> {
        self.http
            .post_status(&self.route("add_alert"), &[("database", database)], alert)
            .await?;
        info!(database, field = %alert.field_name, title = %alert.alert_title, "Alert created");
        Ok(())
    }

    async fn list_alerts(&self, database: &str) -> Result<Vec<Alert>> {
        let response: AlertsResponse = self
            .http
            .get(&self.route("alerts"), &[("database", database)])
            .await?;
        Ok(response.alerts)
    }

    async fn remove_alert(&self, database: &str, alert_id: i64) -> Result<()> {
        self.http
            .post_status(
                &self.route("remove_alert"),
                &[("database", database)],
                &RemoveAlertRequest { alert_id },
            )
            .await?;
        info!(database, alert_id, "Alert removed");
        Ok(())
    }

    async fn detect_faults(&self, database: &str) -> Result<String> {
        let response: MessageResponse = self
            .http
            .post(&self.route("detect_faults"), &[], &DetectFaultsRequest { database })
            .await?;
        Ok(response.message)
    }

    async fn list_notifications(&self) -> Result<Vec<Notification>> {
        let response: NotificationsResponse =
            self.http.get(&self.route("get_notifications"), &[]).await?;
        Ok(response.notifications)
    }

    async fn remove_notification(&self, id: i64) -> Result<()> {
        self.http
            .post_status(
                &self.route("remove_notification"),
                &[],
                &RemoveNotificationRequest { id },
            )
            .await?;
        info!(id, "Notification dismissed");
        Ok(())
    }
}
