//! Faultwatch CLI
//!
//! Command-line interface for configuring fault-management alerts.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use console::style;
use faultwatch::client::{FaultApi, FaultClient};
use faultwatch::config::LoggingConfig;
use faultwatch::form::{Action, FormController, FormState};
use faultwatch::models::{Alert, DraftField, Notification};
use faultwatch::Config;
use serde_json::Value;
use tracing::{debug, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Faultwatch - threshold alerts for monitored databases
#[derive(Parser)]
#[command(name = "faultwatch")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, env = "FAULTWATCH_CONFIG")]
    config: Option<PathBuf>,

    /// Backend base URL (overrides the configuration file)
    #[arg(long, global = true, env = "FAULTWATCH_BASE_URL")]
    base_url: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format (for commands that print data)
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the interactive alert form
    #[cfg(feature = "tui")]
    Form {
        /// Database to start with (defaults to the first one the backend lists)
        #[arg(long, env = "FAULTWATCH_DATABASE")]
        database: Option<String>,

        /// Tick rate in milliseconds
        #[arg(long)]
        tick_rate: Option<u64>,
    },

    /// List databases known to the backend
    Databases,

    /// List the tables of a database
    Tables {
        /// Database name
        #[arg(long)]
        database: String,
    },

    /// List the monitorable columns of a table
    Columns {
        /// Database name
        #[arg(long)]
        database: String,

        /// Table name
        #[arg(long)]
        table: String,
    },

    /// Show the rows of a table, to help choose alert bounds
    Data {
        /// Database name
        #[arg(long)]
        database: String,

        /// Table name
        #[arg(long)]
        table: String,

        /// Show at most this many rows
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Manage alerts
    Alerts {
        #[command(subcommand)]
        command: AlertsCommands,
    },

    /// Run fault detection and manage recorded faults
    Faults {
        #[command(subcommand)]
        command: FaultsCommands,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand)]
enum AlertsCommands {
    /// List the alerts of a database
    List {
        /// Database name
        #[arg(long)]
        database: String,
    },

    /// Create an alert
    Create {
        /// Database name
        #[arg(long)]
        database: String,

        /// Table holding the monitored column
        #[arg(long)]
        table: String,

        /// Monitored column
        #[arg(long)]
        field: String,

        /// Alert title
        #[arg(long)]
        title: String,

        /// Message recorded with each fault
        #[arg(long)]
        message: String,

        /// Values below this are faults
        #[arg(long, allow_hyphen_values = true)]
        lower: String,

        /// Values above this are faults
        #[arg(long, allow_hyphen_values = true)]
        higher: String,
    },

    /// Delete an alert
    Delete {
        /// Database name
        #[arg(long)]
        database: String,

        /// Alert ID to delete
        alert_id: i64,

        /// Skip confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum FaultsCommands {
    /// Check the database's values against its alerts
    Detect {
        /// Database name
        #[arg(long)]
        database: String,
    },

    /// List recorded faults
    List,

    /// Dismiss a recorded fault
    Dismiss {
        /// Fault ID
        id: i64,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    // Values from .env feed the clap `env` fallbacks below
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let mut config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            return ExitCode::FAILURE;
        }
    };
    if let Some(base_url) = cli.base_url.clone() {
        config.api.base_url = base_url;
    }

    #[cfg(feature = "tui")]
    let log_to_file = matches!(cli.command, Commands::Form { .. });
    #[cfg(not(feature = "tui"))]
    let log_to_file = false;

    let _log_guard = match init_logging(&config.logging, cli.verbose, log_to_file) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error initializing logging: {e}");
            return ExitCode::FAILURE;
        }
    };

    debug!(base_url = %config.api.base_url, prefix = %config.api.prefix, "Configuration loaded");

    let result = match cli.command {
        #[cfg(feature = "tui")]
        Commands::Form {
            database,
            tick_rate,
        } => run_form(&config, database, tick_rate).await,
        Commands::Databases => run_databases(&config, cli.format).await,
        Commands::Tables { database } => run_tables(&config, &database, cli.format).await,
        Commands::Columns { database, table } => {
            run_columns(&config, &database, &table, cli.format).await
        }
        Commands::Data {
            database,
            table,
            limit,
        } => run_data(&config, &database, &table, limit, cli.format).await,
        Commands::Alerts { command } => run_alerts(&config, command, cli.format).await,
        Commands::Faults { command } => run_faults(&config, command, cli.format).await,
        Commands::Completions { shell } => {
            generate_completions(shell);
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {e:#}", style("Error:").red().bold());
            ExitCode::FAILURE
        }
    }
}

/// Install the global subscriber.
///
/// The TUI owns the terminal, so in that mode logs go to a daily rolling file.
fn init_logging(
    logging: &LoggingConfig,
    verbose: bool,
    to_file: bool,
) -> anyhow::Result<Option<WorkerGuard>> {
    let level = if verbose { "debug" } else { logging.level.as_str() };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let json = logging.format.eq_ignore_ascii_case("json");

    if to_file {
        let directory = logging.resolved_directory();
        std::fs::create_dir_all(&directory)
            .with_context(|| format!("creating log directory {}", directory.display()))?;
        let appender = tracing_appender::rolling::daily(&directory, "faultwatch.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);

        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(writer)
            .with_ansi(false);
        if json {
            builder.json().init();
        } else {
            builder.init();
        }
        return Ok(Some(guard));
    }

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
    Ok(None)
}

fn connect(config: &Config) -> anyhow::Result<Arc<FaultClient>> {
    let client = FaultClient::new(&config.api)
        .with_context(|| format!("invalid backend URL {}", config.api.base_url))?;
    Ok(Arc::new(client))
}

#[cfg(feature = "tui")]
async fn run_form(
    config: &Config,
    database: Option<String>,
    tick_rate: Option<u64>,
) -> anyhow::Result<()> {
    use faultwatch::tui::{App, EventHandler};

    info!(base_url = %config.api.base_url, "Starting alert form");

    let api: Arc<dyn FaultApi> = connect(config)?;
    let events = EventHandler::new(tick_rate.unwrap_or(config.tui.tick_rate_ms));
    let mut app = App::new(api, events.sender()).with_backend(config.api.base_url.clone());
    if let Some(database) = database {
        app = app.with_database(database);
    }

    app.run(events).await?;
    Ok(())
}

async fn run_databases(config: &Config, format: OutputFormat) -> anyhow::Result<()> {
    let databases = connect(config)?.list_databases().await?;
    print_names(&databases, format)
}

async fn run_tables(config: &Config, database: &str, format: OutputFormat) -> anyhow::Result<()> {
    let tables = connect(config)?.list_tables(database).await?;
    print_names(&tables, format)
}

async fn run_columns(
    config: &Config,
    database: &str,
    table: &str,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let columns = connect(config)?.list_columns(database, table).await?;
    print_names(&columns, format)
}

async fn run_data(
    config: &Config,
    database: &str,
    table: &str,
    limit: Option<usize>,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let mut rows = connect(config)?.raw_data(database, table).await?;
    if let Some(limit) = limit {
        rows.truncate(limit);
    }
    print_rows(&rows, format)
}

async fn run_alerts(
    config: &Config,
    command: AlertsCommands,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let api = connect(config)?;

    match command {
        AlertsCommands::List { database } => {
            let alerts = api.list_alerts(&database).await?;
            print_alerts(&alerts, format)?;
        }
        AlertsCommands::Create {
            database,
            table,
            field,
            title,
            message,
            lower,
            higher,
        } => {
            let refreshed = Arc::new(AtomicBool::new(false));
            let flag = Arc::clone(&refreshed);
            let mut form = FormController::new(Arc::clone(&api))
                .on_refresh(move || flag.store(true, Ordering::SeqCst));

            form.dispatch(Action::DatabaseChanged(database.clone()));
            form.settle().await;
            ensure_no_error(form.state())?;
            if !form.state().tables().contains(&table) {
                bail!("table '{table}' not found in database '{database}'");
            }

            form.dispatch(Action::TableChanged(table.clone()));
            form.settle().await;
            ensure_no_error(form.state())?;
            if !form.state().columns().contains(&field) {
                bail!(
                    "column '{field}' cannot be monitored in '{table}' (available: {})",
                    form.state().columns().join(", ")
                );
            }

            for (draft_field, value) in [
                (DraftField::Title, title),
                (DraftField::Message, message),
                (DraftField::FieldName, field),
                (DraftField::LowerBound, lower),
                (DraftField::HigherBound, higher),
            ] {
                form.dispatch(Action::FieldEdited(draft_field, value));
            }
            form.dispatch(Action::Submit);
            form.settle().await;
            ensure_no_error(form.state())?;

            if let Some(success) = form.state().success() {
                println!("{} {success}", style("✓").green().bold());
            }
            if refreshed.load(Ordering::SeqCst) {
                let alerts = api.list_alerts(&database).await?;
                print_alerts(&alerts, format)?;
            }
        }
        AlertsCommands::Delete {
            database,
            alert_id,
            yes,
        } => {
            if !yes {
                let confirmed = dialoguer::Confirm::new()
                    .with_prompt(format!("Delete alert {alert_id} from '{database}'?"))
                    .default(false)
                    .interact()?;
                if !confirmed {
                    println!("Aborted.");
                    return Ok(());
                }
            }
            api.remove_alert(&database, alert_id).await?;
            println!("{} Alert {alert_id} removed", style("✓").green().bold());
        }
    }
    Ok(())
}

async fn run_faults(
    config: &Config,
    command: FaultsCommands,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let api = connect(config)?;

    match command {
        FaultsCommands::Detect { database } => {
            let spinner = indicatif::ProgressBar::new_spinner();
            spinner.set_message(format!("Detecting faults in '{database}'..."));
            spinner.enable_steady_tick(Duration::from_millis(100));
            let result = api.detect_faults(&database).await;
            spinner.finish_and_clear();

            println!("{} {}", style("✓").green().bold(), result?);
        }
        FaultsCommands::List => {
            let notifications = api.list_notifications().await?;
            print_notifications(&notifications, format)?;
        }
        FaultsCommands::Dismiss { id } => {
            api.remove_notification(id).await?;
            println!("{} Fault {id} dismissed", style("✓").green().bold());
        }
    }
    Ok(())
}

fn ensure_no_error(state: &FormState) -> anyhow::Result<()> {
    match state.error() {
        Some(error) => bail!("{} ({})", error.message, error.kind),
        None => Ok(()),
    }
}

fn print_names(names: &[String], format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(names)?),
        OutputFormat::Text => {
            for name in names {
                println!("{name}");
            }
        }
    }
    Ok(())
}

fn print_rows(rows: &[Vec<Value>], format: OutputFormat) -> anyhow::Result<()> {
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(rows)?);
        return Ok(());
    }

    if rows.is_empty() {
        println!("{}", style("No rows").dim());
        return Ok(());
    }
    for row in rows {
        let cells: Vec<String> = row.iter().map(format_cell).collect();
        println!("{}", cells.join("\t"));
    }
    Ok(())
}

fn format_cell(cell: &Value) -> String {
    match cell {
        Value::Null => "-".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn print_alerts(alerts: &[Alert], format: OutputFormat) -> anyhow::Result<()> {
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(alerts)?);
        return Ok(());
    }

    if alerts.is_empty() {
        println!("{}", style("No alerts defined").dim());
        return Ok(());
    }
    for alert in alerts {
        println!(
            "{:>5}  {}  {} ∉ [{}, {}]  {}",
            alert.id,
            style(&alert.alert_title).bold(),
            style(&alert.field_name).cyan(),
            alert.lower_bound,
            alert.higher_bound,
            style(&alert.alert_message).dim(),
        );
    }
    Ok(())
}

fn print_notifications(notifications: &[Notification], format: OutputFormat) -> anyhow::Result<()> {
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(notifications)?);
        return Ok(());
    }

    if notifications.is_empty() {
        println!("{}", style("No faults recorded").dim());
        return Ok(());
    }
    for fault in notifications {
        println!(
            "{:>5}  {}  {} = {}  {}  {}",
            fault.id,
            style(&fault.alert_title).bold(),
            style(&fault.field_name).cyan(),
            style(fault.fault_value).red(),
            fault.timestamp.as_deref().unwrap_or("-"),
            style(&fault.alert_message).dim(),
        );
    }
    Ok(())
}

fn generate_completions(shell: clap_complete::Shell) {
    use clap::CommandFactory;
    use clap_complete::generate;
    use std::io;

    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "faultwatch", &mut io::stdout());
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn cells_print_without_json_quoting() {
        assert_eq!(format_cell(&json!("kpis")), "kpis");
        assert_eq!(format_cell(&json!(21.5)), "21.5");
        assert_eq!(format_cell(&json!(null)), "-");
    }
}
