use clap::Parser;
use db_charter::api::{self, BuildChartBody, ErrorBody, Session};
use db_charter::chart::{ChartKind, ChartRequest};
use db_charter::cli::Cli;
use db_charter::config::{Config, ConnectionConfig};
use db_charter::db::BackendKind;
use db_charter::error::{CharterError, Result};
use db_charter::logging::init_stderr_logging;
use std::path::PathBuf;
use tracing::{info, warn};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    init_stderr_logging();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        let body = ErrorBody::from(&e);
        match serde_json::to_string_pretty(&body) {
            Ok(json) => println!("{json}"),
            Err(_) => eprintln!("{}: {}", body.kind, body.message),
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    cli.validate()?;

    let config = resolve_connection(&cli)?;
    info!("connecting to {}", config.display_string());

    let mut session = open_with_fallback(config).await?;
    let outcome = dispatch(&cli, &mut session).await;
    session.close().await?;
    outcome
}

/// Resolves the connection configuration, in order of precedence:
/// command line flags, a named config file entry, the config file's
/// default entry, then MYSQL_*/SQLITE_PATH environment variables.
fn resolve_connection(cli: &Cli) -> Result<ConnectionConfig> {
    if let Some(config) = cli.to_connection_config()? {
        return Ok(config);
    }

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(Config::default_path);
    if config_path.exists() {
        let file = Config::load_from_file(&config_path)?;
        if let Some(conn) = file.get_connection(cli.connection.as_deref()) {
            return Ok(conn.clone());
        }
        if let Some(name) = &cli.connection {
            return Err(CharterError::config(format!(
                "connection '{name}' not found in {}",
                config_path.display()
            )));
        }
    } else if let Some(name) = &cli.connection {
        return Err(CharterError::config(format!(
            "connection '{name}' requested but no config file at {}",
            config_path.display()
        )));
    }

    let mut config = ConnectionConfig::default();
    config.apply_env_defaults();
    if config.validate().is_ok() {
        return Ok(config);
    }

    if let Ok(path) = std::env::var("SQLITE_PATH") {
        return Ok(ConnectionConfig::sqlite(PathBuf::from(path)));
    }

    Err(CharterError::config(
        "no connection specified: pass a connection string, --sqlite, \
         a config file entry, or MYSQL_*/SQLITE_PATH environment variables",
    ))
}

/// Opens the session, falling back to a SQLite file from SQLITE_PATH
/// when a MySQL server cannot be reached.
async fn open_with_fallback(config: ConnectionConfig) -> Result<Session> {
    let is_mysql = config.backend == BackendKind::MySql;
    match Session::open(config).await {
        Ok(session) => Ok(session),
        Err(e @ (CharterError::Unreachable(_) | CharterError::Auth(_))) if is_mysql => {
            let Ok(path) = std::env::var("SQLITE_PATH") else {
                return Err(e);
            };
            warn!("MySQL connection failed ({}), falling back to SQLite", e.message());
            Session::open(ConnectionConfig::sqlite(PathBuf::from(path))).await
        }
        Err(e) => Err(e),
    }
}

async fn dispatch(cli: &Cli, session: &mut Session) -> Result<()> {
    if cli.tables {
        let response = session.list_tables().await?;
        return print_json(&response);
    }

    if let Some(table) = &cli.describe {
        let response = session.describe_table(table).await?;
        return print_json(&response);
    }

    if cli.schema {
        let context = session.schema_context().await?;
        println!("{context}");
        return Ok(());
    }

    if let Some(sql) = &cli.execute {
        let result = session.run_query(sql).await?;

        if let Some(kind) = &cli.chart {
            let kind: ChartKind = kind.parse()?;
            let request = ChartRequest {
                kind,
                label_column: cli.label.clone().unwrap_or_default(),
                value_columns: cli.value.clone(),
                title: cli.title.clone(),
            };
            let spec = api::build_chart(BuildChartBody { result, request })?;
            return print_json(&spec);
        }

        return print_json(&result);
    }

    Err(CharterError::config(
        "nothing to do: pass --tables, --describe, --schema, or --execute",
    ))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| CharterError::execution(format!("failed to serialize response: {e}")))?;
    println!("{json}");
    Ok(())
}
