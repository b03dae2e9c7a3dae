mod registry;
mod settings;

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use clap::{Args, Parser, Subcommand};
use dbprofile_core::{
    Base, ColumnValueSource, Error as CoreError, ProfileConfig, ProfileError, Profiler,
    REPORT_VERSION, SchemaSource,
};
use dbprofile_eval::{
    ColumnMetrics, StatsAccumulator, render_report, report_json_schema, summarize_report,
};
use dbprofile_introspect::{CsvDirSource, PostgresSource};
use registry::{
    ReportFormat, RunContext, RunReportSink, init_run_logging, redact_connection_string,
    start_run, write_markdown, write_summary,
};
use settings::{ConfigOverrides, SettingsError, resolve_config};
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
enum CliError {
    #[error("registry error: {0}")]
    Registry(#[from] registry::RegistryError),
    #[error("settings error: {0}")]
    Settings(#[from] SettingsError),
    #[error("profile failed: {0}")]
    Profile(#[from] ProfileError),
    #[error("core error: {0}")]
    Core(#[from] CoreError),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("json serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("unsupported engine: {0}")]
    UnsupportedEngine(String),
}

#[derive(Parser, Debug)]
#[command(name = "dbprofile", version, about = "Profile every column of a relational schema")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Profile a PostgreSQL schema or a directory of CSV files.
    Profile(ProfileArgs),
    /// Print the JSON Schema of the report.
    Schema,
}

#[derive(Args, Debug)]
struct ProfileArgs {
    /// Connection string or CSV directory (flag form).
    #[arg(long, value_name = "CONNECTION", conflicts_with = "conn_pos")]
    conn: Option<String>,
    /// Connection string or CSV directory (positional form).
    #[arg(value_name = "CONNECTION", required_unless_present = "conn")]
    conn_pos: Option<String>,
    /// PostgreSQL schema to profile.
    #[arg(long, default_value = "public")]
    schema: String,
    /// TOML file with profile settings.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Example values kept per column.
    #[arg(long)]
    sample_size: Option<usize>,
    /// Count distinct values.
    #[arg(long, default_value_t = false)]
    distinct: bool,
    /// Maximum rows read per column (0 = unlimited).
    #[arg(long)]
    limit: Option<u64>,
    /// Row filter passed to the source as-is.
    #[arg(long, value_name = "PREDICATE")]
    filter: Option<String>,
    /// Token read as NULL in CSV files.
    #[arg(long, value_name = "TOKEN")]
    null_token: Option<String>,
    /// Report format.
    #[arg(long, value_enum, default_value_t = ReportFormat::Json)]
    format: ReportFormat,
    /// Output directory for runs.
    #[arg(long, default_value = "runs")]
    run_dir: PathBuf,
    /// Optional extra output path for the report.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Engine {
    Postgres,
    Csv(PathBuf),
}

impl Engine {
    fn name(&self) -> &'static str {
        match self {
            Engine::Postgres => "postgres",
            Engine::Csv(_) => "csv",
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();

    match cli.command {
        Command::Profile(args) => run_profile(args).await,
        Command::Schema => print_schema(),
    }
}

fn print_schema() -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(&report_json_schema())?;
    println!("{json}");
    Ok(())
}

async fn run_profile(args: ProfileArgs) -> Result<(), CliError> {
    let ProfileArgs {
        conn,
        conn_pos,
        schema,
        config,
        sample_size,
        distinct,
        limit,
        filter,
        null_token,
        format,
        run_dir,
        out,
    } = args;

    let conn = match (conn, conn_pos) {
        (Some(value), None) | (None, Some(value)) => value,
        (Some(_), Some(_)) => {
            return Err(CliError::InvalidConfig(
                "use either --conn or positional connection string".to_string(),
            ));
        }
        (None, None) => {
            return Err(CliError::InvalidConfig(
                "connection string is required".to_string(),
            ));
        }
    };

    let engine = detect_engine(&conn)?;
    let config = resolve_config(
        config.as_deref(),
        ConfigOverrides {
            sample_size,
            distinct,
            limit,
            filter,
        },
    )?;

    let run_id = Uuid::new_v4().to_string();
    let run_ctx = RunContext {
        run_id: run_id.clone(),
        started_at: chrono::Utc::now(),
        engine: engine.name().to_string(),
        report_version: REPORT_VERSION.to_string(),
        run_dir,
        out,
        format,
        config: config.clone(),
        connection: redact_connection_string(&conn),
    };

    let run_paths = start_run(&run_ctx)?;
    init_run_logging(&run_paths.logs_path)?;

    tracing::info!(event = "run_started", run_id = %run_id, engine = engine.name());
    let timer = Instant::now();

    let sink = RunReportSink::new(&run_paths, run_ctx.format, run_ctx.out.as_deref());
    let base = match &engine {
        Engine::Postgres => {
            let pool = PgPoolOptions::new()
                .max_connections(2)
                .acquire_timeout(Duration::from_secs(10))
                .connect(&conn)
                .await?;
            let source = PostgresSource::new(pool, schema);
            let database = source.database_name().await?;
            tracing::info!(event = "database_connected", database = %database);
            profile(&source, &config, &sink).await?
        }
        Engine::Csv(dir) => {
            let mut source = CsvDirSource::new(dir);
            if let Some(token) = null_token {
                source = source.with_null_token(token);
            }
            profile(&source, &config, &sink).await?
        }
    };
    tracing::info!(event = "report_written", path = %run_paths.report_path.display());

    let summary = summarize_report(&base);
    write_summary(&run_paths, &summary)?;
    write_markdown(&run_paths, &render_report(&base, &summary))?;
    tracing::info!(event = "summary_written", path = %run_paths.summary_path.display());

    let duration_ms = timer.elapsed().as_millis() as u64;
    tracing::info!(
        event = "run_finished",
        status = "success",
        tables = summary.tables,
        columns = summary.columns,
        duration_ms = duration_ms
    );

    println!("{}", run_paths.root.display());
    Ok(())
}

async fn profile<S>(
    source: &S,
    config: &ProfileConfig,
    sink: &RunReportSink,
) -> Result<Base<ColumnMetrics>, ProfileError>
where
    S: SchemaSource + ColumnValueSource,
{
    let accumulator = StatsAccumulator::new(config.clone());
    Profiler::new(source, source, &accumulator, config.extract_options())
        .run_to(sink)
        .await
}

fn detect_engine(conn: &str) -> Result<Engine, CliError> {
    if conn.starts_with("postgres://") || conn.starts_with("postgresql://") {
        return Ok(Engine::Postgres);
    }
    if let Some(dir) = conn.strip_prefix("csv://") {
        return Ok(Engine::Csv(PathBuf::from(dir)));
    }
    if Path::new(conn).is_dir() {
        return Ok(Engine::Csv(PathBuf::from(conn)));
    }
    Err(CliError::UnsupportedEngine(redact_connection_string(conn)))
}
