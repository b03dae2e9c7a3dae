use std::fs::{OpenOptions, create_dir_all};
use std::path::{Path, PathBuf};
use std::process::Command;

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::Serialize;

use dbprofile_core::{Base, JsonFileSink, ProfileConfig, ReportSink, YamlFileSink};
use dbprofile_eval::ProfileSummary;

use super::{RegistryError, RegistryResult};

/// Serialization format of the report artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ReportFormat {
    Json,
    Yaml,
}

impl ReportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ReportFormat::Json => "json",
            ReportFormat::Yaml => "yaml",
        }
    }
}

/// Metadata captured at run start.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub engine: String,
    pub report_version: String,
    pub run_dir: PathBuf,
    pub out: Option<PathBuf>,
    pub format: ReportFormat,
    pub config: ProfileConfig,
    /// Connection string with secrets masked.
    pub connection: String,
}

/// JSON config written to each run directory.
#[derive(Debug, Serialize)]
pub struct RunConfig {
    pub run_id: String,
    pub started_at: String,
    pub engine: String,
    pub report_version: String,
    pub format: ReportFormat,
    pub config: ProfileConfig,
    pub connection: String,
    pub git: GitInfo,
}

/// Git metadata for reproducibility.
#[derive(Debug, Serialize)]
pub struct GitInfo {
    pub commit: Option<String>,
    pub dirty: Option<bool>,
}

/// Paths for run artifacts.
#[derive(Debug, Clone)]
pub struct RunPaths {
    pub root: PathBuf,
    pub logs_path: PathBuf,
    pub report_path: PathBuf,
    pub summary_path: PathBuf,
    pub markdown_path: PathBuf,
}

/// Create `<run_dir>/<timestamp>__run_<id>/` with its `config.json` and an empty log file.
pub fn start_run(ctx: &RunContext) -> RegistryResult<RunPaths> {
    let timestamp = ctx.started_at.format("%Y-%m-%dT%H-%M-%SZ").to_string();
    let root = ctx.run_dir.join(format!("{timestamp}__run_{}", ctx.run_id));

    create_dir_all(&root)?;

    let paths = RunPaths {
        logs_path: root.join("logs.ndjson"),
        report_path: root.join(format!("report.{}", ctx.format.extension())),
        summary_path: root.join("summary.json"),
        markdown_path: root.join("report.md"),
        root,
    };

    let config = RunConfig {
        run_id: ctx.run_id.clone(),
        started_at: ctx.started_at.to_rfc3339(),
        engine: ctx.engine.clone(),
        report_version: ctx.report_version.clone(),
        format: ctx.format,
        config: ctx.config.clone(),
        connection: ctx.connection.clone(),
        git: collect_git_info(),
    };
    write_json(&paths.root.join("config.json"), &config)?;

    OpenOptions::new()
        .create(true)
        .append(true)
        .open(&paths.logs_path)?;

    Ok(paths)
}

/// Report sink writing the run's report file, plus an optional extra copy.
#[derive(Debug, Clone)]
pub struct RunReportSink {
    format: ReportFormat,
    targets: Vec<PathBuf>,
}

impl RunReportSink {
    pub fn new(paths: &RunPaths, format: ReportFormat, out: Option<&Path>) -> Self {
        let mut targets = vec![paths.report_path.clone()];
        targets.extend(out.map(Path::to_path_buf));
        Self { format, targets }
    }
}

impl<M: Serialize> ReportSink<M> for RunReportSink {
    fn write(&self, base: &Base<M>) -> dbprofile_core::Result<()> {
        for target in &self.targets {
            match self.format {
                ReportFormat::Json => JsonFileSink::new(target).write(base)?,
                ReportFormat::Yaml => YamlFileSink::new(target).write(base)?,
            }
        }
        Ok(())
    }
}

pub fn write_summary(paths: &RunPaths, summary: &ProfileSummary) -> RegistryResult<()> {
    write_json(&paths.summary_path, summary)
}

pub fn write_markdown(paths: &RunPaths, markdown: &str) -> RegistryResult<()> {
    std::fs::write(&paths.markdown_path, markdown).map_err(RegistryError::from)
}

pub fn collect_git_info() -> GitInfo {
    let commit = git_stdout(&["rev-parse", "HEAD"])
        .map(|stdout| stdout.trim().to_string())
        .filter(|commit| !commit.is_empty());
    let dirty = git_stdout(&["status", "--porcelain"]).map(|stdout| !stdout.trim().is_empty());

    GitInfo { commit, dirty }
}

fn git_stdout(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    output
        .status
        .success()
        .then(|| String::from_utf8_lossy(&output.stdout).into_owned())
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> RegistryResult<()> {
    let file = OpenOptions::new()
        .create(true)
        .truncate(true)
        .write(true)
        .open(path)?;
    serde_json::to_writer_pretty(file, value).map_err(RegistryError::from)
}
