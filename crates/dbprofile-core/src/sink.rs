use std::fs::{OpenOptions, create_dir_all};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::report::Base;

/// Persists a finished report. Called once per successful run.
pub trait ReportSink<M> {
    fn write(&self, base: &Base<M>) -> Result<()>;
}

/// Writes the report as pretty-printed JSON.
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    path: PathBuf,
}

impl JsonFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl<M: Serialize> ReportSink<M> for JsonFileSink {
    fn write(&self, base: &Base<M>) -> Result<()> {
        let file = create_file(&self.path)?;
        serde_json::to_writer_pretty(file, base).map_err(|err| Error::Other(err.to_string()))
    }
}

/// Writes the report as YAML.
#[derive(Debug, Clone)]
pub struct YamlFileSink {
    path: PathBuf,
}

impl YamlFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl<M: Serialize> ReportSink<M> for YamlFileSink {
    fn write(&self, base: &Base<M>) -> Result<()> {
        let file = create_file(&self.path)?;
        serde_yaml::to_writer(file, base).map_err(|err| Error::Other(err.to_string()))
    }
}

/// Keeps every report it receives in memory.
#[derive(Debug, Default)]
pub struct MemorySink<M> {
    reports: Mutex<Vec<Base<M>>>,
}

impl<M: Clone> MemorySink<M> {
    pub fn new() -> Self {
        Self {
            reports: Mutex::new(Vec::new()),
        }
    }

    pub fn reports(&self) -> Vec<Base<M>> {
        self.reports
            .lock()
            .map(|reports| reports.clone())
            .unwrap_or_default()
    }

    pub fn write_count(&self) -> usize {
        self.reports.lock().map(|reports| reports.len()).unwrap_or(0)
    }
}

impl<M: Clone> ReportSink<M> for MemorySink<M> {
    fn write(&self, base: &Base<M>) -> Result<()> {
        let mut reports = self
            .reports
            .lock()
            .map_err(|_| Error::Other("memory sink lock poisoned".to_string()))?;
        reports.push(base.clone());
        Ok(())
    }
}

fn create_file(path: &Path) -> Result<std::fs::File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            create_dir_all(parent)?;
        }
    }
    let file = OpenOptions::new()
        .create(true)
        .truncate(true)
        .write(true)
        .open(path)?;
    Ok(file)
}
