use std::collections::HashSet;

use dbprofile_core::{ColumnFold, Error, MetricAccumulator, ProfileConfig, Result, Value};

use crate::metrics::ColumnMetrics;

/// Metric accumulator producing [`ColumnMetrics`].
#[derive(Debug, Clone, Default)]
pub struct StatsAccumulator {
    config: ProfileConfig,
}

impl StatsAccumulator {
    pub fn new(config: ProfileConfig) -> Self {
        Self { config }
    }
}

impl MetricAccumulator for StatsAccumulator {
    type Metric = ColumnMetrics;
    type Fold = StatsFold;

    fn start(&self, _table: &str, _column: &str) -> StatsFold {
        StatsFold::new(self.config.sample_size, self.config.distinct)
    }
}

/// Running statistics for a single column.
#[derive(Debug, Clone)]
pub struct StatsFold {
    metrics: ColumnMetrics,
    sample_size: usize,
    seen: Option<HashSet<String>>,
}

impl StatsFold {
    pub fn new(sample_size: usize, distinct: bool) -> Self {
        Self {
            metrics: ColumnMetrics::default(),
            sample_size,
            seen: distinct.then(HashSet::new),
        }
    }

    fn observe_length(&mut self, length: u64) {
        let metrics = &mut self.metrics;
        metrics.min_length = Some(metrics.min_length.map_or(length, |min| min.min(length)));
        metrics.max_length = Some(metrics.max_length.map_or(length, |max| max.max(length)));
    }
}

impl ColumnFold for StatsFold {
    type Metric = ColumnMetrics;

    fn push(&mut self, value: Value) -> Result<()> {
        self.metrics.count = increment(self.metrics.count)?;

        if value.is_null() {
            self.metrics.null = increment(self.metrics.null)?;
            return Ok(());
        }
        if value.is_empty() {
            self.metrics.empty = increment(self.metrics.empty)?;
        }
        if let Some(length) = value.length() {
            self.observe_length(length as u64);
        }
        if let Some(seen) = &mut self.seen {
            seen.insert(value.distinct_key());
        }

        if !value.is_empty() && self.metrics.samples.len() < self.sample_size {
            let rendered = value.to_string();
            if !self.metrics.samples.contains(&rendered) {
                self.metrics.samples.push(rendered);
            }
        }
        Ok(())
    }

    fn finish(self) -> Result<ColumnMetrics> {
        let mut metrics = self.metrics;
        metrics.distinct = self.seen.map(|seen| seen.len() as u64);
        Ok(metrics)
    }
}

fn increment(counter: u64) -> Result<u64> {
    counter
        .checked_add(1)
        .ok_or_else(|| Error::Other("value counter overflow".to_string()))
}
