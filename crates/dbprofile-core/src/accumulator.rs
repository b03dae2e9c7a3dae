use crate::error::Result;
use crate::value::Value;

/// Incremental state for summarizing one column.
pub trait ColumnFold {
    type Metric;

    fn push(&mut self, value: Value) -> Result<()>;

    fn finish(self) -> Result<Self::Metric>;
}

/// Turns the value stream of a column into a metric record.
///
/// Implementations may fold values one at a time or buffer them inside their
/// [`ColumnFold`]; [`MetricAccumulator::summarize`] over the same values must
/// give the same metric as pushing them into a fold one by one.
pub trait MetricAccumulator {
    type Metric;
    type Fold: ColumnFold<Metric = Self::Metric>;

    fn start(&self, table: &str, column: &str) -> Self::Fold;

    fn summarize<I>(&self, table: &str, column: &str, values: I) -> Result<Self::Metric>
    where
        I: IntoIterator<Item = Value>,
    {
        let mut fold = self.start(table, column);
        for value in values {
            fold.push(value)?;
        }
        fold.finish()
    }
}
