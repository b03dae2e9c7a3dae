use std::fs;

use anyhow::{Context, Result};
use dbprofile_core::{Base, JsonFileSink, ProfileConfig, Profiler};
use dbprofile_eval::{ColumnMetrics, StatsAccumulator};
use dbprofile_introspect::CsvDirSource;

#[tokio::test]
async fn profiles_a_csv_directory_into_a_json_report() -> Result<()> {
    let data = tempfile::tempdir()?;
    fs::write(
        data.path().join("customers.csv"),
        "id,name,region\n1,Ana,\n2,,north\n3,Caio,NULL\n",
    )?;
    fs::write(data.path().join("empty.csv"), "")?;
    fs::write(data.path().join("orders.csv"), "id,total\n")?;

    let out = tempfile::tempdir()?;
    let report_path = out.path().join("report.json");

    let source = CsvDirSource::new(data.path())
        .with_name("shop")
        .with_null_token("NULL");
    let config = ProfileConfig {
        distinct: true,
        ..ProfileConfig::default()
    };
    let accumulator = StatsAccumulator::new(config.clone());
    let profiler = Profiler::new(&source, &source, &accumulator, config.extract_options());

    let base = profiler.run_to(&JsonFileSink::new(&report_path)).await?;

    let tables: Vec<&str> = base.tables.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(tables, ["customers", "orders"]);

    let region = base
        .metric("customers", "region")
        .context("customers.region")?;
    assert_eq!(region.count, 3);
    assert_eq!(region.null, 1);
    assert_eq!(region.empty, 1);
    assert_eq!(region.distinct, Some(2));

    let total = base.metric("orders", "total").context("orders.total")?;
    assert_eq!(
        total,
        &ColumnMetrics {
            distinct: Some(0),
            ..ColumnMetrics::default()
        }
    );

    let written: Base<ColumnMetrics> = serde_json::from_str(&fs::read_to_string(&report_path)?)?;
    assert_eq!(written, base);
    Ok(())
}
